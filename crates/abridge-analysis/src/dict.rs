//! Static, versioned dictionaries and rule tables.
//!
//! Everything in this module is declarative data: no inference, no
//! semantics. Versions are bumped whenever a table changes so artifacts
//! stay reproducible.

use std::collections::HashSet;

use once_cell::sync::Lazy;

// --------------------------------------------------
// Name filtering
// --------------------------------------------------
//
// Two different filters apply during surface name extraction.
//
// EXCLUDED_WORDS are words that are frequently capitalized but unreliable
// as standalone names (articles, titles, directions, institutions). They
// are rejected only when standalone; they do not block multi-word names
// ("Blood" is rejected, "Blood Emperor" is kept).
//
// DISCOURSE_WORDS organize narration flow and never appear inside a valid
// name phrase ("However", "Meanwhile"). A candidate containing one is
// rejected outright.
//
// False negatives are acceptable here. False positives are not.

pub static EXCLUDED_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Articles / determiners
        "The", "A", "An", "This", "That", "These", "Those", "Each", "Every", "Either",
        "Neither", "Some", "Any", "All", "Both", "Few", "Many", "Several", "Most", "As",
        // Pronouns / possessives
        "I", "You", "He", "She", "It", "We", "They", "Me", "Him", "Her", "Us", "Them",
        "My", "Your", "His", "Its", "Our", "Their",
        // Question / relative words
        "Who", "Whom", "Whose", "Which", "What", "When", "Where", "Why", "How", "Whether",
        // Conjunctions
        "And", "Or", "But", "So", "Yet", "For", "Nor", "If", "Then", "Else", "Although",
        "Because", "Unless", "While", "Whereas", "Since", "Until",
        // Prepositions
        "In", "On", "At", "By", "To", "From", "Of", "With", "Without", "Within", "Through",
        "Across", "Along", "Among", "Between", "Beyond", "Over", "Under", "Above", "Below",
        "Upon", "Against", "Around",
        // Temporal / ordering
        "Before", "After", "During", "Meanwhile", "Now", "Later", "Earlier", "Today",
        "Tomorrow", "Yesterday", "First", "Second", "Third", "Next", "Last", "Final",
        // Numerals
        "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
        "Hundred", "Thousand", "Million", "Billion",
        // Meta / structural
        "Chapter", "Chapters", "Part", "Parts", "Section", "Book", "Volume", "Arc",
        "Episode", "Page",
        // Generic titles, not an identity alone
        "Master", "Lord", "Lady", "Sir", "Madam", "Elder", "Senior", "Junior", "Young",
        "Old", "Grand", "Great", "Divine", "Queen", "King", "Prince", "Princess",
        "Emperor", "Empress", "Duke", "Duchess", "Baron", "Baroness", "Count", "Countess",
        "General", "Captain", "Commander", "Soldier", "Miss", "Mister", "Mr", "Mrs", "Ms",
        "Dr", "Professor", "Teacher", "Student", "Disciple", "Venerable",
        // Directions / generic locations
        "North", "South", "East", "West", "Central", "Upper", "Lower", "Inner", "Outer",
        "Mountain", "Mountains", "River", "Rivers", "Valley", "Palace", "Hall", "Sect",
        "Clan", "City", "Town", "Village", "Region", "Realm", "Mansion", "Dynasty",
        "Kingdom", "Empire",
        // Generic adjectives, capitalization noise
        "Good", "Evil", "True", "False", "Real", "Pure", "Dark", "Light", "Black", "White",
        "Strong", "Weak", "High", "Low", "Deep", "Shallow", "Long", "Short", "Wide",
        "Narrow",
        // Narrative fillers
        "Still", "Just", "Only", "Even", "Also", "Already", "Almost", "Nearly", "Rather",
        // Hard rejects, common machine-translation artifacts
        "Being", "Having", "Doing", "Making", "Something", "Someone", "Everything",
        "Nothing", "Time", "Little", "Song", "Secret", "Void", "Space", "Cosmos",
        "Universe", "World", "Life", "Death", "Earth", "Transform", "Human", "Faced",
        "Destiny", "Virtual", "Transforming", "Things", "Tenacity", "Alas", "Annihilation",
        "Believe", "Call", "Cold", "Countless", "Crash", "Creation", "Damn", "Dang",
        "Deputy", "Fifteen", "Fifty", "Forest", "Gate", "Half", "Illusion", "Karma",
        "Kill", "Knowledge", "Magic", "Netherworld", "Ordinary", "Pope", "President",
        "Revelation", "Saint", "Seeing", "Seventh", "Sister", "Sixteen", "Staff", "Steel",
        "Tower", "Venom", "Warcraft", "Witch", "Crusaders", "Goddess", "Grandpa",
        "Paladin", "Seventeen",
    ]
    .into_iter()
    .collect()
});

pub static DISCOURSE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Contrast / concession
        "However", "Nonetheless", "Nevertheless", "Though", "Instead", "Otherwise",
        // Cause / effect
        "Therefore", "Thus", "Hence", "Consequently", "Accordingly",
        // Addition / emphasis
        "Moreover", "Furthermore", "Additionally", "Likewise", "Similarly",
        // Time / progression
        "Afterward", "Afterwards", "Beforehand", "Eventually", "Finally", "Initially",
        "Previously", "Subsequently", "Ultimately",
        // Sudden action markers
        "Suddenly", "Abruptly", "Instantly", "Immediately",
        // Clarification / framing
        "Indeed", "Specifically", "Generally",
        // Narrative flow fillers
        "Hereafter", "Altogether", "Overall", "Looking", "Soon", "Thinking",
        "Such", "Hearing", "Perhaps", "Especially", "Compared", "Anyway", "Inside",
        "Could", "Okay", "Maybe", "Regarding", "Taking", "Wait", "Based", "Obviously",
        "According", "Considering", "Fortunately", "Sadly", "Like", "Come", "Take",
        "Thank", "Gradually", "Please", "Rumble", "Recalling", "Including", "Crack",
        "Unknowingly", "Make", "More", "Using", "There", "Gender", "Judging",
        "Unexpectedly", "Naturally", "Standing", "Think", "Forget", "Relying",
        "Originally", "Completely", "Dantian", "Have", "Once", "Everyone", "Immortality",
        "Academy", "Combined", "Boom", "Various", "Faintly", "Feeling", "Sure",
        "Listening", "Tell", "Unconsciously", "Witnessing", "Want", "Walking",
        "Subconsciously", "Sitting", "Returning", "Report", "Pass", "Other", "Observe",
        "Name", "Listen", "Less", "Internet", "Humph", "Densely", "Choose", "Behind",
        "Authority", "Anyone", "Ahhhhh", "Would", "Prevent", "Refining", "Revealing",
        "Knowing", "Holding", "Find", "About", "Actually", "Ahem", "Another", "Apart",
        "Arriving", "Back", "Besides", "Boring", "Brush", "Caught", "Click", "Coming",
        "Cooperation", "Cough", "Definitely", "Despite", "Differently", "Does", "Early",
        "Ever", "Except", "Excuse", "Familiar", "Follow", "Found", "Friends", "Fuck",
        "Give", "Going", "Guess", "Haha", "Hahahaha", "Hehe", "Hehehe", "Hello", "Here",
        "Hiss", "Hmph", "Hold", "Hurry", "Impossible", "Interesting", "Interrogation",
        "Keep", "Leave", "Leaving", "Look", "Meeting", "Morning", "Nonsense", "Normally",
        "Oops", "Others", "Outside", "People", "Phew", "Probably", "Quick", "Quickly",
        "Realizing", "Really", "Regardless", "Remember", "Rescue", "Return", "Right",
        "Send", "Shall", "Should", "Shouldn", "Sighing", "Somewhere", "Sorry", "Speaking",
        "Squeak", "Stop", "Sunlight", "Thanks", "Turning", "Understood", "Unfortunately",
        "Unlike", "Very", "Visiting", "Welcome", "Well", "Whatever", "Whouldn", "Yeah",
        "Didn", "Different", "Directly", "Doesn", "Ouch",
    ]
    .into_iter()
    .collect()
});

// --------------------------------------------------
// Event keyword dictionary
// --------------------------------------------------

/// Keyword dictionary version, recorded in every artifact for
/// reproducibility.
pub const KEYWORD_DICTIONARY_VERSION: &str = "1.0.1";

/// One keyword group: a stable id, the terms (and aliases) that count
/// toward it, and a category for grouping. Matching is case-insensitive
/// and word-boundary aware; multi-word phrases are supported.
#[derive(Clone, Copy, Debug)]
pub struct KeywordSpec {
    pub id: &'static str,
    pub terms: &'static [&'static str],
    pub category: &'static str,
}

pub static KEYWORD_DICTIONARY: &[KeywordSpec] = &[
    // Cultivation realms
    KeywordSpec {
        id: "mortal_realm",
        terms: &["mortal realm", "mortal body", "mortal stage"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "qi_condensation",
        terms: &["qi condensation", "condensing qi", "qi gathering"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "foundation_establishment",
        terms: &["foundation establishment", "foundation building"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "core_formation",
        terms: &["core formation", "golden core"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "nascent_soul",
        terms: &["nascent soul", "nascent soul realm"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "soul_transformation",
        terms: &["soul transformation", "spirit transformation"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "void_refinement",
        terms: &["void refinement", "void stage"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "dao_seeking",
        terms: &["dao seeking", "seeking the dao"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "immortal_ascension",
        terms: &["immortal ascension", "ascended to immortality"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "true_immortal",
        terms: &["true immortal", "immortal realm"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "body_refinement",
        terms: &["body tempering", "tempering stage", "fleshly body", "body refinement"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "tribulation_transcendence",
        terms: &[
            "tribulation transcendence",
            "crossing tribulation",
            "lightning tribulation",
        ],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "earth_immortal",
        terms: &["earth immortal", "land immortal"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "heavenly_immortal",
        terms: &["heavenly immortal", "celestial immortal"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "golden_immortal",
        terms: &["golden immortal", "da luo golden immortal", "immortal lord"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "immortal_king",
        terms: &["immortal king", "immortal monarch", "immortal venerable"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "immortal_emperor",
        terms: &["immortal emperor", "sovereign", "supreme immortal"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "god_realm",
        terms: &["godhood", "divine realm", "true god", "god king"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "dao_ancestor",
        terms: &["dao ancestor", "progenitor", "source realm"],
        category: "cultivation_realm",
    },
    KeywordSpec {
        id: "transcendence",
        terms: &["transcendence", "eternal realm", "beyond the dao", "unfettered"],
        category: "cultivation_realm",
    },
    // Sects, inheritance and cultivation society
    KeywordSpec {
        id: "sect",
        terms: &["cultivation sect", "inner sect", "outer sect"],
        category: "cultivation_society",
    },
    KeywordSpec {
        id: "elder",
        terms: &["sect elder", "great elder"],
        category: "cultivation_society",
    },
    KeywordSpec {
        id: "sect_disciples",
        terms: &[
            "outer disciple",
            "inner disciple",
            "core disciple",
            "legacy disciple",
            "true disciple",
            "closed-door disciple",
        ],
        category: "cultivation_society",
    },
    KeywordSpec {
        id: "sect_leadership",
        terms: &["sect master", "sect leader", "patriarch", "palace master", "valley master"],
        category: "cultivation_society",
    },
    KeywordSpec {
        id: "hidden_powerhouses",
        terms: &[
            "grand elder",
            "supreme elder",
            "founding ancestor",
            "venerable",
            "supreme being",
        ],
        category: "cultivation_society",
    },
    KeywordSpec {
        id: "alchemy_guild",
        terms: &[
            "alchemist guild",
            "pill pavilion",
            "medicine hall",
            "alchemist",
            "grandmaster alchemist",
        ],
        category: "cultivation_society",
    },
    KeywordSpec {
        id: "specialized_professions",
        terms: &["array master", "talisman master", "artifact refiner"],
        category: "cultivation_society",
    },
    KeywordSpec {
        id: "inheritance_sites",
        terms: &["ancient ruin", "secret realm", "inheritance ground", "immortal cave"],
        category: "cultivation_society",
    },
    KeywordSpec {
        id: "legacy_items",
        terms: &["jade slip", "merit manual", "cultivation technique", "divine art"],
        category: "cultivation_society",
    },
    KeywordSpec {
        id: "sect_events",
        terms: &[
            "sect competition",
            "grand assembly",
            "disciple recruitment",
            "inner sect trial",
            "heavenly ranking",
        ],
        category: "cultivation_society",
    },
    KeywordSpec {
        id: "factions",
        terms: &[
            "righteous path",
            "demonic path",
            "heretic sect",
            "neutral faction",
            "rogue cultivator",
        ],
        category: "cultivation_society",
    },
    // Gender and social indicators
    KeywordSpec {
        id: "male_honorifics",
        terms: &[
            "young master",
            "senior brother",
            "junior brother",
            "sect brother",
            "patriarch",
            "fellow daoist",
            "mister",
        ],
        category: "gender_indicator_male",
    },
    KeywordSpec {
        id: "female_honorifics",
        terms: &[
            "fairy",
            "jade beauty",
            "senior sister",
            "junior sister",
            "sect sister",
            "matriarch",
            "lady",
            "madam",
        ],
        category: "gender_indicator_female",
    },
    KeywordSpec {
        id: "loli_signals",
        terms: &["little girl", "petite", "child-like", "younger sister", "small stature"],
        category: "age_indicator_young",
    },
    // Origin and meta
    KeywordSpec {
        id: "modern_world_signals",
        terms: &[
            "earth",
            "modern",
            "internet",
            "smartphone",
            "computer",
            "truck",
            "office worker",
            "high school student",
            "21st century",
            "science",
            "technology",
        ],
        category: "origin_modern",
    },
    KeywordSpec {
        id: "transmigration_events",
        terms: &[
            "transmigrated",
            "isekai",
            "original owner",
            "possessing the body",
            "this body",
            "another world",
            "summoned",
        ],
        category: "origin_event",
    },
    KeywordSpec {
        id: "reincarnation_events",
        terms: &[
            "reincarnated",
            "reborn",
            "previous life",
            "past life",
            "baby",
            "infant",
            "born again",
        ],
        category: "origin_event",
    },
    KeywordSpec {
        id: "regression_events",
        terms: &[
            "regressed",
            "returned to the past",
            "second chance",
            "start over",
            "reversing time",
            "back in time",
        ],
        category: "origin_event",
    },
    // Power systems
    KeywordSpec {
        id: "wuxia_specific",
        terms: &[
            "jianghu",
            "martial forest",
            "lightfoot",
            "internal force",
            "meridians",
            "pressure points",
            "qinggong",
        ],
        category: "power_system_wuxia",
    },
    KeywordSpec {
        id: "xuanhuan_western_magic",
        terms: &[
            "mana",
            "magic circle",
            "spell",
            "wizard",
            "mage",
            "knight",
            "dragon",
            "griffon",
            "chanting",
        ],
        category: "power_system_western",
    },
    KeywordSpec {
        id: "game_system_signals",
        terms: &[
            "status window",
            "level up",
            "experience points",
            "skill points",
            "quest",
            "inventory",
            "strength stat",
        ],
        category: "power_system_game",
    },
    // Species and transformation
    KeywordSpec {
        id: "beast_transformation",
        terms: &[
            "beast form",
            "scales",
            "claws",
            "wings",
            "bloodline awakening",
            "fur",
            "tail",
        ],
        category: "morphology_change",
    },
    KeywordSpec {
        id: "multiple_bodies",
        terms: &["clone", "avatar", "external body", "doppelganger", "split soul", "projection"],
        category: "body_state",
    },
    // Social and romance
    KeywordSpec {
        id: "romance_events",
        terms: &[
            "confession",
            "first kiss",
            "affection",
            "blushing",
            "beloved",
            "engagement",
            "proposal",
        ],
        category: "social_romance",
    },
    KeywordSpec {
        id: "marriage_events",
        terms: &[
            "wedding",
            "marriage",
            "bride",
            "groom",
            "vows",
            "concubine",
            "consort",
            "wife",
            "husband",
        ],
        category: "social_marriage",
    },
    KeywordSpec {
        id: "family_events",
        terms: &["pregnant", "pregnancy", "childbirth", "baby", "son", "daughter", "heir"],
        category: "social_family",
    },
    KeywordSpec {
        id: "harem_rivalry",
        terms: &["jealousy", "inner palace", "rivalry", "favor", "monopolize"],
        category: "social_harem",
    },
    // Adult content and action
    KeywordSpec {
        id: "adult_content",
        terms: &[
            "dual cultivation",
            "bedroom",
            "naked",
            "intimacy",
            "moan",
            "passion",
            "arousal",
        ],
        category: "adult_signal",
    },
    KeywordSpec {
        id: "action_violence",
        terms: &[
            "blood",
            "slaughter",
            "chaos",
            "explosion",
            "battle",
            "war",
            "killing",
            "deadly",
            "mutilation",
        ],
        category: "action_signal",
    },
    // World settings
    KeywordSpec {
        id: "ancient_china_setting",
        terms: &[
            "forbidden city",
            "imperial palace",
            "dynasty",
            "official",
            "eunuch",
            "emperor",
            "courtyard",
            "tea house",
        ],
        category: "setting_ancient_china",
    },
    KeywordSpec {
        id: "interdimensional",
        terms: &[
            "parallel world",
            "alternate dimension",
            "rift",
            "portal",
            "multiverse",
        ],
        category: "setting_travel",
    },
];

// --------------------------------------------------
// Rule model (shared by genre and tag resolution)
// --------------------------------------------------

/// One evidence condition a rule can check. Conditions read only the
/// upstream surface artifacts; they never look at the text itself.
#[derive(Clone, Copy, Debug)]
pub enum Condition {
    /// Any of the listed keyword ids is present in the keyword map.
    KeywordPresent(&'static [&'static str]),
    /// Any of the listed categories has at least one keyword present.
    CategoryPresent(&'static [&'static str]),
    /// A keyword's narrative spread meets a minimum chapter count.
    KeywordSpread {
        keyword: &'static str,
        min_spread: usize,
    },
    /// A keyword's mention density meets a minimum.
    KeywordDensity {
        keyword: &'static str,
        min_density: f64,
    },
    /// A category has at least this many distinct keywords present.
    CategoryCount {
        category: &'static str,
        min_keywords: usize,
    },
    /// At least `min_count` characters meet the salience floor.
    SalientCharacterCount { min_count: usize, min_salience: f64 },
    /// Any character pair meets the persistence floor.
    SalientPairPersistence { min_persistence: f64 },
    /// At least `min_count` pairs meet the persistence floor.
    HighPersistencePairCount {
        min_count: usize,
        min_persistence: f64,
    },
    /// A genre was resolved above the confidence threshold.
    GenrePresent(&'static str),
    /// A genre was resolved with at least this confidence.
    GenreConfidence {
        genre: &'static str,
        min_confidence: f64,
    },
}

/// A deterministic confidence rule.
///
/// Required conditions are a hard gate: if any is unmet the confidence is
/// 0. Otherwise the score is `base_score` plus the boosts whose condition
/// holds, minus the penalties whose condition holds, clamped to [0, 1].
#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub base_score: f64,
    pub required: &'static [Condition],
    pub boosts: &'static [(Condition, f64)],
    pub penalties: &'static [(Condition, f64)],
}

/// `(id, display_name)` taxonomy entries. The taxonomies are curated
/// subsets of the NovelUpdates genre and tag lists; only entries with an
/// implementable rule from pipeline evidence are carried.
pub type TaxonomyEntry = (&'static str, &'static str);

// --------------------------------------------------
// Genre taxonomy and rules
// --------------------------------------------------

pub const GENRE_TAXONOMY_VERSION: &str = "1.0.1";
pub const GENRE_RULE_VERSION: &str = "1.0.1";

pub static GENRE_TAXONOMY: &[TaxonomyEntry] = &[
    ("action", "Action"),
    ("adult", "Adult"),
    ("adventure", "Adventure"),
    ("fantasy", "Fantasy"),
    ("harem", "Harem"),
    ("martial_arts", "Martial Arts"),
    ("romance", "Romance"),
    ("wuxia", "Wuxia"),
    ("xianxia", "Xianxia"),
    ("xuanhuan", "Xuanhuan"),
    ("yaoi", "Yaoi"),
    ("yuri", "Yuri"),
];

pub static GENRE_RULES: &[(&str, Rule)] = &[
    (
        "action",
        Rule {
            base_score: 0.3,
            required: &[Condition::CategoryPresent(&["action_signal"])],
            boosts: &[
                (
                    Condition::KeywordDensity {
                        keyword: "action_violence",
                        min_density: 0.5,
                    },
                    0.2,
                ),
                (
                    Condition::KeywordSpread {
                        keyword: "action_violence",
                        min_spread: 10,
                    },
                    0.1,
                ),
            ],
            penalties: &[],
        },
    ),
    (
        "adult",
        Rule {
            base_score: 0.3,
            required: &[Condition::CategoryPresent(&["adult_signal"])],
            boosts: &[(
                Condition::KeywordDensity {
                    keyword: "adult_content",
                    min_density: 0.3,
                },
                0.2,
            )],
            penalties: &[],
        },
    ),
    (
        "adventure",
        Rule {
            base_score: 0.3,
            required: &[Condition::KeywordPresent(&[
                "inheritance_sites",
                "interdimensional",
            ])],
            boosts: &[(
                Condition::KeywordSpread {
                    keyword: "inheritance_sites",
                    min_spread: 5,
                },
                0.2,
            )],
            penalties: &[],
        },
    ),
    (
        "fantasy",
        Rule {
            base_score: 0.3,
            required: &[Condition::CategoryPresent(&[
                "cultivation_realm",
                "power_system_western",
            ])],
            boosts: &[(
                Condition::CategoryCount {
                    category: "cultivation_realm",
                    min_keywords: 3,
                },
                0.2,
            )],
            penalties: &[],
        },
    ),
    (
        "harem",
        Rule {
            base_score: 0.3,
            required: &[Condition::CategoryPresent(&["social_harem"])],
            boosts: &[
                (
                    Condition::HighPersistencePairCount {
                        min_count: 3,
                        min_persistence: 0.5,
                    },
                    0.2,
                ),
                (Condition::CategoryPresent(&["social_romance"]), 0.1),
            ],
            penalties: &[],
        },
    ),
    (
        "martial_arts",
        Rule {
            base_score: 0.3,
            required: &[Condition::CategoryPresent(&[
                "power_system_wuxia",
                "cultivation_realm",
            ])],
            boosts: &[(
                Condition::KeywordSpread {
                    keyword: "wuxia_specific",
                    min_spread: 5,
                },
                0.1,
            )],
            penalties: &[],
        },
    ),
    (
        "romance",
        Rule {
            base_score: 0.3,
            required: &[Condition::CategoryPresent(&["social_romance"])],
            boosts: &[
                (Condition::CategoryPresent(&["social_marriage"]), 0.2),
                (
                    Condition::SalientPairPersistence {
                        min_persistence: 0.6,
                    },
                    0.2,
                ),
            ],
            penalties: &[],
        },
    ),
    (
        // Wuxia is mortal martial arts. Immortality cultivation or western
        // magic in the same text points at xianxia/xuanhuan instead.
        "wuxia",
        Rule {
            base_score: 0.3,
            required: &[Condition::CategoryPresent(&["power_system_wuxia"])],
            boosts: &[(
                Condition::KeywordDensity {
                    keyword: "wuxia_specific",
                    min_density: 0.3,
                },
                0.2,
            )],
            penalties: &[
                (Condition::CategoryPresent(&["cultivation_realm"]), 0.2),
                (Condition::CategoryPresent(&["power_system_western"]), 0.1),
            ],
        },
    ),
    (
        "xianxia",
        Rule {
            base_score: 0.3,
            required: &[Condition::CategoryPresent(&["cultivation_realm"])],
            boosts: &[
                (Condition::CategoryPresent(&["cultivation_society"]), 0.2),
                (
                    Condition::KeywordPresent(&["dao_seeking", "immortal_ascension"]),
                    0.1,
                ),
            ],
            penalties: &[(Condition::CategoryPresent(&["power_system_western"]), 0.2)],
        },
    ),
    (
        // Cultivation plus western fantasy elements.
        "xuanhuan",
        Rule {
            base_score: 0.3,
            required: &[
                Condition::CategoryPresent(&["cultivation_realm"]),
                Condition::CategoryPresent(&["power_system_western"]),
            ],
            boosts: &[(Condition::CategoryPresent(&["power_system_game"]), 0.1)],
            penalties: &[],
        },
    ),
    (
        "yaoi",
        Rule {
            base_score: 0.2,
            required: &[
                Condition::CategoryPresent(&["social_romance"]),
                Condition::CategoryPresent(&["gender_indicator_male"]),
            ],
            boosts: &[],
            penalties: &[(Condition::CategoryPresent(&["gender_indicator_female"]), 0.2)],
        },
    ),
    (
        "yuri",
        Rule {
            base_score: 0.2,
            required: &[
                Condition::CategoryPresent(&["social_romance"]),
                Condition::CategoryPresent(&["gender_indicator_female"]),
            ],
            boosts: &[],
            penalties: &[(Condition::CategoryPresent(&["gender_indicator_male"]), 0.2)],
        },
    ),
];

// --------------------------------------------------
// Tag taxonomy and rules
// --------------------------------------------------

pub const TAG_TAXONOMY_VERSION: &str = "1.0.0";
pub const TAG_RULE_VERSION: &str = "1.0.1";

pub static TAG_TAXONOMY: &[TaxonomyEntry] = &[
    ("ancient_china", "Ancient China"),
    ("child_protagonist", "Child Protagonist"),
    ("cultivation", "Cultivation"),
    ("engagement", "Engagement"),
    ("imperial_harem", "Imperial Harem"),
    ("marriage", "Marriage"),
    ("multiple_bodies", "Protagonist with Multiple Bodies"),
    ("overpowered_protagonist", "Overpowered Protagonist"),
    ("pregnancy", "Pregnancy"),
    ("reincarnation", "Reincarnation"),
    ("transformation_ability", "Transformation Ability"),
    ("transmigration", "Transmigration"),
];

pub static TAG_RULES: &[(&str, Rule)] = &[
    (
        "ancient_china",
        Rule {
            base_score: 0.3,
            required: &[Condition::KeywordPresent(&["ancient_china_setting"])],
            boosts: &[
                (
                    Condition::KeywordSpread {
                        keyword: "ancient_china_setting",
                        min_spread: 5,
                    },
                    0.2,
                ),
                (Condition::GenrePresent("wuxia"), 0.1),
            ],
            penalties: &[],
        },
    ),
    (
        "child_protagonist",
        Rule {
            base_score: 0.2,
            required: &[Condition::KeywordPresent(&["loli_signals"])],
            boosts: &[(
                Condition::KeywordSpread {
                    keyword: "loli_signals",
                    min_spread: 5,
                },
                0.2,
            )],
            penalties: &[],
        },
    ),
    (
        "cultivation",
        Rule {
            base_score: 0.3,
            required: &[Condition::CategoryPresent(&["cultivation_realm"])],
            boosts: &[
                (
                    Condition::CategoryCount {
                        category: "cultivation_realm",
                        min_keywords: 5,
                    },
                    0.3,
                ),
                (Condition::GenrePresent("xianxia"), 0.1),
            ],
            penalties: &[],
        },
    ),
    (
        "engagement",
        Rule {
            base_score: 0.2,
            required: &[Condition::KeywordPresent(&["romance_events"])],
            boosts: &[(Condition::KeywordPresent(&["marriage_events"]), 0.1)],
            penalties: &[],
        },
    ),
    (
        "imperial_harem",
        Rule {
            base_score: 0.3,
            required: &[
                Condition::KeywordPresent(&["harem_rivalry"]),
                Condition::KeywordPresent(&["ancient_china_setting"]),
            ],
            boosts: &[(
                Condition::GenreConfidence {
                    genre: "harem",
                    min_confidence: 0.5,
                },
                0.2,
            )],
            penalties: &[],
        },
    ),
    (
        // Marriage and harem storylines are mutually exclusive in practice;
        // a confident harem resolution counts against a marriage tag.
        "marriage",
        Rule {
            base_score: 0.3,
            required: &[Condition::KeywordPresent(&["marriage_events"])],
            boosts: &[(
                Condition::KeywordDensity {
                    keyword: "marriage_events",
                    min_density: 0.2,
                },
                0.2,
            )],
            penalties: &[(
                Condition::GenreConfidence {
                    genre: "harem",
                    min_confidence: 0.5,
                },
                0.2,
            )],
        },
    ),
    (
        "multiple_bodies",
        Rule {
            base_score: 0.3,
            required: &[Condition::KeywordPresent(&["multiple_bodies"])],
            boosts: &[(
                Condition::KeywordSpread {
                    keyword: "multiple_bodies",
                    min_spread: 3,
                },
                0.2,
            )],
            penalties: &[],
        },
    ),
    (
        // A single name dominating the salience index plus a deep realm
        // ladder is the closest lexical proxy for an overpowered lead.
        "overpowered_protagonist",
        Rule {
            base_score: 0.2,
            required: &[Condition::SalientCharacterCount {
                min_count: 1,
                min_salience: 0.9,
            }],
            boosts: &[
                (
                    Condition::CategoryCount {
                        category: "cultivation_realm",
                        min_keywords: 8,
                    },
                    0.2,
                ),
                (Condition::CategoryPresent(&["cultivation_realm"]), 0.1),
            ],
            penalties: &[],
        },
    ),
    (
        "pregnancy",
        Rule {
            base_score: 0.3,
            required: &[Condition::KeywordPresent(&["family_events"])],
            boosts: &[(
                Condition::KeywordDensity {
                    keyword: "family_events",
                    min_density: 0.3,
                },
                0.2,
            )],
            penalties: &[],
        },
    ),
    (
        "reincarnation",
        Rule {
            base_score: 0.3,
            required: &[Condition::KeywordPresent(&["reincarnation_events"])],
            boosts: &[(
                Condition::KeywordSpread {
                    keyword: "reincarnation_events",
                    min_spread: 3,
                },
                0.2,
            )],
            penalties: &[],
        },
    ),
    (
        "transformation_ability",
        Rule {
            base_score: 0.3,
            required: &[Condition::KeywordPresent(&["beast_transformation"])],
            boosts: &[(
                Condition::KeywordDensity {
                    keyword: "beast_transformation",
                    min_density: 0.2,
                },
                0.2,
            )],
            penalties: &[],
        },
    ),
    (
        "transmigration",
        Rule {
            base_score: 0.3,
            required: &[Condition::KeywordPresent(&["transmigration_events"])],
            boosts: &[(Condition::KeywordPresent(&["modern_world_signals"]), 0.2)],
            penalties: &[],
        },
    ),
];

/// Display name for a taxonomy id; falls back to the id itself.
pub fn display_name(taxonomy: &[TaxonomyEntry], id: &str) -> String {
    taxonomy
        .iter()
        .find(|(tid, _)| *tid == id)
        .map(|(_, name)| (*name).to_owned())
        .unwrap_or_else(|| id.to_owned())
}
