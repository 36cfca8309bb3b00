use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named pipeline phase owning one unit namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Chapter,
    Arc,
    Novel,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::Arc => "arc",
            Self::Novel => "novel",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chapter" => Ok(Self::Chapter),
            "arc" => Ok(Self::Arc),
            "novel" => Ok(Self::Novel),
            other => Err(format!("unknown stage: {other}")),
        }
    }
}

/// One level of the recursive reduction hierarchy. Layer 0 is the input
/// units; layer k+1 is produced by grouping and compressing layer k.
///
/// The engine carries only this integer; the "super-" spelling exists
/// purely at the logging boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Layer(pub u32);

impl Layer {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Human-readable layer label: depth 0 => "arc", 1 => "super-arc",
    /// 2 => "super-super-arc", ...
    pub fn label(&self, base: &str) -> String {
        let mut s = String::with_capacity(base.len() + 6 * self.0 as usize);
        for _ in 0..self.0 {
            s.push_str("super-");
        }
        s.push_str(base);
        s
    }
}
