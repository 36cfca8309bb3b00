use std::ops::Range;

/// Partition `unit_count` ordered units into contiguous groups of
/// `group_size`, last group possibly shorter.
///
/// Grouping is purely positional — a pure function of the two arguments —
/// so a partially-resumed run computes exactly the same boundaries as a
/// from-scratch run. Never content-based, never reordering.
pub fn compute_groups(unit_count: usize, group_size: usize) -> Vec<Range<usize>> {
    assert!(group_size > 0, "group_size must be positive");

    let mut groups = Vec::with_capacity(unit_count.div_ceil(group_size));
    let mut start = 0;
    while start < unit_count {
        let end = (start + group_size).min(unit_count);
        groups.push(start..end);
        start = end;
    }
    groups
}

/// Number of groups `compute_groups` would produce.
pub fn group_count(unit_count: usize, group_size: usize) -> usize {
    assert!(group_size > 0, "group_size must be positive");
    unit_count.div_ceil(group_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiple() {
        let groups = compute_groups(20, 10);
        assert_eq!(groups, vec![0..10, 10..20]);
    }

    #[test]
    fn ragged_last_group() {
        // 23 chapters at 10 per arc: 10, 10, 3.
        let groups = compute_groups(23, 10);
        assert_eq!(groups, vec![0..10, 10..20, 20..23]);
        assert_eq!(groups[2].len(), 3);
    }

    #[test]
    fn fewer_units_than_group_size() {
        assert_eq!(compute_groups(3, 10), vec![0..3]);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(compute_groups(0, 10).is_empty());
        assert_eq!(group_count(0, 10), 0);
    }

    #[test]
    fn deterministic_across_calls() {
        assert_eq!(compute_groups(97, 7), compute_groups(97, 7));
    }

    #[test]
    fn group_count_matches() {
        for (n, k) in [(23, 10), (20, 10), (1, 10), (10, 1), (97, 7)] {
            assert_eq!(group_count(n, k), compute_groups(n, k).len());
        }
    }

    #[test]
    #[should_panic(expected = "group_size must be positive")]
    fn zero_group_size_panics() {
        compute_groups(5, 0);
    }
}
