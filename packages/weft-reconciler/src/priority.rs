/// Ordered rank deciding which pending work is eligible to run in a given
/// scheduling pass. Smaller is more urgent; `NoWork` is the "nothing pending"
/// sentinel and is never eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityLevel {
    NoWork = 0,
    High = 1,
    Low = 2,
    Offscreen = 3,
}

impl PriorityLevel {
    pub fn is_no_work(self) -> bool {
        self == PriorityLevel::NoWork
    }

    /// Whether work at this level may run in a pass scoped to `threshold`.
    pub fn eligible_at(self, threshold: PriorityLevel) -> bool {
        !self.is_no_work() && self <= threshold
    }
}

/// Fold a child's outstanding priority into its parent's: the result is the
/// most urgent non-`NoWork` level of the two.
pub fn bubble_priority(parent: PriorityLevel, child: PriorityLevel) -> PriorityLevel {
    if child.is_no_work() {
        return parent;
    }
    if parent.is_no_work() || parent > child {
        child
    } else {
        parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_by_urgency() {
        assert!(PriorityLevel::High < PriorityLevel::Low);
        assert!(PriorityLevel::Low < PriorityLevel::Offscreen);
    }

    #[test]
    fn no_work_is_never_eligible() {
        for threshold in [
            PriorityLevel::High,
            PriorityLevel::Low,
            PriorityLevel::Offscreen,
        ] {
            assert!(!PriorityLevel::NoWork.eligible_at(threshold));
        }
    }

    #[test]
    fn eligibility_is_at_or_above_threshold() {
        assert!(PriorityLevel::High.eligible_at(PriorityLevel::Low));
        assert!(PriorityLevel::Low.eligible_at(PriorityLevel::Low));
        assert!(!PriorityLevel::Offscreen.eligible_at(PriorityLevel::Low));
        assert!(PriorityLevel::Offscreen.eligible_at(PriorityLevel::Offscreen));
    }

    #[test]
    fn bubbling_takes_the_most_urgent_non_sentinel_level() {
        use PriorityLevel::*;
        assert_eq!(bubble_priority(NoWork, Low), Low);
        assert_eq!(bubble_priority(Low, NoWork), Low);
        assert_eq!(bubble_priority(Offscreen, High), High);
        assert_eq!(bubble_priority(High, Offscreen), High);
        assert_eq!(bubble_priority(NoWork, NoWork), NoWork);
    }
}
