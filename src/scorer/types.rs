use serde::Serialize;
use std::cmp::Ordering;

/// Scalar quality of a schedule. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fitness {
    pub score: f64,
    pub hard: u32,
    pub soft: f64,
}

impl Fitness {
    pub const WORST: Fitness = Fitness {
        score: f64::MAX,
        hard: u32::MAX,
        soft: f64::MAX,
    };

    /// Orders by score, then fewer hard violations, then lower soft penalty.
    pub fn compare(&self, other: &Fitness) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then(self.hard.cmp(&other.hard))
            .then(self.soft.total_cmp(&other.soft))
    }

    pub fn is_better_than(&self, other: &Fitness) -> bool {
        self.compare(other) == Ordering::Less
    }

    pub fn is_feasible(&self) -> bool {
        self.hard == 0
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardCounts {
    /// Overlapping pairs sharing a teacher.
    pub teacher_clashes: u32,
    /// Overlapping pairs sharing a classroom.
    pub room_clashes: u32,
    pub over_capacity: u32,
    pub teacher_unavailable: u32,
    pub room_kind_mismatch: u32,
}

impl HardCounts {
    pub fn total(&self) -> u32 {
        self.teacher_clashes
            + self.room_clashes
            + self.over_capacity
            + self.teacher_unavailable
            + self.room_kind_mismatch
    }

    /// Human summary of the non-zero counters, e.g. "2 teacher clashes, 1 over capacity".
    pub fn describe(&self) -> String {
        [
            (self.teacher_clashes, "teacher clashes"),
            (self.room_clashes, "room clashes"),
            (self.over_capacity, "over capacity"),
            (self.teacher_unavailable, "teacher unavailable"),
            (self.room_kind_mismatch, "room kind mismatch"),
        ]
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{} {}", n, label))
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Raw (unweighted) soft-penalty terms. Terms whose policy is switched off stay zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftTerms {
    // minimize_conflicts
    pub consecutive_excess: f64,
    pub short_gaps: f64,
    pub teacher_daily_excess: f64,
    pub cohort_daily_excess: f64,
    pub subjects_per_day_excess: f64,
    pub back_to_back_labs: f64,
    pub unassisted_labs: f64,

    // maximize_utilization
    pub utilization_deviation: f64,
    pub capacity_buffer: f64,

    // respect_preferences
    pub afternoon_labs: f64,
    pub edge_periods: f64,
    pub friday_afternoon: f64,

    // balance_workload
    pub workload_imbalance: f64,

    // teacher_continuity
    pub discontinuity: f64,
}

/// Full fitness breakdown for one schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessReport {
    pub fitness: Fitness,
    pub hard: HardCounts,
    pub soft: SoftTerms,
    /// Soft penalty after goal weights are applied.
    pub weighted_soft: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_breaks_ties_on_hard_then_soft() {
        let a = Fitness { score: 10.0, hard: 0, soft: 10.0 };
        let b = Fitness { score: 10.0, hard: 1, soft: 0.0 };
        let c = Fitness { score: 10.0, hard: 0, soft: 9.0 };
        assert!(a.is_better_than(&b));
        assert!(c.is_better_than(&a));
        assert!(Fitness { score: 1.0, hard: 9, soft: 9.0 }.is_better_than(&c));
    }

    #[test]
    fn test_worst_loses_to_everything() {
        let f = Fitness { score: 1e300, hard: 1000, soft: 1e300 };
        assert!(f.is_better_than(&Fitness::WORST));
    }

    #[test]
    fn test_describe_skips_zero_counters() {
        let h = HardCounts {
            teacher_clashes: 2,
            teacher_unavailable: 1,
            ..Default::default()
        };
        assert_eq!(h.total(), 3);
        assert_eq!(h.describe(), "2 teacher clashes, 1 teacher unavailable");
    }
}
