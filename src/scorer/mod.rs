pub mod goals;
pub mod hard;
pub mod soft;
pub mod types;

pub use self::goals::{Goal, GoalWeights};
pub use self::types::{Fitness, FitnessReport, HardCounts, SoftTerms};
use crate::problem::Problem;
use crate::schedule::Assignment;

/// Weight of one hard violation.
pub const W_HARD: f64 = 1000.0;
/// Weight of one unit of (goal-weighted) soft penalty.
pub const W_SOFT: f64 = 1.0;

/// Scores schedules for one problem. Cheap to share across worker threads.
pub struct Scorer<'a> {
    pub problem: &'a Problem,
    pub weights: GoalWeights,
}

impl<'a> Scorer<'a> {
    pub fn new(problem: &'a Problem, weights: GoalWeights) -> Self {
        Self { problem, weights }
    }

    /// Fast path used by the search loop.
    pub fn evaluate(&self, genes: &[Assignment]) -> Fitness {
        self.report(genes).fitness
    }

    /// Full breakdown, used for the final result and the `validate` command.
    pub fn report(&self, genes: &[Assignment]) -> FitnessReport {
        let hard = hard::count_hard(self.problem, genes);
        let soft = soft::soft_terms(self.problem, genes);
        let weighted_soft = self.weights.apply(&soft);
        let hard_total = hard.total();

        FitnessReport {
            fitness: Fitness {
                score: W_HARD * hard_total as f64 + W_SOFT * weighted_soft,
                hard: hard_total,
                soft: weighted_soft,
            },
            hard,
            soft,
            weighted_soft,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemConfig;
    use crate::models::{Classroom, Course, RoomKind, SessionKind, Teacher};

    #[test]
    fn test_one_hard_violation_outweighs_soft_noise() {
        let p = Problem::build(
            &[Teacher::new("T1", "CS")],
            &[Classroom::new("R1", 40, RoomKind::Lecture)],
            &[Course::new("C1", "CS", 30).with_sessions(SessionKind::Theory, 2, 1)],
            &SystemConfig::default(),
        )
        .unwrap();
        let scorer = Scorer::new(&p, GoalWeights::all());

        let clash = [
            Assignment { session: 0, day: 0, start: 0, span: 1, room: 0, teacher: 0 },
            Assignment { session: 1, day: 0, start: 0, span: 1, room: 0, teacher: 0 },
        ];
        let spread = [
            Assignment { session: 0, day: 0, start: 1, span: 1, room: 0, teacher: 0 },
            Assignment { session: 1, day: 2, start: 1, span: 1, room: 0, teacher: 0 },
        ];

        let bad = scorer.report(&clash);
        assert_eq!(bad.hard.teacher_clashes, 1);
        assert_eq!(bad.hard.room_clashes, 1);
        assert_eq!(bad.fitness.hard, 2);
        assert!(bad.fitness.score >= 2.0 * W_HARD);

        let good = scorer.evaluate(&spread);
        assert_eq!(good.hard, 0);
        assert!(good.is_better_than(&bad.fitness));
        assert_eq!(good.score, good.soft);
    }
}
