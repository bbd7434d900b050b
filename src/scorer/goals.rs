use super::types::SoftTerms;
use crate::config::Settings;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{debug, warn};

/// Named soft objectives selectable through `optimizationGoals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Goal {
    MinimizeConflicts,
    #[strum(to_string = "maximize_utilization", serialize = "maximize_utilisation")]
    MaximizeUtilization,
    RespectPreferences,
    BalanceWorkload,
    TeacherContinuity,
}

/// Weight per goal. Inactive goals weigh zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GoalWeights {
    pub minimize_conflicts: f64,
    pub maximize_utilization: f64,
    pub respect_preferences: f64,
    pub balance_workload: f64,
    pub teacher_continuity: f64,
}

impl GoalWeights {
    pub fn from_settings(settings: &Settings) -> GoalWeights {
        let mut weights = GoalWeights::default();
        for name in &settings.optimization_goals {
            match Goal::from_str(name.trim()) {
                Ok(goal) => {
                    let w = settings
                        .goal_weights
                        .iter()
                        .find(|(k, _)| Goal::from_str(k.trim()).ok() == Some(goal))
                        .map(|(_, w)| *w)
                        .unwrap_or(1.0);
                    weights.set(goal, w);
                }
                Err(_) => warn!("Ignoring unknown optimization goal '{}'", name),
            }
        }
        debug!("Goal weights: {:?}", weights);
        weights
    }

    /// Every goal at weight 1.0.
    pub fn all() -> GoalWeights {
        let mut weights = GoalWeights::default();
        for goal in Goal::iter() {
            weights.set(goal, 1.0);
        }
        weights
    }

    pub fn get(&self, goal: Goal) -> f64 {
        match goal {
            Goal::MinimizeConflicts => self.minimize_conflicts,
            Goal::MaximizeUtilization => self.maximize_utilization,
            Goal::RespectPreferences => self.respect_preferences,
            Goal::BalanceWorkload => self.balance_workload,
            Goal::TeacherContinuity => self.teacher_continuity,
        }
    }

    pub fn set(&mut self, goal: Goal, weight: f64) {
        match goal {
            Goal::MinimizeConflicts => self.minimize_conflicts = weight,
            Goal::MaximizeUtilization => self.maximize_utilization = weight,
            Goal::RespectPreferences => self.respect_preferences = weight,
            Goal::BalanceWorkload => self.balance_workload = weight,
            Goal::TeacherContinuity => self.teacher_continuity = weight,
        }
    }

    /// Collapses raw soft terms into one weighted penalty.
    pub fn apply(&self, t: &SoftTerms) -> f64 {
        let conflicts = t.consecutive_excess
            + t.short_gaps
            + t.teacher_daily_excess
            + t.cohort_daily_excess
            + t.subjects_per_day_excess
            + t.back_to_back_labs
            + t.unassisted_labs;
        let utilization = t.utilization_deviation + t.capacity_buffer;
        let preferences = t.afternoon_labs + t.edge_periods + t.friday_afternoon;

        self.minimize_conflicts * conflicts
            + self.maximize_utilization * utilization
            + self.respect_preferences * preferences
            + self.balance_workload * t.workload_imbalance
            + self.teacher_continuity * t.discontinuity
    }
}
