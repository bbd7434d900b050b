use crate::error::{SfResult, SlotForgeError};
use crate::models::{ClockTime, Weekday};
use clap::parser::ValueSource;
use clap::{ArgMatches, Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    Genetic,
}

/// How crossover partitions the session instances between parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverStrategy {
    /// Each course's sessions come wholesale from one parent.
    #[default]
    ByCourse,
    /// One random day's placements come from the second parent.
    ByDay,
}

/// Engine settings. Read from CLI flags or from the `settings` block of a dataset.
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[arg(long, value_enum, default_value_t = Algorithm::Genetic)]
    pub algorithm: Algorithm,
    #[arg(long, default_value_t = 50)]
    pub population_size: usize,
    #[arg(long, default_value_t = 100)]
    pub max_generations: usize,
    #[arg(long, default_value_t = 0.8)]
    pub crossover_rate: f64,
    #[arg(long, default_value_t = 0.15)]
    pub mutation_rate: f64,
    #[arg(long, value_delimiter = ',', default_values_t = default_goals())]
    pub optimization_goals: Vec<String>,
    #[arg(long, default_value_t = 3)]
    pub tournament_size: usize,
    #[arg(long, default_value_t = 2)]
    pub elite_count: usize,
    /// Stop after this many generations without improvement.
    #[arg(long)]
    pub stagnation_window: Option<usize>,
    /// A zero-conflict schedule at or below this soft penalty ends the run early.
    #[arg(long, default_value_t = 0.0)]
    pub acceptable_soft_penalty: f64,
    #[arg(long, value_enum, default_value_t = CrossoverStrategy::ByCourse)]
    pub crossover_strategy: CrossoverStrategy,
    #[arg(short = 'S', long)]
    pub seed: Option<u64>,
    /// Fitness worker threads. Defaults to all cores.
    #[arg(long)]
    pub threads: Option<usize>,
    #[arg(short = 'T', long)]
    pub max_time_secs: Option<u64>,
    /// Per-goal weight overrides. Goals not listed here weigh 1.0 when active.
    #[arg(skip)]
    pub goal_weights: BTreeMap<String, f64>,
}

fn default_goals() -> Vec<String> {
    vec!["minimize_conflicts".to_string()]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Genetic,
            population_size: 50,
            max_generations: 100,
            crossover_rate: 0.8,
            mutation_rate: 0.15,
            optimization_goals: default_goals(),
            tournament_size: 3,
            elite_count: 2,
            stagnation_window: None,
            acceptable_soft_penalty: 0.0,
            crossover_strategy: CrossoverStrategy::ByCourse,
            seed: None,
            threads: None,
            max_time_secs: None,
            goal_weights: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> SfResult<()> {
        if self.population_size == 0 {
            return Err(SlotForgeError::Configuration(
                "populationSize must be at least 1".to_string(),
            ));
        }
        for (name, rate) in [
            ("crossoverRate", self.crossover_rate),
            ("mutationRate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(SlotForgeError::Configuration(format!(
                    "{} must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }
        if self.tournament_size == 0 {
            return Err(SlotForgeError::Configuration(
                "tournamentSize must be at least 1".to_string(),
            ));
        }
        if self.threads == Some(0) {
            return Err(SlotForgeError::Configuration(
                "threads must be at least 1".to_string(),
            ));
        }
        if let Some((goal, w)) = self.goal_weights.iter().find(|(_, w)| **w < 0.0) {
            return Err(SlotForgeError::Configuration(format!(
                "goal weight for '{}' is negative ({})",
                goal, w
            )));
        }
        Ok(())
    }

    /// Overlays only the flags the user actually typed onto settings loaded from a file.
    pub fn merge_from_cli(&mut self, cli: &Settings, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(algorithm);
        update_if_present!(population_size);
        update_if_present!(max_generations);
        update_if_present!(crossover_rate);
        update_if_present!(mutation_rate);
        update_if_present!(optimization_goals);
        update_if_present!(tournament_size);
        update_if_present!(elite_count);
        update_if_present!(stagnation_window);
        update_if_present!(acceptable_soft_penalty);
        update_if_present!(crossover_strategy);
        update_if_present!(seed);
        update_if_present!(threads);
        update_if_present!(max_time_secs);
    }

    pub fn max_time(&self) -> Option<Duration> {
        self.max_time_secs.map(Duration::from_secs)
    }

    /// Number of individuals carried unchanged into the next generation.
    /// A single-individual population carries nothing so mutation still acts on it.
    pub fn effective_elite_count(&self) -> usize {
        self.elite_count
            .min(self.population_size.saturating_sub(1))
    }
}

// --- Policy layer ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkingHours {
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub lunch_break_start: ClockTime,
    pub lunch_break_end: ClockTime,
    /// Minutes per teaching period.
    pub period_duration: u16,
    /// Minutes between consecutive periods.
    pub break_duration: u16,
    pub lab_period_duration: u16,
    pub working_days: Vec<Weekday>,
    pub max_periods_per_day: usize,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start_time: ClockTime::hm(9, 0),
            end_time: ClockTime::hm(17, 0),
            lunch_break_start: ClockTime::hm(12, 30),
            lunch_break_end: ClockTime::hm(13, 30),
            period_duration: 50,
            break_duration: 10,
            lab_period_duration: 120,
            working_days: vec![
                Weekday::Monday,
                Weekday::Tuesday,
                Weekday::Wednesday,
                Weekday::Thursday,
                Weekday::Friday,
            ],
            max_periods_per_day: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralPolicies {
    pub max_consecutive_hours: u16,
    pub max_daily_hours: u16,
    /// Minutes.
    pub min_break_between_sessions: u16,
    pub max_teaching_hours_per_day: u16,
    /// Percent of seats a session should fill.
    pub preferred_classroom_utilization: u16,
    pub allow_back_to_back_labs: bool,
    pub max_students_per_class: u32,
    /// Spare seats a room should have beyond enrolment.
    pub min_room_capacity_buffer: u32,
    pub avoid_first_last_period: bool,
    pub require_lab_assistant: bool,
}

impl Default for GeneralPolicies {
    fn default() -> Self {
        Self {
            max_consecutive_hours: 3,
            max_daily_hours: 8,
            min_break_between_sessions: 15,
            max_teaching_hours_per_day: 6,
            preferred_classroom_utilization: 80,
            allow_back_to_back_labs: false,
            max_students_per_class: 60,
            min_room_capacity_buffer: 10,
            avoid_first_last_period: false,
            require_lab_assistant: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintRules {
    pub max_subjects_per_day: usize,
    pub prefer_morning_labs: bool,
    pub avoid_friday_afternoon: bool,
    pub balance_workload: bool,
    pub maintain_teacher_continuity: bool,
}

impl Default for ConstraintRules {
    fn default() -> Self {
        Self {
            max_subjects_per_day: 6,
            prefer_morning_labs: true,
            avoid_friday_afternoon: true,
            balance_workload: true,
            maintain_teacher_continuity: true,
        }
    }
}

/// Everything the policy layer hands the engine, besides the entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemConfig {
    pub working_hours: WorkingHours,
    pub general_policies: GeneralPolicies,
    pub constraint_rules: ConstraintRules,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_unknown_policy_keys_are_ignored() {
        let json = r#"{
            "workingHours": { "startTime": "08:00", "earlyMorningStart": "07:00" },
            "generalPolicies": { "maxConsecutiveHours": 2, "allowSplitSessions": true },
            "constraintRules": { "groupSimilarSubjects": true },
            "academicCalendar": { "totalWeeks": 16 }
        }"#;
        let cfg: SystemConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.working_hours.start_time, ClockTime::hm(8, 0));
        assert_eq!(cfg.working_hours.end_time, ClockTime::hm(17, 0));
        assert_eq!(cfg.general_policies.max_consecutive_hours, 2);
        assert_eq!(cfg.general_policies.max_daily_hours, 8);
        assert!(cfg.constraint_rules.prefer_morning_labs);
    }

    #[test]
    fn test_settings_json_defaults() {
        let s: Settings =
            serde_json::from_str(r#"{"algorithm":"genetic","populationSize":20}"#).unwrap();
        assert_eq!(s.population_size, 20);
        assert_eq!(s.max_generations, 100);
        assert_eq!(s.optimization_goals, vec!["minimize_conflicts".to_string()]);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_unsupported_algorithm_is_rejected_at_parse() {
        let res: Result<Settings, _> = serde_json::from_str(r#"{"algorithm":"tabu"}"#);
        assert!(res.is_err());
    }

    #[rstest]
    #[case(1.5, 0.1)]
    #[case(0.5, -0.1)]
    fn test_rates_out_of_range(#[case] crossover: f64, #[case] mutation: f64) {
        let s = Settings {
            crossover_rate: crossover,
            mutation_rate: mutation,
            ..Default::default()
        };
        assert!(matches!(
            s.validate(),
            Err(SlotForgeError::Configuration(_))
        ));
    }

    #[test]
    fn test_merge_from_cli_only_takes_typed_flags() {
        use clap::{CommandFactory, FromArgMatches, Parser};

        #[derive(Parser, Debug)]
        struct Cli {
            #[command(flatten)]
            settings: Settings,
        }

        let matches = Cli::command()
            .try_get_matches_from(["slotforge", "--max-generations", "7"])
            .unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();

        let mut from_file = Settings {
            population_size: 12,
            ..Default::default()
        };
        from_file.merge_from_cli(&cli.settings, &matches);
        assert_eq!(from_file.max_generations, 7);
        assert_eq!(from_file.population_size, 12);
    }

    #[rstest]
    #[case(1, 2, 0)]
    #[case(2, 2, 1)]
    #[case(50, 2, 2)]
    fn test_effective_elite_count(
        #[case] population: usize,
        #[case] elites: usize,
        #[case] expected: usize,
    ) {
        let s = Settings {
            population_size: population,
            elite_count: elites,
            ..Default::default()
        };
        assert_eq!(s.effective_elite_count(), expected);
    }
}
