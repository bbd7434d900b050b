use crate::config::{Settings, SystemConfig};
use crate::error::{SfResult, SlotForgeError};
use crate::models::{ClockTime, Classroom, Course, SessionKind, Teacher, Weekday};
use crate::optimizer::{CancelToken, Optimizer, ProgressCallback, Termination};
use crate::problem::Problem;
use crate::schedule::{Assignment, Schedule};
use crate::scorer::{FitnessReport, GoalWeights, Scorer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Everything one run needs, as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dataset {
    pub teachers: Vec<Teacher>,
    pub classrooms: Vec<Classroom>,
    pub courses: Vec<Course>,
    #[serde(alias = "systemConfig")]
    pub config: SystemConfig,
    pub settings: Settings,
}

impl Dataset {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SfResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let dataset: Dataset = serde_json::from_str(&content)?;
        info!(
            "Loaded dataset {}: {} teachers, {} classrooms, {} courses",
            path.as_ref().display(),
            dataset.teachers.len(),
            dataset.classrooms.len(),
            dataset.courses.len()
        );
        Ok(dataset)
    }

    pub fn problem(&self) -> SfResult<Problem> {
        Problem::build(&self.teachers, &self.classrooms, &self.courses, &self.config)
    }
}

/// One placed session, resolved to entity ids and clock times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledSession {
    pub course_id: String,
    #[serde(default)]
    pub course_name: String,
    pub session_type: SessionKind,
    pub occurrence: u32,
    pub teacher_id: String,
    pub classroom_id: String,
    pub day: Weekday,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    /// Index of the first grid period.
    pub period: usize,
    pub span: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetrics {
    pub generations_run: usize,
    pub best_fitness: f64,
    pub hard_violation_count: u32,
    pub soft_penalty_total: f64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub success: bool,
    pub reason: Option<String>,
    pub schedule: Vec<ScheduledSession>,
    pub metrics: RunMetrics,
    pub termination: Termination,
    pub cancelled: bool,
    pub history: Vec<f64>,
    pub report: FitnessReport,
}

/// Only the part of a saved result the validator reads back.
#[derive(Debug, Clone, Deserialize)]
struct SavedSchedule {
    schedule: Vec<ScheduledSession>,
}

/// Runs the engine once. Infeasibility is reported through `RunResult`, not as an error.
pub fn optimize(
    teachers: &[Teacher],
    classrooms: &[Classroom],
    courses: &[Course],
    settings: &Settings,
    config: &SystemConfig,
    progress: Option<&dyn ProgressCallback>,
) -> SfResult<RunResult> {
    optimize_with_cancel(
        teachers,
        classrooms,
        courses,
        settings,
        config,
        progress,
        CancelToken::new(),
    )
}

/// Like `optimize`, stopping at the next generation boundary once `cancel` fires.
pub fn optimize_with_cancel(
    teachers: &[Teacher],
    classrooms: &[Classroom],
    courses: &[Course],
    settings: &Settings,
    config: &SystemConfig,
    progress: Option<&dyn ProgressCallback>,
    cancel: CancelToken,
) -> SfResult<RunResult> {
    settings.validate()?;
    let problem = Problem::build(teachers, classrooms, courses, config)?;
    let outcome = Optimizer::new(&problem, settings)?
        .with_cancel_token(cancel)
        .run(progress)?;

    let fitness = outcome.report.fitness;
    let success = fitness.hard == 0;

    let mut notes = Vec::new();
    if !success {
        notes.push(format!(
            "no conflict-free schedule found within generation budget: {} unresolved conflict{} ({})",
            fitness.hard,
            if fitness.hard == 1 { "" } else { "s" },
            outcome.report.hard.describe()
        ));
    }
    if outcome.termination.is_early_stop() {
        notes.push(format!(
            "run stopped early ({}) after {} generations",
            outcome.termination.to_string().replace('_', " "),
            outcome.generations
        ));
    }
    let reason = if notes.is_empty() {
        None
    } else {
        Some(notes.join("; "))
    };
    if let Some(r) = &reason {
        warn!("{}", r);
    }

    Ok(RunResult {
        success,
        reason,
        schedule: schedule_rows(&problem, outcome.best.genes()),
        metrics: RunMetrics {
            generations_run: outcome.generations,
            best_fitness: fitness.score,
            hard_violation_count: fitness.hard,
            soft_penalty_total: fitness.soft,
            duration_ms: outcome.duration.as_millis() as u64,
        },
        termination: outcome.termination,
        cancelled: outcome.termination.is_early_stop(),
        history: outcome.history,
        report: outcome.report,
    })
}

/// Resolves genes to output rows, ordered by day, period and course.
pub fn schedule_rows(problem: &Problem, genes: &[Assignment]) -> Vec<ScheduledSession> {
    let mut rows: Vec<(usize, ScheduledSession)> = genes
        .iter()
        .map(|g| {
            let session = &problem.sessions[g.session];
            let course = &problem.courses[session.course];
            let (start_time, end_time) = problem.grid.window(g.start, g.span);
            (
                g.day,
                ScheduledSession {
                    course_id: course.id.clone(),
                    course_name: course.name.clone(),
                    session_type: session.kind,
                    occurrence: session.occurrence,
                    teacher_id: problem.teachers[g.teacher].id.clone(),
                    classroom_id: problem.classrooms[g.room].id.clone(),
                    day: problem.grid.days[g.day],
                    start_time,
                    end_time,
                    period: g.start,
                    span: g.span,
                },
            )
        })
        .collect();
    rows.sort_by(|(da, a), (db, b)| {
        da.cmp(db)
            .then(a.period.cmp(&b.period))
            .then(a.course_id.cmp(&b.course_id))
    });
    rows.into_iter().map(|(_, r)| r).collect()
}

/// Maps output rows back onto session instances. Every instance must appear once.
pub fn genes_from_rows(problem: &Problem, rows: &[ScheduledSession]) -> SfResult<Vec<Assignment>> {
    let teacher_idx: HashMap<&str, usize> = problem
        .teachers
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), i))
        .collect();
    let room_idx: HashMap<&str, usize> = problem
        .classrooms
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.as_str(), i))
        .collect();
    let session_idx: HashMap<(&str, SessionKind, u32), usize> = problem
        .sessions
        .iter()
        .map(|s| {
            (
                (problem.courses[s.course].id.as_str(), s.kind, s.occurrence),
                s.index,
            )
        })
        .collect();

    let mut genes: Vec<Option<Assignment>> = vec![None; problem.session_count()];
    for row in rows {
        let key = (row.course_id.as_str(), row.session_type, row.occurrence);
        let session = *session_idx.get(&key).ok_or_else(|| {
            SlotForgeError::Validation(format!(
                "row for {} {} #{} matches no session instance",
                row.course_id, row.session_type, row.occurrence
            ))
        })?;
        let teacher = *teacher_idx.get(row.teacher_id.as_str()).ok_or_else(|| {
            SlotForgeError::Validation(format!("unknown or inactive teacher '{}'", row.teacher_id))
        })?;
        let room = *room_idx.get(row.classroom_id.as_str()).ok_or_else(|| {
            SlotForgeError::Validation(format!(
                "unknown or unavailable classroom '{}'",
                row.classroom_id
            ))
        })?;
        let day = problem
            .grid
            .days
            .iter()
            .position(|&d| d == row.day)
            .ok_or_else(|| {
                SlotForgeError::Validation(format!("{} is not a working day", row.day))
            })?;
        if genes[session].is_some() {
            return Err(SlotForgeError::Validation(format!(
                "{} {} #{} is placed twice",
                row.course_id, row.session_type, row.occurrence
            )));
        }
        genes[session] = Some(Assignment {
            session,
            day,
            start: row.period,
            span: problem.sessions[session].span,
            room,
            teacher,
        });
    }

    let missing: Vec<String> = genes
        .iter()
        .enumerate()
        .filter(|(_, g)| g.is_none())
        .map(|(i, _)| problem.session_label(i))
        .collect();
    if !missing.is_empty() {
        return Err(SlotForgeError::Validation(format!(
            "schedule is missing {} session(s): {}",
            missing.len(),
            missing.join(", ")
        )));
    }
    Ok(genes.into_iter().flatten().collect())
}

/// Re-scores saved output rows against a dataset.
pub fn validate_schedule(dataset: &Dataset, rows: &[ScheduledSession]) -> SfResult<FitnessReport> {
    let problem = dataset.problem()?;
    let genes = genes_from_rows(&problem, rows)?;
    let schedule = Schedule::new(&problem, genes)?;
    let scorer = Scorer::new(&problem, GoalWeights::from_settings(&dataset.settings));
    Ok(scorer.report(schedule.genes()))
}

/// Reads the `schedule` rows out of a saved `RunResult` JSON file.
pub fn load_schedule_rows<P: AsRef<Path>>(path: P) -> SfResult<Vec<ScheduledSession>> {
    let content = fs::read_to_string(path)?;
    let saved: SavedSchedule = serde_json::from_str(&content)?;
    Ok(saved.schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomKind;

    fn dataset() -> Dataset {
        Dataset {
            teachers: vec![Teacher::new("T1", "CS")],
            classrooms: vec![Classroom::new("R1", 40, RoomKind::Lecture)],
            courses: vec![Course::new("C1", "CS", 30)
                .with_sessions(SessionKind::Theory, 2, 1)
                .with_teacher("T1", true)],
            config: SystemConfig::default(),
            settings: Settings {
                population_size: 10,
                max_generations: 20,
                seed: Some(3),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_rows_round_trip_through_validation() {
        let d = dataset();
        let res = optimize(
            &d.teachers,
            &d.classrooms,
            &d.courses,
            &d.settings,
            &d.config,
            None,
        )
        .unwrap();
        assert!(res.success);
        assert!(res.reason.is_none());
        assert_eq!(res.schedule.len(), 2);

        let report = validate_schedule(&d, &res.schedule).unwrap();
        assert_eq!(report.fitness.hard, 0);
        assert_eq!(report.fitness.score, res.metrics.best_fitness);
    }

    #[test]
    fn test_missing_row_is_a_validation_error() {
        let d = dataset();
        let p = d.problem().unwrap();
        let genes = vec![
            Assignment { session: 0, day: 0, start: 0, span: 1, room: 0, teacher: 0 },
            Assignment { session: 1, day: 1, start: 0, span: 1, room: 0, teacher: 0 },
        ];
        let mut rows = schedule_rows(&p, &genes);
        rows.pop();
        assert!(matches!(
            genes_from_rows(&p, &rows),
            Err(SlotForgeError::Validation(_))
        ));
    }

    #[test]
    fn test_rows_are_sorted_by_day_then_period() {
        let d = dataset();
        let p = d.problem().unwrap();
        let genes = vec![
            Assignment { session: 0, day: 2, start: 0, span: 1, room: 0, teacher: 0 },
            Assignment { session: 1, day: 0, start: 4, span: 1, room: 0, teacher: 0 },
        ];
        let rows = schedule_rows(&p, &genes);
        assert_eq!(rows[0].day, Weekday::Monday);
        assert_eq!(rows[0].start_time, ClockTime::hm(13, 30));
        assert_eq!(rows[1].day, Weekday::Wednesday);
        assert_eq!(rows[1].occurrence, 1);
    }

    #[test]
    fn test_dataset_json_with_partial_blocks() {
        let json = r#"{
            "teachers": [{ "id": "T1", "department": "CS" }],
            "classrooms": [{ "id": "R1", "capacity": 30, "roomType": "lecture" }],
            "courses": [{ "id": "C1", "enrolledStudents": 20,
                          "sessions": { "theory": { "sessionsPerWeek": 1 } } }],
            "settings": { "populationSize": 8 }
        }"#;
        let d: Dataset = serde_json::from_str(json).unwrap();
        assert_eq!(d.settings.population_size, 8);
        assert_eq!(d.config.working_hours.period_duration, 50);
        assert_eq!(d.problem().unwrap().session_count(), 1);
    }
}
