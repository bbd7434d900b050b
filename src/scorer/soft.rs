use super::types::SoftTerms;
use crate::models::Weekday;
use crate::problem::Problem;
use crate::schedule::Assignment;
use itertools::Itertools;

/// Seat utilisation within this many points of the preferred value is free.
const UTILIZATION_TOLERANCE: f64 = 20.0;

/// Computes every soft term whose policy is switched on.
pub fn soft_terms(problem: &Problem, genes: &[Assignment]) -> SoftTerms {
    let policies = &problem.config.general_policies;
    let rules = &problem.config.constraint_rules;
    let grid = &problem.grid;
    let days = grid.day_count();
    let mut t = SoftTerms::default();

    // Per-teacher and per-course day buckets, sorted by start.
    let mut by_teacher: Vec<Vec<&Assignment>> = vec![Vec::new(); problem.teachers.len() * days];
    let mut by_course: Vec<Vec<&Assignment>> = vec![Vec::new(); problem.courses.len() * days];
    for g in genes {
        by_teacher[g.teacher * days + g.day].push(g);
        by_course[problem.sessions[g.session].course * days + g.day].push(g);
    }
    for b in by_teacher.iter_mut().chain(by_course.iter_mut()) {
        b.sort_by_key(|g| (g.start, g.session));
    }

    let consecutive_limit = grid.hours_to_periods(policies.max_consecutive_hours);
    let teaching_limit = grid.hours_to_periods(policies.max_teaching_hours_per_day);
    let cohort_limit = grid.hours_to_periods(policies.max_daily_hours);

    for day_sessions in by_teacher.iter().filter(|b| !b.is_empty()) {
        let busy = busy_periods(grid.period_count(), day_sessions);

        for run in busy_runs(&busy) {
            t.consecutive_excess += run.saturating_sub(consecutive_limit) as f64;
        }

        let load = busy.iter().filter(|&&b| b).count();
        t.teacher_daily_excess += load.saturating_sub(teaching_limit) as f64;

        let subjects = day_sessions
            .iter()
            .map(|g| problem.sessions[g.session].course)
            .unique()
            .count();
        t.subjects_per_day_excess +=
            subjects.saturating_sub(rules.max_subjects_per_day) as f64;

        for (prev, next) in day_sessions.iter().tuple_windows() {
            if next.start < prev.end() {
                // overlap is a hard violation, not a gap
                continue;
            }
            let gap = gap_minutes(problem, prev, next);
            if gap < policies.min_break_between_sessions {
                t.short_gaps += 1.0;
            }
            if !policies.allow_back_to_back_labs
                && next.start == prev.end()
                && problem.sessions[prev.session].kind.needs_lab()
                && problem.sessions[next.session].kind.needs_lab()
            {
                t.back_to_back_labs += 1.0;
            }
        }
    }

    for day_sessions in by_course.iter().filter(|b| !b.is_empty()) {
        let busy = busy_periods(grid.period_count(), day_sessions);
        let load = busy.iter().filter(|&&b| b).count();
        t.cohort_daily_excess += load.saturating_sub(cohort_limit) as f64;

        if rules.maintain_teacher_continuity {
            t.discontinuity += day_sessions
                .iter()
                .tuple_windows()
                .filter(|(prev, next)| next.start == prev.end() && next.teacher != prev.teacher)
                .count() as f64;
        }
    }

    for g in genes {
        let session = &problem.sessions[g.session];
        let room = &problem.classrooms[g.room];

        if policies.require_lab_assistant
            && session.kind.needs_lab()
            && !problem.can_teach_alone(g.session, g.teacher)
        {
            t.unassisted_labs += 1.0;
        }

        if room.capacity > 0 {
            let used = session.students as f64 * 100.0 / room.capacity as f64;
            let deviation = (used - policies.preferred_classroom_utilization as f64).abs();
            if deviation > UTILIZATION_TOLERANCE {
                t.utilization_deviation += (deviation - UTILIZATION_TOLERANCE) / 100.0;
            }
        }
        if room.capacity >= session.students
            && room.capacity - session.students < policies.min_room_capacity_buffer
        {
            t.capacity_buffer += 1.0;
        }

        let afternoon = grid.is_afternoon(g.start);
        if rules.prefer_morning_labs && session.kind.needs_lab() && afternoon {
            t.afternoon_labs += 1.0;
        }
        if policies.avoid_first_last_period && grid.is_edge_period(g.start, g.span) {
            t.edge_periods += 1.0;
        }
        if rules.avoid_friday_afternoon && afternoon && grid.days[g.day] == Weekday::Friday {
            t.friday_afternoon += 1.0;
        }
    }

    if rules.balance_workload {
        t.workload_imbalance = workload_imbalance(problem, genes);
    }

    t
}

fn busy_periods(period_count: usize, sessions: &[&Assignment]) -> Vec<bool> {
    let mut busy = vec![false; period_count];
    for g in sessions {
        for p in g.periods() {
            if let Some(slot) = busy.get_mut(p) {
                *slot = true;
            }
        }
    }
    busy
}

/// Lengths of maximal runs of busy periods. Lunch is never busy, so it breaks runs.
fn busy_runs(busy: &[bool]) -> Vec<usize> {
    busy.iter()
        .chunk_by(|&&b| b)
        .into_iter()
        .filter(|(b, _)| *b)
        .map(|(_, run)| run.count())
        .collect()
}

fn gap_minutes(problem: &Problem, prev: &Assignment, next: &Assignment) -> u16 {
    let (_, prev_end) = problem.grid.window(prev.start, prev.span);
    let (next_start, _) = problem.grid.window(next.start, next.span);
    next_start.minutes().saturating_sub(prev_end.minutes())
}

/// Sum over teachers of the standard deviation of their daily period loads.
fn workload_imbalance(problem: &Problem, genes: &[Assignment]) -> f64 {
    let days = problem.grid.day_count();
    let mut load = vec![0usize; problem.teachers.len() * days];
    for g in genes {
        load[g.teacher * days + g.day] += g.span;
    }
    load.chunks(days)
        .filter(|week| week.iter().any(|&n| n > 0))
        .map(|week| {
            let mean = week.iter().sum::<usize>() as f64 / days as f64;
            let var = week
                .iter()
                .map(|&n| (n as f64 - mean).powi(2))
                .sum::<f64>()
                / days as f64;
            var.sqrt()
        })
        .sum()
}
