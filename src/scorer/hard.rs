use super::types::HardCounts;
use crate::models::RoomKind;
use crate::problem::Problem;
use crate::schedule::Assignment;
use itertools::Itertools;

/// Counts hard violations. Double-bookings are counted once per overlapping pair.
pub fn count_hard(problem: &Problem, genes: &[Assignment]) -> HardCounts {
    let days = problem.grid.day_count();
    let mut by_teacher: Vec<Vec<&Assignment>> = vec![Vec::new(); problem.teachers.len() * days];
    let mut by_room: Vec<Vec<&Assignment>> = vec![Vec::new(); problem.classrooms.len() * days];
    let mut counts = HardCounts::default();

    for g in genes {
        by_teacher[g.teacher * days + g.day].push(g);
        by_room[g.room * days + g.day].push(g);

        let session = &problem.sessions[g.session];
        let room = &problem.classrooms[g.room];
        if room.capacity < session.students {
            counts.over_capacity += 1;
        }
        if !problem.teacher_available(g.teacher, g.day, g.start, g.span) {
            counts.teacher_unavailable += 1;
        }
        if session.kind.needs_lab() && room.room_type != RoomKind::Lab {
            counts.room_kind_mismatch += 1;
        }
    }

    counts.teacher_clashes = overlapping_pairs(&by_teacher);
    counts.room_clashes = overlapping_pairs(&by_room);
    counts
}

fn overlapping_pairs(buckets: &[Vec<&Assignment>]) -> u32 {
    buckets
        .iter()
        .filter(|b| b.len() > 1)
        .map(|b| {
            b.iter()
                .tuple_combinations()
                .filter(|(a, c)| a.overlaps(c))
                .count() as u32
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemConfig;
    use crate::models::{ClockTime, Classroom, Course, SessionKind, Teacher, Weekday};

    fn problem() -> Problem {
        let teachers = vec![
            Teacher::new("T1", "CS"),
            Teacher::new("T2", "CS").available_on(
                &[Weekday::Monday],
                ClockTime::hm(9, 0),
                ClockTime::hm(11, 0),
            ),
        ];
        let rooms = vec![
            Classroom::new("R1", 50, RoomKind::Lecture),
            Classroom::new("R2", 10, RoomKind::Lecture),
            Classroom::new("L1", 50, RoomKind::Lab),
        ];
        let courses = vec![
            Course::new("C1", "CS", 30).with_sessions(SessionKind::Theory, 3, 1),
            Course::new("C2", "CS", 30).with_sessions(SessionKind::Practical, 1, 2),
        ];
        Problem::build(&teachers, &rooms, &courses, &SystemConfig::default()).unwrap()
    }

    fn a(session: usize, day: usize, start: usize, span: usize, room: usize, teacher: usize) -> Assignment {
        Assignment { session, day, start, span, room, teacher }
    }

    #[test]
    fn test_clean_schedule_has_no_violations() {
        let p = problem();
        let genes = vec![
            a(0, 0, 0, 1, 0, 0),
            a(1, 1, 0, 1, 0, 0),
            a(2, 2, 0, 1, 0, 0),
            a(3, 0, 0, 2, 2, 1),
        ];
        assert_eq!(count_hard(&p, &genes).total(), 0);
    }

    #[test]
    fn test_teacher_and_room_double_booking() {
        let p = problem();
        let genes = vec![
            a(0, 0, 0, 1, 0, 0),
            a(1, 0, 0, 1, 0, 0),
            a(2, 0, 0, 1, 0, 0),
            a(3, 1, 0, 2, 2, 0),
        ];
        let h = count_hard(&p, &genes);
        // three sessions in the same slot: 3 pairs for the teacher, 3 for the room
        assert_eq!(h.teacher_clashes, 3);
        assert_eq!(h.room_clashes, 3);
    }

    #[test]
    fn test_capacity_availability_and_kind() {
        let p = problem();
        let genes = vec![
            a(0, 0, 0, 1, 1, 0), // 30 students in a 10-seat room
            a(1, 1, 4, 1, 0, 1), // T2 only works Monday mornings
            a(2, 2, 0, 1, 0, 0),
            a(3, 3, 0, 2, 0, 0), // practical in a lecture room
        ];
        let h = count_hard(&p, &genes);
        assert_eq!(h.over_capacity, 1);
        assert_eq!(h.teacher_unavailable, 1);
        assert_eq!(h.room_kind_mismatch, 1);
        assert_eq!(h.total(), 3);
    }

    #[test]
    fn test_partial_span_overlap_counts() {
        let p = problem();
        let genes = vec![
            a(0, 0, 1, 1, 0, 0),
            a(1, 1, 0, 1, 0, 0),
            a(2, 2, 0, 1, 0, 0),
            a(3, 0, 0, 2, 2, 0), // covers periods 0-1 on Monday, same teacher as gene 0
        ];
        assert_eq!(count_hard(&p, &genes).teacher_clashes, 1);
    }
}
