use crate::problem::{Problem, TeacherOption};
use crate::schedule::{Assignment, Schedule};

/// Attempts per session before settling for the least-bad placement.
const PLACEMENT_ATTEMPTS: usize = 24;

// Placement costs. Hard-violation kinds, roughly by how hard they are to fix later.
const COST_UNAVAILABLE: u32 = 4;
const COST_BAD_ROOM: u32 = 3;
const COST_TEACHER_BUSY: u32 = 2;
const COST_ROOM_BUSY: u32 = 2;

/// Per-period booking counts for teachers and rooms, used to steer placements
/// away from clashes.
#[derive(Debug, Clone)]
pub struct Occupancy {
    days: usize,
    periods: usize,
    teacher: Vec<u16>,
    room: Vec<u16>,
}

impl Occupancy {
    pub fn new(problem: &Problem) -> Self {
        let days = problem.grid.day_count();
        let periods = problem.grid.period_count();
        Self {
            days,
            periods,
            teacher: vec![0; problem.teachers.len() * days * periods],
            room: vec![0; problem.classrooms.len() * days * periods],
        }
    }

    pub fn from_genes(problem: &Problem, genes: &[Assignment]) -> Self {
        let mut occ = Occupancy::new(problem);
        for g in genes {
            occ.add(g);
        }
        occ
    }

    #[inline(always)]
    fn idx(&self, resource: usize, day: usize, period: usize) -> usize {
        (resource * self.days + day) * self.periods + period
    }

    pub fn add(&mut self, g: &Assignment) {
        for p in g.periods() {
            let t = self.idx(g.teacher, g.day, p);
            let r = self.idx(g.room, g.day, p);
            self.teacher[t] += 1;
            self.room[r] += 1;
        }
    }

    pub fn remove(&mut self, g: &Assignment) {
        for p in g.periods() {
            let t = self.idx(g.teacher, g.day, p);
            let r = self.idx(g.room, g.day, p);
            self.teacher[t] = self.teacher[t].saturating_sub(1);
            self.room[r] = self.room[r].saturating_sub(1);
        }
    }

    pub fn teacher_free(&self, teacher: usize, day: usize, start: usize, span: usize) -> bool {
        (start..start + span).all(|p| self.teacher[self.idx(teacher, day, p)] == 0)
    }

    pub fn room_free(&self, room: usize, day: usize, start: usize, span: usize) -> bool {
        (start..start + span).all(|p| self.room[self.idx(room, day, p)] == 0)
    }
}

/// Picks a teacher for a fixed slot. Teachers on duty and free come first,
/// then teachers on duty but busy, then any eligible teacher. Primaries are
/// favoured within whichever tier is used.
pub fn pick_teacher(
    problem: &Problem,
    occ: &Occupancy,
    session: usize,
    day: usize,
    start: usize,
    rng: &mut fastrand::Rng,
) -> usize {
    let span = problem.sessions[session].span;
    let options = &problem.teacher_options[session];
    let on_duty: Vec<TeacherOption> = options
        .iter()
        .filter(|o| problem.teacher_available(o.teacher, day, start, span))
        .copied()
        .collect();
    let free: Vec<TeacherOption> = on_duty
        .iter()
        .filter(|o| occ.teacher_free(o.teacher, day, start, span))
        .copied()
        .collect();

    let pool: &[TeacherOption] = if !free.is_empty() {
        &free
    } else if !on_duty.is_empty() {
        &on_duty
    } else {
        options
    };
    favour_primaries(pool, rng)
}

// Options keep primaries first, so the leading run is the primary set.
fn favour_primaries(pool: &[TeacherOption], rng: &mut fastrand::Rng) -> usize {
    let primaries = pool.iter().take_while(|o| o.primary).count();
    if primaries > 0 && primaries < pool.len() && rng.f32() < 0.7 {
        pool[rng.usize(0..primaries)].teacher
    } else {
        pool[rng.usize(0..pool.len())].teacher
    }
}

/// A random (day, start) the session's span fits into.
pub fn random_slot(problem: &Problem, span: usize, rng: &mut fastrand::Rng) -> (usize, usize) {
    let starts = problem.grid.starts(span);
    let day = rng.usize(0..problem.grid.day_count());
    (day, starts[rng.usize(0..starts.len())])
}

/// Best room for a fixed slot: a free compatible room, else any compatible room,
/// else the top fallback.
pub fn pick_room(
    problem: &Problem,
    occ: &Occupancy,
    session: usize,
    day: usize,
    start: usize,
    rng: &mut fastrand::Rng,
) -> usize {
    let options = &problem.room_options[session];
    let span = problem.sessions[session].span;
    let compatible = options.compatible_rooms();

    if !compatible.is_empty() {
        let offset = rng.usize(0..compatible.len());
        for k in 0..compatible.len() {
            let room = compatible[(offset + k) % compatible.len()];
            if occ.room_free(room, day, start, span) {
                return room;
            }
        }
        return compatible[offset];
    }
    options
        .rooms
        .iter()
        .copied()
        .find(|&r| occ.room_free(r, day, start, span))
        .unwrap_or(options.rooms[0])
}

fn placement_cost(problem: &Problem, occ: &Occupancy, g: &Assignment) -> u32 {
    let mut cost = 0;
    if !problem.teacher_available(g.teacher, g.day, g.start, g.span) {
        cost += COST_UNAVAILABLE;
    }
    if !occ.teacher_free(g.teacher, g.day, g.start, g.span) {
        cost += COST_TEACHER_BUSY;
    }
    if !occ.room_free(g.room, g.day, g.start, g.span) {
        cost += COST_ROOM_BUSY;
    }
    if !problem.room_options[g.session].compatible_rooms().contains(&g.room) {
        cost += COST_BAD_ROOM;
    }
    cost
}

/// Places one session against the current occupancy. Returns the first
/// clash-free placement found, or the cheapest one seen.
pub fn place_session(
    problem: &Problem,
    occ: &Occupancy,
    session: usize,
    rng: &mut fastrand::Rng,
) -> Assignment {
    let span = problem.sessions[session].span;
    let mut best: Option<(u32, Assignment)> = None;

    for _ in 0..PLACEMENT_ATTEMPTS {
        let (day, start) = random_slot(problem, span, rng);
        let teacher = pick_teacher(problem, occ, session, day, start, rng);
        let room = pick_room(problem, occ, session, day, start, rng);
        let candidate = Assignment {
            session,
            day,
            start,
            span,
            room,
            teacher,
        };
        let cost = placement_cost(problem, occ, &candidate);
        if cost == 0 {
            return candidate;
        }
        if best.as_ref().map_or(true, |(c, _)| cost < *c) {
            best = Some((cost, candidate));
        }
    }

    match best {
        Some((_, g)) => g,
        None => Assignment {
            session,
            day: 0,
            start: problem.grid.starts(span)[0],
            span,
            room: problem.room_options[session].rooms[0],
            teacher: problem.teacher_options[session][0].teacher,
        },
    }
}

/// Builds one schedule greedily, visiting sessions in random order.
pub fn random_schedule(problem: &Problem, rng: &mut fastrand::Rng) -> Schedule {
    let n = problem.session_count();
    let mut order: Vec<usize> = (0..n).collect();
    rng.shuffle(&mut order);

    let mut occ = Occupancy::new(problem);
    let mut genes: Vec<Option<Assignment>> = vec![None; n];
    for s in order {
        let g = place_session(problem, &occ, s, rng);
        occ.add(&g);
        genes[s] = Some(g);
    }
    Schedule::from_genes(genes.into_iter().flatten().collect())
}

pub fn initial_population(problem: &Problem, size: usize, rng: &mut fastrand::Rng) -> Vec<Schedule> {
    (0..size).map(|_| random_schedule(problem, rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemConfig;
    use crate::models::{Classroom, Course, RoomKind, SessionKind, Teacher};
    use crate::schedule::invalid_genes;
    use crate::scorer::hard::count_hard;

    fn problem() -> Problem {
        Problem::build(
            &[Teacher::new("T1", "CS"), Teacher::new("T2", "CS")],
            &[
                Classroom::new("R1", 40, RoomKind::Lecture),
                Classroom::new("L1", 40, RoomKind::Lab),
            ],
            &[
                Course::new("C1", "CS", 30)
                    .with_sessions(SessionKind::Theory, 3, 1)
                    .with_sessions(SessionKind::Practical, 1, 2)
                    .with_teacher("T1", true),
                Course::new("C2", "CS", 30)
                    .with_sessions(SessionKind::Theory, 2, 1)
                    .with_teacher("T2", true),
            ],
            &SystemConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_random_schedule_is_complete_and_well_formed() {
        let p = problem();
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..20 {
            let s = random_schedule(&p, &mut rng);
            assert_eq!(s.len(), p.session_count());
            assert!(invalid_genes(&p, s.genes()).is_empty());
        }
    }

    #[test]
    fn test_easy_problem_places_without_violations() {
        let p = problem();
        let mut rng = fastrand::Rng::with_seed(1);
        let s = random_schedule(&p, &mut rng);
        assert_eq!(count_hard(&p, s.genes()).total(), 0);
    }

    #[test]
    fn test_occupancy_add_remove() {
        let p = problem();
        let g = Assignment { session: 3, day: 1, start: 4, span: 2, room: 1, teacher: 0 };
        let mut occ = Occupancy::new(&p);
        occ.add(&g);
        assert!(!occ.teacher_free(0, 1, 5, 1));
        assert!(!occ.room_free(1, 1, 4, 1));
        assert!(occ.teacher_free(0, 1, 0, 2));
        occ.remove(&g);
        assert!(occ.teacher_free(0, 1, 4, 2));
    }

    #[test]
    fn test_primary_bias_still_uses_every_option() {
        let p = Problem::build(
            &[Teacher::new("T1", "CS"), Teacher::new("T2", "CS")],
            &[Classroom::new("R1", 40, RoomKind::Lecture)],
            &[Course::new("C1", "CS", 30)
                .with_sessions(SessionKind::Theory, 1, 1)
                .with_teacher("T1", true)
                .with_teacher("T2", false)],
            &SystemConfig::default(),
        )
        .unwrap();
        let occ = Occupancy::new(&p);
        let mut rng = fastrand::Rng::with_seed(3);
        let picks: Vec<usize> = (0..200)
            .map(|_| pick_teacher(&p, &occ, 0, 0, 0, &mut rng))
            .collect();
        let primary = picks.iter().filter(|&&t| t == 0).count();
        assert!(primary > 100 && primary < 200);
    }

    #[test]
    fn test_pick_teacher_prefers_on_duty_then_free() {
        use crate::models::{ClockTime, Weekday};

        let p = Problem::build(
            &[
                Teacher::new("T1", "CS"),
                Teacher::new("T2", "CS").available_on(
                    &[Weekday::Tuesday],
                    ClockTime::hm(9, 0),
                    ClockTime::hm(17, 0),
                ),
            ],
            &[Classroom::new("R1", 40, RoomKind::Lecture)],
            &[Course::new("C1", "CS", 30)
                .with_sessions(SessionKind::Theory, 2, 1)
                .with_teacher("T2", true)
                .with_teacher("T1", false)],
            &SystemConfig::default(),
        )
        .unwrap();
        let mut rng = fastrand::Rng::with_seed(21);
        let mut occ = Occupancy::new(&p);

        // Monday: only T1 is on duty, even though T2 is the primary
        for _ in 0..100 {
            assert_eq!(pick_teacher(&p, &occ, 0, 0, 0, &mut rng), 0);
        }

        // Tuesday with T2 already booked in that period: T1 is the free choice
        occ.add(&Assignment { session: 1, day: 1, start: 0, span: 1, room: 0, teacher: 1 });
        for _ in 0..100 {
            assert_eq!(pick_teacher(&p, &occ, 0, 1, 0, &mut rng), 0);
        }
    }
}
