use super::initialization::{place_session, Occupancy};
use crate::config::CrossoverStrategy;
use crate::problem::Problem;
use crate::schedule::{invalid_genes, Assignment, Schedule};

/// Builds one child from two parents. Every session instance keeps exactly one
/// placement; the result always has the full gene count.
pub fn crossover(
    problem: &Problem,
    p1: &Schedule,
    p2: &Schedule,
    strategy: CrossoverStrategy,
    rng: &mut fastrand::Rng,
) -> Schedule {
    let (a, b) = (p1.genes(), p2.genes());
    let genes: Vec<Assignment> = match strategy {
        CrossoverStrategy::ByCourse => {
            // One coin per course keeps a course's sessions from one parent.
            let from_second: Vec<bool> = (0..problem.courses.len()).map(|_| rng.bool()).collect();
            (0..a.len())
                .map(|i| {
                    if from_second[problem.sessions[i].course] {
                        b[i]
                    } else {
                        a[i]
                    }
                })
                .collect()
        }
        CrossoverStrategy::ByDay => {
            // Everything the second parent placed on one random day wins.
            let day = rng.usize(0..problem.grid.day_count());
            (0..a.len())
                .map(|i| if b[i].day == day { b[i] } else { a[i] })
                .collect()
        }
    };

    let (child, _) = repair(problem, genes, rng);
    child
}

/// Re-places every gene that is missing, malformed, or clashes on a teacher or
/// room with a gene kept before it. Returns the child and the number of genes
/// re-placed.
pub fn repair(
    problem: &Problem,
    mut genes: Vec<Assignment>,
    rng: &mut fastrand::Rng,
) -> (Schedule, usize) {
    let n = problem.session_count();
    genes.truncate(n);

    // Slot i must hold session i. Anything missing or out of place is redone.
    let mut broken: Vec<usize> = invalid_genes(problem, &genes);
    for i in genes.len()..n {
        broken.push(i);
    }

    let mut slots: Vec<Option<Assignment>> = (0..n).map(|i| genes.get(i).copied()).collect();
    for &i in &broken {
        slots[i] = None;
    }

    let mut occ = Occupancy::new(problem);
    let mut clashing = Vec::new();
    for g in slots.iter().flatten() {
        if occ.teacher_free(g.teacher, g.day, g.start, g.span)
            && occ.room_free(g.room, g.day, g.start, g.span)
        {
            occ.add(g);
        } else {
            clashing.push(g.session);
        }
    }
    for &i in &clashing {
        slots[i] = None;
    }

    let mut repaired = 0;
    for (i, slot) in slots.iter_mut().enumerate() {
        if slot.is_none() {
            let g = place_session(problem, &occ, i, rng);
            occ.add(&g);
            *slot = Some(g);
            repaired += 1;
        }
    }

    (Schedule::from_genes(slots.into_iter().flatten().collect()), repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemConfig;
    use crate::models::{Classroom, Course, RoomKind, SessionKind, Teacher};
    use crate::optimizer::initialization::random_schedule;
    use crate::scorer::hard::count_hard;

    fn problem() -> Problem {
        Problem::build(
            &[Teacher::new("T1", "CS"), Teacher::new("T2", "CS")],
            &[
                Classroom::new("R1", 40, RoomKind::Lecture),
                Classroom::new("R2", 40, RoomKind::Lecture),
            ],
            &[
                Course::new("C1", "CS", 30)
                    .with_sessions(SessionKind::Theory, 3, 1)
                    .with_teacher("T1", true),
                Course::new("C2", "CS", 30)
                    .with_sessions(SessionKind::Theory, 3, 1)
                    .with_teacher("T1", true),
                Course::new("C3", "CS", 30)
                    .with_sessions(SessionKind::Tutorial, 2, 2)
                    .with_teacher("T2", true),
            ],
            &SystemConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_child_keeps_every_session_once() {
        let p = problem();
        let mut rng = fastrand::Rng::with_seed(42);
        for strategy in [CrossoverStrategy::ByCourse, CrossoverStrategy::ByDay] {
            for _ in 0..30 {
                let a = random_schedule(&p, &mut rng);
                let b = random_schedule(&p, &mut rng);
                let child = crossover(&p, &a, &b, strategy, &mut rng);
                assert_eq!(child.len(), p.session_count());
                for (i, g) in child.genes().iter().enumerate() {
                    assert_eq!(g.session, i);
                }
                assert!(invalid_genes(&p, child.genes()).is_empty());
            }
        }
    }

    #[test]
    fn test_repair_fills_missing_and_malformed_genes() {
        let p = problem();
        let mut rng = fastrand::Rng::with_seed(9);
        let mut genes = random_schedule(&p, &mut rng).into_genes();
        genes[1].start = 99;
        genes.truncate(p.session_count() - 2);

        let (child, repaired) = repair(&p, genes, &mut rng);
        assert_eq!(repaired, 3);
        assert_eq!(child.len(), p.session_count());
        assert!(invalid_genes(&p, child.genes()).is_empty());
    }

    #[test]
    fn test_repair_resolves_introduced_clash() {
        let p = problem();
        let mut rng = fastrand::Rng::with_seed(4);
        let mut genes = random_schedule(&p, &mut rng).into_genes();
        // C1 and C2 share T1: force two of their sessions onto the same slot
        let first = genes[0];
        genes[3] = Assignment {
            session: 3,
            ..first
        };
        let (child, _) = repair(&p, genes, &mut rng);
        assert_eq!(count_hard(&p, child.genes()).teacher_clashes, 0);
    }
}
