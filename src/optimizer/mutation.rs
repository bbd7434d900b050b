use super::initialization::{pick_room, pick_teacher, random_slot, Occupancy};
use crate::problem::Problem;
use crate::schedule::{Assignment, Schedule};

/// Per-gene mutation. With probability `rate`, each gene re-rolls one of its
/// time slot, room or teacher. Returns how many genes changed.
pub fn mutate(problem: &Problem, schedule: &mut Schedule, rate: f64, rng: &mut fastrand::Rng) -> usize {
    if rate <= 0.0 {
        return 0;
    }
    let mut occ = Occupancy::from_genes(problem, schedule.genes());
    let mut changed = 0;

    for i in 0..schedule.len() {
        if rng.f64() >= rate {
            continue;
        }
        let old = schedule.genes()[i];
        occ.remove(&old);

        let new = match rng.u8(0..3) {
            0 => move_slot(problem, &occ, &old, rng),
            1 => Assignment {
                room: pick_room(problem, &occ, i, old.day, old.start, rng),
                ..old
            },
            _ => Assignment {
                teacher: pick_teacher(problem, &occ, i, old.day, old.start, rng),
                ..old
            },
        };

        occ.add(&new);
        if new != old {
            schedule.set_gene(new);
            changed += 1;
        }
    }
    changed
}

/// Moves a gene in time. The room stays put when it is free at the new slot.
fn move_slot(problem: &Problem, occ: &Occupancy, old: &Assignment, rng: &mut fastrand::Rng) -> Assignment {
    let (day, start) = free_slot(problem, occ, old, rng);
    let room = if occ.room_free(old.room, day, start, old.span) {
        old.room
    } else {
        pick_room(problem, occ, old.session, day, start, rng)
    };
    Assignment { day, start, room, ..*old }
}

/// A random slot where the gene's teacher is on duty and free, else one where
/// they are at least on duty, else any slot the span fits.
fn free_slot(
    problem: &Problem,
    occ: &Occupancy,
    g: &Assignment,
    rng: &mut fastrand::Rng,
) -> (usize, usize) {
    let on_duty: Vec<(usize, usize)> = (0..problem.grid.day_count())
        .flat_map(|day| problem.grid.starts(g.span).iter().map(move |&start| (day, start)))
        .filter(|&(day, start)| problem.teacher_available(g.teacher, day, start, g.span))
        .collect();
    let free: Vec<(usize, usize)> = on_duty
        .iter()
        .copied()
        .filter(|&(day, start)| occ.teacher_free(g.teacher, day, start, g.span))
        .collect();

    if !free.is_empty() {
        free[rng.usize(0..free.len())]
    } else if !on_duty.is_empty() {
        on_duty[rng.usize(0..on_duty.len())]
    } else {
        random_slot(problem, g.span, rng)
    }
}
