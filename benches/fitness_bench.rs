use criterion::{criterion_group, criterion_main, Criterion};
use rayon::prelude::*;
use slotforge::models::{Classroom, Course, RoomKind, SessionKind, Teacher};
use slotforge::optimizer::initialization::{initial_population, random_schedule};
use slotforge::problem::{Problem, ProblemBuildParams};
use slotforge::scorer::{GoalWeights, Scorer};
use std::hint::black_box;

fn setup_problem() -> Problem {
    let teachers: Vec<Teacher> = (0..12)
        .map(|i| Teacher::new(&format!("T{}", i), "CS"))
        .collect();

    let mut classrooms: Vec<Classroom> = (0..8)
        .map(|i| Classroom::new(&format!("R{}", i), 30 + 10 * i, RoomKind::Lecture))
        .collect();
    classrooms.push(Classroom::new("LAB1", 40, RoomKind::Lab));
    classrooms.push(Classroom::new("LAB2", 60, RoomKind::Lab));

    // 30 courses, 4 sessions each
    let courses: Vec<Course> = (0..30)
        .map(|i| {
            Course::new(&format!("C{}", i), "CS", 20 + (i as u32 % 5) * 8)
                .with_sessions(SessionKind::Theory, 3, 1)
                .with_sessions(SessionKind::Practical, 1, 2)
                .with_teacher(&format!("T{}", i % 12), true)
        })
        .collect();

    ProblemBuildParams::builder()
        .teachers(&teachers)
        .classrooms(&classrooms)
        .courses(&courses)
        .build()
        .build_problem()
        .expect("Failed to build problem")
}

fn criterion_benchmark(c: &mut Criterion) {
    let problem = setup_problem();
    let scorer = Scorer::new(&problem, GoalWeights::all());
    let mut rng = fastrand::Rng::with_seed(1);
    let schedule = random_schedule(&problem, &mut rng);
    let population = initial_population(&problem, 50, &mut rng);

    c.bench_function("evaluate (120 sessions)", |b| {
        b.iter(|| scorer.evaluate(black_box(schedule.genes())))
    });

    c.bench_function("evaluate population x50 (parallel)", |b| {
        b.iter(|| {
            population
                .par_iter()
                .map(|s| scorer.evaluate(black_box(s.genes())).score)
                .sum::<f64>()
        })
    });

    c.bench_function("random_schedule (120 sessions)", |b| {
        b.iter(|| random_schedule(black_box(&problem), &mut rng))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
