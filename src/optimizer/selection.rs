use crate::schedule::Schedule;

/// Tournament selection: samples `size` individuals uniformly (with replacement)
/// and returns the index of the fittest. Unscored individuals count as worst.
pub fn tournament(population: &[Schedule], size: usize, rng: &mut fastrand::Rng) -> usize {
    let mut best = rng.usize(0..population.len());
    for _ in 1..size.max(1) {
        let challenger = rng.usize(0..population.len());
        if population[challenger]
            .fitness_or_worst()
            .is_better_than(&population[best].fitness_or_worst())
        {
            best = challenger;
        }
    }
    best
}
