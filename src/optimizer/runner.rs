use super::crossover::crossover;
use super::initialization::initial_population;
use super::mutation::mutate;
use super::selection::tournament;
use crate::config::{CrossoverStrategy, Settings};
use crate::error::{SfResult, SlotForgeError};
use crate::problem::Problem;
use crate::schedule::Schedule;
use crate::scorer::{Fitness, FitnessReport, GoalWeights, Scorer};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use strum_macros::Display;
use tracing::{debug, info};

pub struct OptimizationOptions {
    pub population_size: usize,
    pub max_generations: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub tournament_size: usize,
    pub elite_count: usize,
    pub stagnation_window: Option<usize>,
    pub acceptable_soft_penalty: f64,
    pub crossover_strategy: CrossoverStrategy,
    pub num_threads: Option<usize>,
    pub max_time: Option<Duration>,
}

impl From<&Settings> for OptimizationOptions {
    fn from(s: &Settings) -> Self {
        Self {
            population_size: s.population_size,
            max_generations: s.max_generations,
            crossover_rate: s.crossover_rate,
            mutation_rate: s.mutation_rate,
            tournament_size: s.tournament_size,
            elite_count: s.effective_elite_count(),
            stagnation_window: s.stagnation_window.filter(|&w| w > 0),
            acceptable_soft_penalty: s.acceptable_soft_penalty,
            crossover_strategy: s.crossover_strategy,
            num_threads: s.threads,
            max_time: s.max_time(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Initializing,
    Evaluating,
    Evolving,
    Terminated,
}

/// Which rule ended the generational loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    MaxGenerations,
    Converged,
    Stagnated,
    Cancelled,
    DeadlineReached,
}

impl Termination {
    /// Stopped from outside rather than by the search itself.
    pub fn is_early_stop(&self) -> bool {
        matches!(self, Termination::Cancelled | Termination::DeadlineReached)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub percent: f64,
    pub phase: Phase,
    pub generation: usize,
    pub best_fitness: Option<f64>,
}

/// Receives progress between phases. Called on the control thread, so
/// implementations must return quickly; see `ChannelProgress` for a
/// queue-backed adapter.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressCallback for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Forwards events into an unbounded channel. Never blocks the search; events
/// sent after the receiver is dropped are discarded.
pub struct ChannelProgress {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new() -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl ProgressCallback for ChannelProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        let _ = self.tx.send(*event);
    }
}

/// Shared stop flag. Checked once per generation boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct RunOutcome {
    pub best: Schedule,
    pub report: FitnessReport,
    pub generations: usize,
    pub termination: Termination,
    /// Best fitness after each evaluated generation; index 0 is the initial population.
    pub history: Vec<f64>,
    pub duration: Duration,
}

pub struct Optimizer<'p> {
    problem: &'p Problem,
    scorer: Scorer<'p>,
    options: OptimizationOptions,
    seed: Option<u64>,
    pool: Option<rayon::ThreadPool>,
    cancel: CancelToken,
}

impl<'p> Optimizer<'p> {
    pub fn new(problem: &'p Problem, settings: &Settings) -> SfResult<Self> {
        settings.validate()?;
        let options = OptimizationOptions::from(settings);
        let pool = match options.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| SlotForgeError::Configuration(format!("worker pool: {}", e)))?,
            ),
            None => None,
        };
        Ok(Self {
            problem,
            scorer: Scorer::new(problem, GoalWeights::from_settings(settings)),
            options,
            seed: settings.seed,
            pool,
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn run(&self, callback: Option<&dyn ProgressCallback>) -> SfResult<RunOutcome> {
        let opts = &self.options;
        let start_time = Instant::now();
        let emit = |percent: f64, phase: Phase, generation: usize, best: Option<f64>| {
            if let Some(cb) = callback {
                cb.on_progress(&ProgressEvent {
                    percent,
                    phase,
                    generation,
                    best_fitness: best,
                });
            }
        };

        info!(
            "Starting genetic search: {} sessions, population {}, up to {} generations",
            self.problem.session_count(),
            opts.population_size,
            opts.max_generations
        );

        // 1. Initialize
        emit(0.0, Phase::Initializing, 0, None);
        let mut rng = match self.seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };
        let mut population = initial_population(self.problem, opts.population_size, &mut rng);

        let mut best: Option<Schedule> = None;
        let mut best_fitness = Fitness::WORST;
        let mut history = Vec::new();
        let mut stagnant = 0usize;
        let mut generation = 0usize;

        // 2. Main Loop
        let termination = loop {
            // A. Evaluate
            self.evaluate(&mut population);
            if let Some(leader) = population
                .iter()
                .min_by(|a, b| a.fitness_or_worst().compare(&b.fitness_or_worst()))
            {
                let f = leader.fitness_or_worst();
                if f.is_better_than(&best_fitness) {
                    best_fitness = f;
                    best = Some(leader.clone());
                    stagnant = 0;
                } else {
                    stagnant += 1;
                }
            }
            history.push(best_fitness.score);

            let percent = if opts.max_generations == 0 {
                100.0
            } else {
                (generation as f64 * 100.0 / opts.max_generations as f64).min(100.0)
            };
            emit(percent, Phase::Evaluating, generation, Some(best_fitness.score));
            debug!(
                "Generation {}: best {:.2} (hard {}, soft {:.2})",
                generation, best_fitness.score, best_fitness.hard, best_fitness.soft
            );

            // B. Termination, first match wins
            if generation >= opts.max_generations {
                break Termination::MaxGenerations;
            }
            if best_fitness.hard == 0 && best_fitness.soft <= opts.acceptable_soft_penalty {
                break Termination::Converged;
            }
            if opts.stagnation_window.is_some_and(|w| stagnant >= w) {
                break Termination::Stagnated;
            }
            if self.cancel.is_cancelled() {
                break Termination::Cancelled;
            }
            if opts.max_time.is_some_and(|limit| start_time.elapsed() >= limit) {
                break Termination::DeadlineReached;
            }

            // C. Evolve
            emit(percent, Phase::Evolving, generation, Some(best_fitness.score));
            population = self.next_generation(&population, &mut rng);
            generation += 1;
        };

        let best = match best {
            Some(b) => b,
            None => {
                return Err(SlotForgeError::InsufficientData(
                    "population produced no scored individual".to_string(),
                ))
            }
        };
        let report = self.scorer.report(best.genes());
        let duration = start_time.elapsed();
        emit(100.0, Phase::Terminated, generation, Some(report.fitness.score));

        info!(
            "Search stopped ({}) after {} generations in {:.2?}: fitness {:.2}, {} hard violations",
            termination,
            generation,
            duration,
            report.fitness.score,
            report.fitness.hard
        );

        Ok(RunOutcome {
            best,
            report,
            generations: generation,
            termination,
            history,
            duration,
        })
    }

    /// Scores every unscored individual in parallel.
    fn evaluate(&self, population: &mut [Schedule]) {
        let scorer = &self.scorer;
        let work = |pop: &mut [Schedule]| {
            pop.par_iter_mut()
                .filter(|s| s.fitness.is_none())
                .for_each(|s| s.fitness = Some(scorer.evaluate(s.genes())));
        };
        match &self.pool {
            Some(pool) => pool.install(|| work(population)),
            None => work(population),
        }
    }

    fn next_generation(&self, population: &[Schedule], rng: &mut fastrand::Rng) -> Vec<Schedule> {
        let opts = &self.options;
        let size = opts.population_size;
        let mut next = Vec::with_capacity(size);

        // Elites carry over unchanged, fitness included.
        let mut ranked: Vec<usize> = (0..population.len()).collect();
        ranked.sort_by(|&a, &b| {
            population[a]
                .fitness_or_worst()
                .compare(&population[b].fitness_or_worst())
        });
        for &i in ranked.iter().take(opts.elite_count) {
            next.push(population[i].clone());
        }

        while next.len() < size {
            let a = tournament(population, opts.tournament_size, rng);
            let mut child = if size > 1 && rng.f64() < opts.crossover_rate {
                let b = tournament(population, opts.tournament_size, rng);
                crossover(
                    self.problem,
                    &population[a],
                    &population[b],
                    opts.crossover_strategy,
                    rng,
                )
            } else {
                population[a].clone()
            };
            mutate(self.problem, &mut child, opts.mutation_rate, rng);
            next.push(child);
        }
        next
    }
}
