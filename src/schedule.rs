use crate::error::{SfResult, SlotForgeError};
use crate::problem::Problem;
use crate::scorer::Fitness;

/// Placement of one session instance: when, where and by whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Assignment {
    pub session: usize,
    pub day: usize,
    pub start: usize,
    pub span: usize,
    pub room: usize,
    pub teacher: usize,
}

impl Assignment {
    /// One past the last period covered.
    pub fn end(&self) -> usize {
        self.start + self.span
    }

    pub fn overlaps(&self, other: &Assignment) -> bool {
        self.day == other.day && self.start < other.end() && other.start < self.end()
    }

    pub fn periods(&self) -> std::ops::Range<usize> {
        self.start..self.end()
    }
}

/// One candidate timetable. Gene `i` always places session instance `i`.
#[derive(Debug, Clone)]
pub struct Schedule {
    genes: Vec<Assignment>,
    pub fitness: Option<Fitness>,
}

impl Schedule {
    /// Wraps genes after checking they form a complete, well-shaped timetable.
    pub fn new(problem: &Problem, genes: Vec<Assignment>) -> SfResult<Schedule> {
        if genes.len() != problem.session_count() {
            return Err(SlotForgeError::Validation(format!(
                "schedule has {} placements for {} session instances",
                genes.len(),
                problem.session_count()
            )));
        }
        if let Some(i) = invalid_genes(problem, &genes).first() {
            return Err(SlotForgeError::Validation(format!(
                "placement {} is malformed: {:?}",
                i, genes[*i]
            )));
        }
        Ok(Schedule {
            genes,
            fitness: None,
        })
    }

    /// Skips validation. Callers guarantee the genes are well formed.
    pub(crate) fn from_genes(genes: Vec<Assignment>) -> Schedule {
        Schedule {
            genes,
            fitness: None,
        }
    }

    pub fn genes(&self) -> &[Assignment] {
        &self.genes
    }

    pub fn into_genes(self) -> Vec<Assignment> {
        self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Replaces a placement and drops the cached fitness.
    pub fn set_gene(&mut self, gene: Assignment) {
        let i = gene.session;
        self.genes[i] = gene;
        self.fitness = None;
    }

    pub fn fitness_or_worst(&self) -> Fitness {
        self.fitness.unwrap_or(Fitness::WORST)
    }
}

/// Indices of genes that are out of place, out of range, or have a span
/// the grid cannot hold.
pub fn invalid_genes(problem: &Problem, genes: &[Assignment]) -> Vec<usize> {
    genes
        .iter()
        .enumerate()
        .filter(|(i, g)| {
            g.session != *i
                || *i >= problem.session_count()
                || g.span != problem.sessions[*i].span
                || g.day >= problem.grid.day_count()
                || !problem.grid.fits(g.start, g.span)
                || g.room >= problem.classrooms.len()
                || g.teacher >= problem.teachers.len()
        })
        .map(|(i, _)| i)
        .collect()
}
