pub mod crossover;
pub mod initialization;
pub mod mutation;
pub mod runner;
pub mod selection;

pub use self::runner::{
    CancelToken, ChannelProgress, OptimizationOptions, Optimizer, Phase, ProgressCallback,
    ProgressEvent, RunOutcome, Termination,
};
