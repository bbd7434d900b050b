pub mod api;
pub mod config;
pub mod error;
pub mod grid;
pub mod models;
pub mod optimizer;
pub mod problem;
pub mod schedule;
pub mod scorer;
// cmd and reports belong to the binary (see main.rs).

pub use api::{optimize, optimize_with_cancel, Dataset, RunMetrics, RunResult, ScheduledSession};
pub use error::{SfResult, SlotForgeError};
