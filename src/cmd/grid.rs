use crate::reports;
use clap::Args;
use slotforge::config::SystemConfig;
use slotforge::grid::SlotGrid;
use slotforge::{Dataset, SfResult};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct GridArgs {
    /// Dataset whose working hours to use. Defaults apply when omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

pub fn run(args: GridArgs) -> SfResult<()> {
    let config = match &args.input {
        Some(path) => Dataset::load_from_file(path)?.config,
        None => SystemConfig::default(),
    };
    let grid = SlotGrid::build(&config.working_hours)?;
    reports::print_grid(&grid);
    Ok(())
}
