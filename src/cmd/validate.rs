use crate::reports;
use clap::Args;
use slotforge::api::{load_schedule_rows, validate_schedule};
use slotforge::{Dataset, SfResult};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(short, long)]
    pub input: PathBuf,

    /// A result file written by `solve --out`.
    #[arg(short, long)]
    pub schedule: PathBuf,
}

pub fn run(args: ValidateArgs) -> SfResult<bool> {
    let dataset = Dataset::load_from_file(&args.input)?;
    let rows = load_schedule_rows(&args.schedule)?;

    println!("\n🔎 === SCHEDULE AUDIT === 🔎");
    println!("{} placements from {}", rows.len(), args.schedule.display());

    let report = validate_schedule(&dataset, &rows)?;
    reports::print_fitness_report(&report);

    if report.fitness.is_feasible() {
        println!("✅ No hard violations.");
    } else {
        println!(
            "❌ {} hard violation(s): {}",
            report.fitness.hard,
            report.hard.describe()
        );
    }
    Ok(report.fitness.is_feasible())
}
