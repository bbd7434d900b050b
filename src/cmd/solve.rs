use crate::reports;
use clap::{ArgMatches, Args};
use slotforge::config::Settings;
use slotforge::optimizer::{ChannelProgress, Phase};
use slotforge::{optimize, Dataset, SfResult};
use std::fs;
use std::path::PathBuf;
use std::thread;

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    /// Dataset JSON (teachers, classrooms, courses, config, settings).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Write the full run result as JSON.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Skip the timetable table.
    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    #[command(flatten)]
    pub settings: Settings,
}

pub fn run(args: SolveArgs, matches: Option<&ArgMatches>) -> SfResult<bool> {
    println!("📂 Loading dataset: {}", args.input.display());
    let dataset = Dataset::load_from_file(&args.input)?;

    // File settings are the base; typed flags win.
    let mut settings = dataset.settings.clone();
    match matches {
        Some(m) => settings.merge_from_cli(&args.settings, m),
        None => settings = args.settings.clone(),
    }

    println!(
        "🧬 Population {} | Generations {} | Goals {}",
        settings.population_size,
        settings.max_generations,
        settings.optimization_goals.join(",")
    );

    // Progress lines are printed off the search thread.
    let (progress, rx) = ChannelProgress::new();
    let printer = thread::spawn(move || {
        let mut last_decile = None;
        for event in rx {
            if event.phase != Phase::Evaluating {
                continue;
            }
            let decile = (event.percent / 10.0) as u32;
            if last_decile != Some(decile) {
                last_decile = Some(decile);
                println!(
                    "   [{:>3.0}%] gen {:>5}  best {:.2}",
                    event.percent,
                    event.generation,
                    event.best_fitness.unwrap_or(f64::NAN)
                );
            }
        }
    });

    let result = optimize(
        &dataset.teachers,
        &dataset.classrooms,
        &dataset.courses,
        &settings,
        &dataset.config,
        Some(&progress),
    );
    drop(progress);
    let _ = printer.join();
    let result = result?;

    reports::print_run_summary(&result);
    if !args.quiet {
        reports::print_timetable(&result.schedule);
    }
    reports::print_fitness_report(&result.report);

    if let Some(path) = &args.out {
        fs::write(path, serde_json::to_string_pretty(&result)?)?;
        println!("💾 Result written to {}", path.display());
    }

    Ok(result.success)
}
