use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::process;
use tracing::Level;

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about = "Genetic course timetabling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for a timetable.
    Solve(cmd::solve::SolveArgs),
    /// Re-score a saved timetable against a dataset.
    Validate(cmd::validate::ValidateArgs),
    /// Print the slot grid derived from the working hours.
    Grid(cmd::grid::GridArgs),
}

fn main() {
    // 1. Parse raw matches (to tell typed flags from defaults)
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    // 2. Logging
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    // 3. Execute
    let outcome = match cli.command {
        Commands::Solve(args) => cmd::solve::run(args, matches.subcommand_matches("solve")),
        Commands::Validate(args) => cmd::validate::run(args),
        Commands::Grid(args) => cmd::grid::run(args).map(|_| true),
    };

    match outcome {
        Ok(true) => {}
        // Ran fine, but the timetable still has hard violations.
        Ok(false) => process::exit(2),
        Err(e) => {
            eprintln!("\n❌ {}", e);
            process::exit(1);
        }
    }
}
