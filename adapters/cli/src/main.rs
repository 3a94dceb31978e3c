#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that simulates every case of a listing and reports
//! the completion day of each country.

mod report;

use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    str::FromStr,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use euro_diffusion_core::CaseOutcome;
use euro_diffusion_system_simulation::{Config, DiffusionScope, Simulation};
use log::LevelFilter;

/// Which cities keep sending coins once their country has completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ScopeArg {
    /// Every city disperses on every day.
    AllCities,
    /// Cities of completed countries stop dispersing.
    PendingCountries,
}

impl From<ScopeArg> for DiffusionScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::AllCities => DiffusionScope::AllCities,
            ScopeArg::PendingCountries => DiffusionScope::PendingCountries,
        }
    }
}

/// Rendering applied to the simulated outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Two ranked blocks per case.
    Text,
    /// Serialized outcomes, one array entry per case.
    Json,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Simulates coin diffusion across European cities")]
struct Args {
    /// Case listing to simulate
    #[arg(default_value = "input.txt")]
    input: PathBuf,

    /// Abort a case that has not completed after this many days.
    /// Without a cap, cases whose territories never touch run forever
    #[arg(long, value_name = "N")]
    max_days: Option<u32>,

    /// Which cities keep dispersing coins
    #[arg(long, value_enum, default_value_t = ScopeArg::AllCities)]
    scope: ScopeArg,

    /// Output rendering
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn config(&self) -> Config {
        Config::new(self.scope.into(), self.max_days)
    }
}

/// Entry point for the Euro Diffusion command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();

    let level = LevelFilter::from_str(&args.log_level).unwrap_or(LevelFilter::Warn);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    let listing = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let cases = euro_diffusion_input::parse_cases(&listing)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;

    let simulation = Simulation::new(args.config());
    let outcomes = cases
        .iter()
        .enumerate()
        .map(|(index, case)| {
            simulation
                .run(case)
                .with_context(|| format!("case {}", index + 1))
        })
        .collect::<Result<Vec<CaseOutcome>>>()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => report::write_text(&mut out, &outcomes)?,
        OutputFormat::Json => report::write_json(&mut out, &outcomes)?,
    }
    out.flush().context("failed to flush standard output")?;
    Ok(())
}
