//! Klass conformance driver
//!
//! Runs the built-in conformance suite against the object model and reports
//! each case as PASS or FAIL.

mod commands;
mod config;
mod conformance;
mod output;

use clap::{Parser, Subcommand};
use config::{ColorWhen, Config, OutputFormat, RunOverrides};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "klass")]
#[command(about = "Klass object model conformance runner", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the conformance suite
    Run {
        /// Only run cases whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
        /// Stop after the first failure
        #[arg(long)]
        fail_fast: bool,
        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Color output
        #[arg(long, value_enum)]
        color: Option<ColorWhen>,
        /// Config file (defaults to ./klass.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the conformance cases
    List,
}

fn install_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    install_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            filter,
            fail_fast,
            format,
            color,
            config,
        } => {
            let cwd = std::env::current_dir()?;
            let file = Config::load(config.as_deref(), &cwd)?;
            let run = file.run.merge(RunOverrides {
                filter,
                fail_fast,
                format,
                color,
            });

            if !commands::run::execute(&run)? {
                std::process::exit(1);
            }
        }

        Commands::List => commands::list::execute()?,
    }

    Ok(())
}
