//! `tuff` command-line entry point.
//!
//! Exit status is 0 when the input verifies, 1 when it is rejected with a
//! diagnostic, and 2 for usage or I/O failures.

mod check;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tuff_core::ErrorCode;

#[derive(Parser)]
#[command(name = "tuff")]
#[command(version, about = "Refinement and flow-sensitive safety verifier for Tuff")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and verify a Tuff source file
    Check(CheckArgs),

    /// Describe a diagnostic code, or list every code
    Explain {
        #[arg(value_name = "CODE")]
        code: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Tuff source file, or a JSON-encoded program with --ast
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Treat the input as a JSON AST (implied by a .json extension)
    #[arg(long)]
    pub ast: bool,

    /// Print the diagnostic as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Skip the safety proofs and match exhaustiveness
    #[arg(long, conflicts_with = "strict")]
    pub relaxed: bool,

    /// Force strict safety even when tuff.json disables it
    #[arg(long)]
    pub strict: bool,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn explain(code: Option<&str>) -> anyhow::Result<()> {
    match code {
        Some(code) => {
            let code: ErrorCode = code.parse()?;
            println!("{}: {}", code.as_str().bold(), code.summary());
        }
        None => {
            for code in ErrorCode::ALL {
                println!("{:<34} {}", code.as_str(), code.summary());
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Check(args) => check::run(args),
        Commands::Explain { code } => explain(code.as_deref()).map(|()| check::Outcome::Verified),
    };

    match result {
        Ok(check::Outcome::Verified) => ExitCode::SUCCESS,
        Ok(check::Outcome::Rejected) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}
