//! The `tuff check` subcommand.

use crate::CheckArgs;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tracing::{debug, info};
use tuff_core::diagnostic::render_colored;
use tuff_core::{CheckOptions, Diagnostic, Program, TuffConfig, TuffError, TuffPipeline};

/// Result of a completed run. I/O and usage failures are `Err` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Verified,
    Rejected,
}

/// Options from the nearest `tuff.json`, then command-line overrides.
fn resolve_options(args: &CheckArgs) -> CheckOptions {
    let start = args
        .input
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut options = TuffConfig::discover(start).typecheck;
    if args.relaxed {
        options = CheckOptions::relaxed();
    } else if args.strict {
        options = CheckOptions::strict();
    }
    options
}

fn is_json_input(args: &CheckArgs) -> bool {
    args.ast || args.input.extension().is_some_and(|ext| ext == "json")
}

pub fn run(args: &CheckArgs) -> Result<Outcome> {
    let display_path = args.input.display().to_string();
    let source = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {display_path}"))?;

    let options = resolve_options(args);
    info!(file = %display_path, strict = options.strict_safety, "checking");
    let pipeline = TuffPipeline::new()
        .with_options(options)
        .with_file_path(display_path.as_str());

    let verdict = if is_json_input(args) {
        let program = Program::from_json(&source)
            .with_context(|| format!("{display_path} is not a valid JSON program"))?;
        debug!(items = program.body.len(), "decoded JSON AST");
        pipeline.check_program(program).map(|_| ())
    } else {
        pipeline.check(&source).map(|_| ())
    };

    match verdict {
        Ok(()) => {
            report_success(args, &display_path)?;
            Ok(Outcome::Verified)
        }
        Err(err) => {
            report_failure(args, &err, &source)?;
            Ok(Outcome::Rejected)
        }
    }
}

fn report_success(args: &CheckArgs, path: &str) -> Result<()> {
    if args.json {
        let value = serde_json::json!({ "status": "ok", "file": path });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{} {path}", "verified".green().bold());
    }
    Ok(())
}

fn report_failure(args: &CheckArgs, err: &TuffError, source: &str) -> Result<()> {
    debug!(code = %err.code, "verification failed");
    // JSON programs carry no text to excerpt.
    let source = (!is_json_input(args)).then_some(source);
    let diag = Diagnostic::from_error(err, source);
    if args.json {
        println!("{}", diag.to_json()?);
    } else {
        eprintln!("{}", render_colored(&diag));
    }
    Ok(())
}
