//! weapp-pack - Mini-Program compiler.

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::process::ExitCode;

mod cache;
mod cli;
mod config;
mod emit;
mod logger;
mod orchestrator;
mod output;

use cli::Args;
use config::BuildConfig;
use orchestrator::Orchestrator;
use output::OutputFormatter;

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init_logger(args.verbose, args.quiet, args.no_color);

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    match run(args) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let project_dir = match &args.project {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().into_diagnostic()?,
    };

    let config = BuildConfig::load(&project_dir, &args)?;
    let report = Orchestrator::new(config).build()?;

    OutputFormatter::new(args.output, !args.no_color).print_report(&report);
    Ok(ExitCode::SUCCESS)
}
