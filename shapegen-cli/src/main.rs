//! shapegen CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use shapegen_cli::Args;

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| {
            eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
            EnvFilter::new("warn")
        })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match shapegen_cli::run(&args) {
        Ok(summary) => {
            if !summary.written.is_empty() {
                info!(
                    count = summary.written.len(),
                    output = %args.output.display(),
                    "generated TypeScript files"
                );
                println!(
                    "Generated {} TypeScript file(s) in {}",
                    summary.written.len(),
                    args.output.display()
                );
            }
            if !summary.errors.is_empty() {
                warn!(count = summary.errors.len(), "some entities had errors");
                for err in &summary.errors {
                    eprintln!(" * {err}");
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
