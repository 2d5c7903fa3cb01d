//! Command-line argument definitions.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`].

use clap::Parser;
use std::path::PathBuf;

/// Generate TypeScript declarations from entity documents
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Entity document or directory; a namespace pattern when --base-dir is given
    #[arg(help = "Source file, directory, or namespace pattern (e.g. \"App\\Dto\\*\")")]
    pub source: String,

    /// Output directory for TypeScript files
    #[arg(short, long, default_value = "./types")]
    pub output: PathBuf,

    /// Do not generate referenced entities
    #[arg(long)]
    pub no_dependencies: bool,

    /// Add the .ts extension to import paths
    #[arg(long)]
    pub add_ts_extension_to_imports: bool,

    /// Base directory for namespace resolution; SOURCE becomes a namespace pattern
    #[arg(short, long)]
    pub base_dir: Option<PathBuf>,

    /// Namespace prefix mapped onto the base directory
    #[arg(short = 'p', long)]
    pub namespace_prefix: Option<String>,

    /// Log level used when RUST_LOG is not set (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
