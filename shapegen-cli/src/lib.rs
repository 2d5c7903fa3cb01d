//! CLI logic for shapegen.
//!
//! Resolves the requested entities, generates TypeScript for them and
//! writes one `<ShortName>.ts` file per generated entity.

mod args;

pub use args::Args;

use anyhow::{Context, bail};
use shapegen_codegen::{
    DirectoryLoader, EntityLoader, EntityRegistry, Generator, TypeScriptOptions,
};
use shapegen_schema::mapper;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extension of generated files.
const OUTPUT_EXTENSION: &str = "ts";

/// Outcome of one CLI run.
#[derive(Debug, Default)]
pub struct Summary {
    /// Files written, in generation order.
    pub written: Vec<PathBuf>,
    /// Per-entity failures; they do not abort the run.
    pub errors: Vec<String>,
}

/// Run the shapegen CLI application.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns an error when the output directory cannot be created, the
/// source does not exist, or a namespace pattern cannot be resolved.
/// Failures of individual entities are collected in the [`Summary`].
pub fn run(args: &Args) -> anyhow::Result<Summary> {
    fs::create_dir_all(&args.output).with_context(|| {
        format!(
            "failed to create output directory '{}'",
            args.output.display()
        )
    })?;

    let options = TypeScriptOptions::new().with_ts_extension(args.add_ts_extension_to_imports);

    if let Some(base_dir) = &args.base_dir {
        let prefix = args.namespace_prefix.as_deref().unwrap_or_default();
        let loader = DirectoryLoader::new(base_dir, prefix)?;
        let names = loader
            .expand_pattern(&args.source)
            .with_context(|| format!("failed to resolve namespace pattern '{}'", args.source))?;
        if names.is_empty() {
            warn!(pattern = %args.source, "no entities found for namespace pattern");
        }
        generate_all(&Generator::with_options(loader, options), &names, args)
    } else {
        let source = Path::new(&args.source);
        if !source.exists() {
            bail!("source path '{}' does not exist", source.display());
        }
        let registry = EntityRegistry::from_path(source)?;
        let names: Vec<String> = registry.iter().map(|e| e.qualified_name.clone()).collect();
        if names.is_empty() {
            warn!(source = %source.display(), "no entities found");
        }
        generate_all(&Generator::with_options(registry, options), &names, args)
    }
}

/// Generates every named entity, writing each short name at most once.
fn generate_all<L: EntityLoader>(
    generator: &Generator<L>,
    names: &[String],
    args: &Args,
) -> anyhow::Result<Summary> {
    let mut summary = Summary::default();
    let mut processed = HashSet::new();

    for name in names {
        info!(entity = %name, "generating");
        let outputs = if args.no_dependencies {
            generator
                .generate_one(name)
                .map(|text| vec![(mapper::short_name(name).to_string(), text)])
        } else {
            generator
                .generate_closure(name)
                .map(|result| result.outputs.into_iter().collect::<Vec<_>>())
        };

        let outputs = match outputs {
            Ok(outputs) => outputs,
            Err(err) => {
                warn!(entity = %name, error = %err, "generation failed");
                summary.errors.push(format!("Error processing {name}: {err}"));
                continue;
            }
        };

        for (short_name, text) in outputs {
            if !processed.insert(short_name.clone()) {
                debug!(entity = %short_name, "already written in this run");
                continue;
            }
            match write_output(&args.output, &short_name, &text) {
                Ok(path) => summary.written.push(path),
                Err(err) => summary
                    .errors
                    .push(format!("Error processing {name}: {err:#}")),
            }
        }
    }

    Ok(summary)
}

/// Writes one generated file.
fn write_output(dir: &Path, short_name: &str, text: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(format!("{short_name}.{OUTPUT_EXTENSION}"));
    fs::write(&path, text).with_context(|| format!("failed to write '{}'", path.display()))?;
    debug!(path = %path.display(), "wrote file");
    Ok(path)
}
