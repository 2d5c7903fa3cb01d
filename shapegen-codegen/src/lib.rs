//! # shapegen Codegen
//!
//! TypeScript generation from entity documents.
//!
//! This crate provides:
//! - Entity loaders (in-memory registry and directory tree)
//! - Breadth-first dependency closure over entity references
//! - Interface and enum generation
//! - A `Generator` entry point tying loaders and renderers together

pub mod closure;
pub mod error;
pub mod generator;
pub mod loader;
pub mod renderer;
pub mod typescript;

pub use closure::{Collision, GenerationResult};
pub use error::{CodegenError, LoadError};
pub use generator::Generator;
pub use loader::{DirectoryLoader, EntityLoader, EntityRegistry};
pub use renderer::Renderer;
pub use typescript::{TypeScriptOptions, TypeScriptRenderer};

/// Generates TypeScript for every entity in an entity document.
///
/// # Arguments
/// * `xml` - Entity document content
///
/// # Returns
/// Generated TypeScript keyed by entity short name.
///
/// # Errors
/// Returns `CodegenError` if parsing, validation, or generation fails.
pub fn generate_from_xml(xml: &str) -> Result<GenerationResult, CodegenError> {
    let entities = shapegen_schema::parse_entities(xml)?;
    shapegen_schema::validate_entities(&entities)?;

    let names: Vec<String> = entities.iter().map(|e| e.qualified_name.clone()).collect();
    let mut registry = EntityRegistry::new();
    registry.extend(entities);

    let generator = Generator::new(registry);
    let mut result = GenerationResult::default();
    for name in &names {
        let closure = generator.generate_closure(name)?;
        for (short, output) in closure.outputs {
            result.outputs.entry(short).or_insert(output);
        }
        for unresolved in closure.unresolved {
            if !result.unresolved.contains(&unresolved) {
                result.unresolved.push(unresolved);
            }
        }
        for collision in closure.collisions {
            if !result.collisions.contains(&collision) {
                result.collisions.push(collision);
            }
        }
    }
    Ok(result)
}

/// Generates TypeScript for every entity in an entity document file.
///
/// # Arguments
/// * `path` - Path to the entity document
///
/// # Returns
/// Generated TypeScript keyed by entity short name.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, or generation fails.
pub fn generate_from_file(path: &std::path::Path) -> Result<GenerationResult, CodegenError> {
    let xml = std::fs::read_to_string(path)?;
    generate_from_xml(&xml)
}
