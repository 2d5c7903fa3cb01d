//! # shapegen Schema
//!
//! Entity model and type-expression analysis.
//!
//! This crate provides:
//! - Entity and field descriptors for records and enums
//! - A recursive-descent parser for docblock type expressions
//! - Mapping of source primitives to TypeScript type tokens
//! - Docblock cleaning and `@var` / `@param` extraction
//! - XML entity document parsing and validation
//! - Per-entity dependency extraction for code generation

pub mod annotation;
pub mod docblock;
pub mod error;
pub mod ir;
pub mod mapper;
pub mod parser;
pub mod types;
pub mod validation;

pub use annotation::{ParseWarning, Parsed, RecordEntry, TypeNode, parse};
pub use error::{ParseError, SchemaError};
pub use mapper::Primitive;
pub use ir::{DependencySet, ResolvedEntity, ResolvedField};
pub use parser::parse_entities;
pub use types::{
    EntityDescriptor, EntityKind, EnumBacking, EnumMember, EnumValue, FieldDescriptor,
};
pub use validation::{validate_entities, validate_entity};
