//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```
//! use shapegen::prelude::*;
//! ```

// Entity model
pub use shapegen_schema::{
    DependencySet, EntityDescriptor, EntityKind, EnumBacking, EnumMember, EnumValue,
    FieldDescriptor, ResolvedEntity, ResolvedField,
};

// Annotations
pub use shapegen_schema::{ParseWarning, Primitive, RecordEntry, TypeNode, parse};
pub use shapegen_schema::mapper::{map_primitive, wrap_nullable};

// Errors
pub use shapegen_codegen::{CodegenError, LoadError};
pub use shapegen_schema::{ParseError, SchemaError};

// Generation
pub use shapegen_codegen::{
    DirectoryLoader, EntityLoader, EntityRegistry, GenerationResult, Generator, Renderer,
    TypeScriptOptions, TypeScriptRenderer,
};
