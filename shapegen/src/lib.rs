//! # shapegen
//!
//! Generate TypeScript declarations from annotated entity definitions.
//!
//! Entities (records with typed fields, and enums) are described in small
//! XML documents. Field types come from the declared type or, when present,
//! from a docblock annotation such as `array{id: int, name?: string}` or
//! `array<string, AddressDTO>`. Generation follows field references, so a
//! single root produces the whole graph of types it needs.
//!
//! ## Quick Start
//!
//! ```
//! use shapegen::prelude::*;
//!
//! let registry = EntityRegistry::from_xml(
//!     r#"<entities namespace="App\Dto">
//!         <entity name="UserDTO">
//!             <field name="email" type="?string"/>
//!             <field name="address" type="AddressDTO"/>
//!         </entity>
//!         <entity name="AddressDTO"><field name="city" type="string"/></entity>
//!     </entities>"#,
//! )?;
//!
//! let result = Generator::new(registry).generate_closure("App\\Dto\\UserDTO")?;
//! assert_eq!(result.len(), 2);
//! assert!(result.get("UserDTO").unwrap().contains("email: string | null;"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Organization
//!
//! - [`schema`] - Entity model, annotation parser, type mapper, XML documents
//! - [`codegen`] - Loaders, dependency closure, TypeScript generation

pub mod prelude;

/// Entity model, annotation parsing and type mapping.
pub mod schema {
    pub use shapegen_schema::*;
}

/// Loaders, dependency closure and TypeScript generation.
pub mod codegen {
    pub use shapegen_codegen::*;
}
