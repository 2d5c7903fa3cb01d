//! Interface generation for record entities.

use super::{TypeScriptOptions, doc_block};
use shapegen_schema::ResolvedEntity;
use shapegen_schema::mapper::property_key;

/// Generator for `export interface` declarations.
pub struct InterfaceGenerator<'a> {
    entity: &'a ResolvedEntity,
    options: &'a TypeScriptOptions,
}

impl<'a> InterfaceGenerator<'a> {
    /// Creates a new interface generator.
    #[must_use]
    pub fn new(entity: &'a ResolvedEntity, options: &'a TypeScriptOptions) -> Self {
        Self { entity, options }
    }

    /// Generates the full file: imports, documentation and declaration.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = self.generate_imports();
        if !output.is_empty() {
            output.push('\n');
        }

        if let Some(doc) = &self.entity.doc {
            output.push_str(&doc_block(doc, ""));
        }
        output.push_str(&format!("export interface {} {{\n", self.entity.short_name));
        output.push_str(&self.generate_fields());
        output.push_str("}\n");

        output
    }

    /// Generates one import line per dependency.
    fn generate_imports(&self) -> String {
        self.entity
            .imports()
            .map(|name| self.options.import_line(name))
            .collect()
    }

    /// Generates the member list.
    fn generate_fields(&self) -> String {
        let indent = &self.options.indent;
        let mut output = String::new();

        for field in &self.entity.fields {
            if let Some(doc) = &field.doc {
                output.push_str(&doc_block(doc, indent));
            }
            output.push_str(&format!(
                "{indent}{}: {};\n",
                property_key(&field.name),
                field.ts_type
            ));
        }

        output
    }
}
