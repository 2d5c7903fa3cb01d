//! Enum generation.

use super::{TypeScriptOptions, doc_block, string_literal};
use shapegen_schema::mapper::property_key;
use shapegen_schema::{EnumValue, ResolvedEntity};

/// Generator for `export enum` declarations.
pub struct EnumGenerator<'a> {
    entity: &'a ResolvedEntity,
    options: &'a TypeScriptOptions,
}

impl<'a> EnumGenerator<'a> {
    /// Creates a new enum generator.
    #[must_use]
    pub fn new(entity: &'a ResolvedEntity, options: &'a TypeScriptOptions) -> Self {
        Self { entity, options }
    }

    /// Generates the enum declaration.
    ///
    /// String values are single-quoted, integer values are emitted bare.
    #[must_use]
    pub fn generate(&self) -> String {
        let indent = &self.options.indent;
        let mut output = String::new();

        if let Some(doc) = &self.entity.doc {
            output.push_str(&doc_block(doc, ""));
        }
        output.push_str(&format!("export enum {} {{\n", self.entity.short_name));

        let count = self.entity.enum_members.len();
        for (i, member) in self.entity.enum_members.iter().enumerate() {
            let value = match &member.value {
                EnumValue::String(s) => string_literal(s),
                EnumValue::Int(n) => n.to_string(),
            };
            let separator = if i + 1 < count { "," } else { "" };
            output.push_str(&format!(
                "{indent}{} = {value}{separator}\n",
                property_key(&member.name)
            ));
        }

        output.push_str("}\n");
        output
    }
}
