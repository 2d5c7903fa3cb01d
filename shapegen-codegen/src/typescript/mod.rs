//! TypeScript code generation modules.
//!
//! One output file per entity: records become `export interface`
//! declarations preceded by their import lines, enums become
//! `export enum` declarations.

pub mod enums;
pub mod interfaces;

pub use enums::EnumGenerator;
pub use interfaces::InterfaceGenerator;

use crate::renderer::Renderer;
use shapegen_schema::ResolvedEntity;

/// Default indentation of generated members.
pub const DEFAULT_INDENT: &str = "  ";

/// TypeScript output options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeScriptOptions {
    /// Append `.ts` to import paths.
    pub add_ts_extension_to_imports: bool,
    /// Indentation of members.
    pub indent: String,
}

impl Default for TypeScriptOptions {
    fn default() -> Self {
        Self {
            add_ts_extension_to_imports: false,
            indent: DEFAULT_INDENT.to_string(),
        }
    }
}

impl TypeScriptOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether import paths carry the `.ts` extension.
    #[must_use]
    pub fn with_ts_extension(mut self, enabled: bool) -> Self {
        self.add_ts_extension_to_imports = enabled;
        self
    }

    /// Sets the member indentation.
    #[must_use]
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Formats the import line for an entity short name.
    #[must_use]
    pub fn import_line(&self, short_name: &str) -> String {
        let extension = if self.add_ts_extension_to_imports {
            ".ts"
        } else {
            ""
        };
        format!("import {{ {short_name} }} from './{short_name}{extension}';\n")
    }
}

/// Renders entities as TypeScript declarations.
#[derive(Debug, Clone, Default)]
pub struct TypeScriptRenderer {
    options: TypeScriptOptions,
}

impl TypeScriptRenderer {
    /// Creates a renderer with the given options.
    #[must_use]
    pub fn new(options: TypeScriptOptions) -> Self {
        Self { options }
    }

    /// Returns the output options.
    #[must_use]
    pub fn options(&self) -> &TypeScriptOptions {
        &self.options
    }
}

impl Renderer for TypeScriptRenderer {
    fn render(&self, entity: &ResolvedEntity) -> String {
        if entity.is_enum() {
            EnumGenerator::new(entity, &self.options).generate()
        } else {
            InterfaceGenerator::new(entity, &self.options).generate()
        }
    }
}

/// Formats documentation as a `/** ... */` block at the given indentation.
pub(crate) fn doc_block(doc: &str, indent: &str) -> String {
    let mut output = format!("{indent}/**\n");
    for line in doc.lines() {
        let line = line.replace("*/", "*\\/");
        if line.is_empty() {
            output.push_str(&format!("{indent} *\n"));
        } else {
            output.push_str(&format!("{indent} * {line}\n"));
        }
    }
    output.push_str(&format!("{indent} */\n"));
    output
}

/// Formats a single-quoted string literal.
pub(crate) fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
