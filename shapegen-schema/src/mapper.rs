//! Mapping of source type names to TypeScript type tokens.
//!
//! Primitive names go through a fixed table; anything else is treated as a
//! reference to another entity and rendered by its short name.

use crate::annotation::{RecordEntry, TypeNode};

/// Characters accepted as namespace separators in qualified names.
pub const NAMESPACE_SEPARATORS: [char; 2] = ['\\', '.'];

/// Canonical separator used in normalized qualified names.
pub const CANONICAL_SEPARATOR: char = '\\';

/// The universal TypeScript type token.
pub const ANY: &str = "any";

/// Marker that identifies date/time classes.
const DATE_TIME_MARKER: &str = "DateTime";

/// Fixed set of primitive types understood by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `string`.
    String,
    /// `int` / `integer`.
    Integer,
    /// `float` / `double`.
    Float,
    /// `bool` / `boolean`.
    Boolean,
    /// `mixed` / `object` and the malformed-input fallback.
    Any,
    /// `void`.
    Void,
    /// `null`.
    Null,
    /// `array` without an item type.
    UntypedArray,
    /// `array-key`, the key type of untyped collections.
    ArrayKey,
}

impl Primitive {
    /// Looks up a source type name in the primitive table.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" | "class-string" | "non-empty-string" | "numeric-string"
            | "literal-string" | "lowercase-string" | "callable-string" => Some(Self::String),
            "int" | "integer" | "positive-int" | "negative-int" | "non-negative-int"
            | "non-positive-int" | "non-zero-int" => Some(Self::Integer),
            "float" | "double" => Some(Self::Float),
            "bool" | "boolean" => Some(Self::Boolean),
            "mixed" | "object" => Some(Self::Any),
            "void" => Some(Self::Void),
            "null" => Some(Self::Null),
            "array" => Some(Self::UntypedArray),
            "array-key" => Some(Self::ArrayKey),
            _ => None,
        }
    }

    /// Returns the TypeScript token for this primitive.
    #[must_use]
    pub const fn ts_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer | Self::Float => "number",
            Self::Boolean => "boolean",
            Self::Any => ANY,
            Self::Void => "void",
            Self::Null => "null",
            Self::UntypedArray => "any[]",
            Self::ArrayKey => "string | number",
        }
    }
}

/// Returns true if the name denotes a date/time class.
#[must_use]
pub fn is_date_time(name: &str) -> bool {
    name.contains(DATE_TIME_MARKER)
}

/// Returns true if the name is a primitive or otherwise never an entity reference.
#[must_use]
pub fn is_builtin(name: &str) -> bool {
    let name = name.trim().trim_start_matches(NAMESPACE_SEPARATORS);
    Primitive::from_name(name).is_some() || is_date_time(name)
}

/// Maps a primitive or named source type to a TypeScript token.
///
/// Unknown names are assumed to reference another entity and are returned
/// in their short form.
#[must_use]
pub fn map_primitive(name: &str) -> String {
    let name = name.trim();
    if is_date_time(name) {
        return Primitive::String.ts_type().to_string();
    }
    match Primitive::from_name(name) {
        Some(primitive) => primitive.ts_type().to_string(),
        None => short_name(name).to_string(),
    }
}

/// Appends the nullable union marker to a token.
///
/// Idempotent, and `any` (as well as `null` itself) is returned unchanged.
#[must_use]
pub fn wrap_nullable(token: &str) -> String {
    let token = token.trim();
    if token == ANY || has_null_member(token) {
        return token.to_string();
    }
    format!("{token} | null")
}

/// Returns true if the token is a union with a `null` member at top level.
fn has_null_member(token: &str) -> bool {
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in token.char_indices() {
        match c {
            '{' | '<' | '(' | '[' => depth += 1,
            '}' | '>' | ')' | ']' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                if token[start..i].trim() == "null" {
                    return true;
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    token[start..].trim() == "null"
}

/// Renders a type node as a TypeScript type expression.
#[must_use]
pub fn render_type(node: &TypeNode) -> String {
    match node {
        TypeNode::Primitive(primitive) => primitive.ts_type().to_string(),
        TypeNode::Named(name) => map_primitive(name),
        TypeNode::Array(item) => match item.as_ref() {
            TypeNode::Nullable(_)
            | TypeNode::Union(_)
            | TypeNode::Primitive(Primitive::ArrayKey) => format!("({})[]", render_type(item)),
            _ => format!("{}[]", render_type(item)),
        },
        TypeNode::Dictionary(key, value) => {
            format!("Record<{}, {}>", render_type(key), render_type(value))
        }
        TypeNode::Record(entries) => render_record(entries),
        TypeNode::Nullable(inner) => wrap_nullable(&render_type(inner)),
        TypeNode::Union(members) => members
            .iter()
            .map(render_type)
            .collect::<Vec<_>>()
            .join(" | "),
    }
}

fn render_record(entries: &[RecordEntry]) -> String {
    if entries.is_empty() {
        return "{}".to_string();
    }
    let body = entries
        .iter()
        .map(|entry| {
            format!(
                "{}{}: {}",
                property_key(&entry.key),
                if entry.optional { "?" } else { "" },
                render_type(&entry.ty)
            )
        })
        .collect::<Vec<_>>()
        .join("; ");
    format!("{{ {body} }}")
}

/// Quotes a property key unless it is a valid identifier or an integer.
#[must_use]
pub fn property_key(key: &str) -> String {
    let is_identifier = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    let is_index = !key.is_empty() && key.chars().all(|c| c.is_ascii_digit());
    if is_identifier || is_index {
        key.to_string()
    } else {
        format!("'{}'", key.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

/// Returns the identifier after the last namespace separator.
#[must_use]
pub fn short_name(name: &str) -> &str {
    let name = name.trim();
    match name.rfind(NAMESPACE_SEPARATORS) {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Returns the namespace part of a qualified name (empty when global).
#[must_use]
pub fn namespace_of(name: &str) -> &str {
    let name = name.trim().trim_start_matches(NAMESPACE_SEPARATORS);
    match name.rfind(NAMESPACE_SEPARATORS) {
        Some(idx) => &name[..idx],
        None => "",
    }
}

/// Normalizes a qualified name: no leading separator, canonical separators.
#[must_use]
pub fn normalize_qualified(name: &str) -> String {
    name.trim()
        .trim_start_matches(NAMESPACE_SEPARATORS)
        .replace(NAMESPACE_SEPARATORS, "\\")
}

/// Returns true if the name carries a namespace.
#[must_use]
pub fn is_qualified(name: &str) -> bool {
    name.trim()
        .trim_start_matches(NAMESPACE_SEPARATORS)
        .contains(NAMESPACE_SEPARATORS)
}

/// Joins a namespace and a name into a normalized qualified name.
#[must_use]
pub fn join_namespace(namespace: &str, name: &str) -> String {
    let namespace = normalize_qualified(namespace);
    let name = normalize_qualified(name);
    if namespace.is_empty() {
        name
    } else {
        format!("{namespace}{CANONICAL_SEPARATOR}{name}")
    }
}
