//! Entity type definitions.
//!
//! This module contains the data structures describing generatable units:
//! records with their fields, and enums with their cases.

use crate::mapper;

/// Kind of a generatable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityKind {
    /// Structural record (class with public fields).
    #[default]
    Record,
    /// Enumeration with literal cases.
    Enum,
}

impl EntityKind {
    /// Parses an entity kind from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "record" | "class" | "struct" => Some(Self::Record),
            "enum" => Some(Self::Enum),
            _ => None,
        }
    }
}

/// Backing type of an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumBacking {
    /// Cases carry string literals.
    String,
    /// Cases carry integer literals.
    Int,
}

impl EnumBacking {
    /// Parses an enum backing from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "string" => Some(Self::String),
            "int" | "integer" => Some(Self::Int),
            _ => None,
        }
    }
}

/// Literal value of an enum case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnumValue {
    /// String literal.
    String(String),
    /// Integer literal.
    Int(i64),
}

/// One case of an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// Case name.
    pub name: String,
    /// Literal value.
    pub value: EnumValue,
}

impl EnumMember {
    /// Creates a new enum member.
    #[must_use]
    pub fn new(name: impl Into<String>, value: EnumValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One field of a record entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Type name from the host signature (e.g. `array`, `?string`, `App\Dto\User`).
    pub declared_type: String,
    /// Docblock type expression, usually richer than the declared type.
    pub raw_annotation: Option<String>,
    /// Whether the host signature allows null.
    pub is_nullable_by_signature: bool,
    /// Whether the field carries an exclusion marker.
    pub is_excluded: bool,
    /// Cleaned documentation text.
    pub doc: Option<String>,
}

impl FieldDescriptor {
    /// Creates a new field descriptor with only a declared type.
    #[must_use]
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            raw_annotation: None,
            is_nullable_by_signature: false,
            is_excluded: false,
            doc: None,
        }
    }

    /// Sets the docblock annotation.
    #[must_use]
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.raw_annotation = Some(annotation.into());
        self
    }

    /// Marks the field as nullable by signature.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.is_nullable_by_signature = true;
        self
    }

    /// Marks the field as excluded.
    #[must_use]
    pub fn excluded(mut self) -> Self {
        self.is_excluded = true;
        self
    }

    /// Sets the field documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Returns the type source that wins: the annotation when present.
    #[must_use]
    pub fn type_source(&self) -> &str {
        match &self.raw_annotation {
            Some(annotation) if !annotation.trim().is_empty() => annotation,
            _ => &self.declared_type,
        }
    }
}

/// One generatable unit: a record or an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Short name (identifier after the last namespace separator).
    pub short_name: String,
    /// Namespace-qualified name.
    pub qualified_name: String,
    /// Entity kind.
    pub kind: EntityKind,
    /// Fields in declaration order (empty for enums).
    pub fields: Vec<FieldDescriptor>,
    /// Enum cases in declaration order (empty for records).
    pub enum_members: Vec<EnumMember>,
    /// Enum backing type, if any.
    pub enum_backing: Option<EnumBacking>,
    /// Cleaned entity documentation.
    pub doc_summary: Option<String>,
}

impl EntityDescriptor {
    /// Creates a new record entity from a qualified name.
    #[must_use]
    pub fn record(qualified_name: impl Into<String>) -> Self {
        Self::with_kind(qualified_name.into(), EntityKind::Record)
    }

    /// Creates a new enum entity from a qualified name.
    #[must_use]
    pub fn enumeration(qualified_name: impl Into<String>, backing: Option<EnumBacking>) -> Self {
        let mut entity = Self::with_kind(qualified_name.into(), EntityKind::Enum);
        entity.enum_backing = backing;
        entity
    }

    fn with_kind(qualified_name: String, kind: EntityKind) -> Self {
        let qualified_name = mapper::normalize_qualified(&qualified_name);
        Self {
            short_name: mapper::short_name(&qualified_name).to_string(),
            qualified_name,
            kind,
            fields: Vec::new(),
            enum_members: Vec::new(),
            enum_backing: None,
            doc_summary: None,
        }
    }

    /// Adds a field to the entity.
    pub fn add_field(&mut self, field: FieldDescriptor) {
        self.fields.push(field);
    }

    /// Adds an enum case to the entity.
    pub fn add_member(&mut self, member: EnumMember) {
        self.enum_members.push(member);
    }

    /// Returns the namespace part of the qualified name (empty when global).
    #[must_use]
    pub fn namespace(&self) -> &str {
        mapper::namespace_of(&self.qualified_name)
    }

    /// Returns true if this entity is an enum.
    #[must_use]
    pub const fn is_enum(&self) -> bool {
        matches!(self.kind, EntityKind::Enum)
    }
}
