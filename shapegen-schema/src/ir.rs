//! Intermediate representation for code generation.
//!
//! This module resolves each entity into rendered field tokens and the set
//! of other entities it references, which is all the code generators and
//! the dependency closure need.

use crate::annotation::{self, ParseWarning, TypeNode};
use crate::mapper;
use crate::types::{EntityDescriptor, EntityKind, EnumBacking, EnumMember, FieldDescriptor};
use indexmap::IndexMap;

/// Insertion-ordered, deduplicated set of referenced entities.
///
/// Keyed by short name; each entry keeps the reference as first written
/// so qualified references can still be resolved exactly. A later
/// reference with the same short name but a different qualified form is
/// kept aside as shadowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    entries: IndexMap<String, String>,
    shadowed: Vec<String>,
}

impl DependencySet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reference. Returns false if its short name was already present.
    pub fn insert(&mut self, reference: &str) -> bool {
        let short = mapper::short_name(reference).to_string();
        let written = mapper::normalize_qualified(reference);
        match self.entries.get(&short) {
            Some(existing) => {
                if *existing != written && !self.shadowed.contains(&written) {
                    tracing::debug!(
                        short_name = %short,
                        kept = %existing,
                        shadowed = %written,
                        "dependency shares a short name with an earlier one"
                    );
                    self.shadowed.push(written);
                }
                false
            }
            None => {
                self.entries.insert(short, written);
                true
            }
        }
    }

    /// Returns true if the short name is present.
    #[must_use]
    pub fn contains(&self, short_name: &str) -> bool {
        self.entries.contains_key(short_name)
    }

    /// Returns the reference kept for a short name.
    #[must_use]
    pub fn get(&self, short_name: &str) -> Option<&str> {
        self.entries.get(short_name).map(String::as_str)
    }

    /// Returns the number of dependencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no dependencies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates short names in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates `(short name, reference as written)` pairs in discovery order.
    pub fn references(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(short, written)| (short.as_str(), written.as_str()))
    }

    /// References dropped because their short name was already taken.
    #[must_use]
    pub fn shadowed(&self) -> &[String] {
        &self.shadowed
    }
}

/// Field with its type parsed and rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    /// Field name.
    pub name: String,
    /// Parsed type with signature nullability folded in.
    pub type_node: TypeNode,
    /// Rendered TypeScript type token.
    pub ts_type: String,
    /// Cleaned documentation text.
    pub doc: Option<String>,
}

impl ResolvedField {
    /// Resolves a field descriptor.
    ///
    /// The annotation wins over the declared type. Nullability coming from
    /// the signature is applied exactly once, so `?string` with a
    /// `string|null` annotation renders as `string | null`.
    #[must_use]
    pub fn from_field(field: &FieldDescriptor) -> (Self, Vec<ParseWarning>) {
        let parsed = annotation::parse_with_diagnostics(field.type_source());
        let mut node = parsed.node;
        if field.is_nullable_by_signature && !node.is_nullable() {
            node = TypeNode::nullable(node);
        }

        let resolved = Self {
            name: field.name.clone(),
            ts_type: node.to_typescript(),
            type_node: node,
            doc: field.doc.clone(),
        };
        (resolved, parsed.warnings)
    }
}

/// Entity ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntity {
    /// Short name.
    pub short_name: String,
    /// Namespace-qualified name.
    pub qualified_name: String,
    /// Entity kind.
    pub kind: EntityKind,
    /// Non-excluded fields in declaration order.
    pub fields: Vec<ResolvedField>,
    /// Enum cases, unchanged.
    pub enum_members: Vec<EnumMember>,
    /// Enum backing type.
    pub enum_backing: Option<EnumBacking>,
    /// Cleaned entity documentation.
    pub doc: Option<String>,
    /// Other entities referenced by the fields.
    pub dependencies: DependencySet,
    /// Annotation warnings, tagged with the field they came from.
    pub warnings: Vec<(String, ParseWarning)>,
}

impl ResolvedEntity {
    /// Resolves an entity descriptor.
    #[must_use]
    pub fn from_entity(entity: &EntityDescriptor) -> Self {
        let mut resolved = Self {
            short_name: entity.short_name.clone(),
            qualified_name: entity.qualified_name.clone(),
            kind: entity.kind,
            fields: Vec::new(),
            enum_members: entity.enum_members.clone(),
            enum_backing: entity.enum_backing,
            doc: entity.doc_summary.clone(),
            dependencies: DependencySet::new(),
            warnings: Vec::new(),
        };

        if entity.is_enum() {
            return resolved;
        }

        for field in entity.fields.iter().filter(|f| !f.is_excluded) {
            let (field_ir, warnings) = ResolvedField::from_field(field);

            field_ir.type_node.for_each_named(&mut |name| {
                if mapper::is_builtin(name) || is_self_reference(name, entity) {
                    return;
                }
                resolved.dependencies.insert(name);
            });

            for warning in warnings {
                tracing::debug!(
                    entity = %entity.qualified_name,
                    field = %field.name,
                    %warning,
                    "annotation warning"
                );
                resolved.warnings.push((field.name.clone(), warning));
            }

            resolved.fields.push(field_ir);
        }

        resolved
    }

    /// Returns the namespace part of the qualified name.
    #[must_use]
    pub fn namespace(&self) -> &str {
        mapper::namespace_of(&self.qualified_name)
    }

    /// Returns true if this entity is an enum.
    #[must_use]
    pub const fn is_enum(&self) -> bool {
        matches!(self.kind, EntityKind::Enum)
    }

    /// Returns the short names to import, in discovery order.
    ///
    /// A dependency sharing this entity's short name is never imported.
    pub fn imports(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(move |short| *short != self.short_name)
    }

    /// Gets a resolved field by name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Qualified references match the whole name; short ones match the short name.
fn is_self_reference(name: &str, entity: &EntityDescriptor) -> bool {
    if mapper::is_qualified(name) {
        mapper::normalize_qualified(name) == entity.qualified_name
    } else {
        mapper::short_name(name) == entity.short_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnumValue;

    fn user_entity() -> EntityDescriptor {
        let mut entity = EntityDescriptor::record("App\\Dto\\UserDTO");
        entity.add_field(FieldDescriptor::new("id", "int"));
        entity.add_field(FieldDescriptor::new("email", "?string"));
        entity.add_field(FieldDescriptor::new("address", "App\\Dto\\AddressDTO"));
        entity.add_field(FieldDescriptor::new("tags", "array").with_annotation("array<string>"));
        entity.add_field(
            FieldDescriptor::new("roles", "array").with_annotation("array<string, RoleEnum>"),
        );
        entity.add_field(FieldDescriptor::new("secret", "OtherDTO").excluded());
        entity
    }

    #[test]
    fn test_resolved_entity_fields() {
        let resolved = ResolvedEntity::from_entity(&user_entity());
        let tokens: Vec<_> = resolved
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.ts_type.as_str()))
            .collect();
        assert_eq!(
            tokens,
            [
                ("id", "number"),
                ("email", "string | null"),
                ("address", "AddressDTO"),
                ("tags", "string[]"),
                ("roles", "Record<string, RoleEnum>"),
            ]
        );
        assert!(resolved.get_field("secret").is_none());
    }

    #[test]
    fn test_dependencies_skip_excluded_and_builtins() {
        let resolved = ResolvedEntity::from_entity(&user_entity());
        let deps: Vec<_> = resolved.dependencies.iter().collect();
        assert_eq!(deps, ["AddressDTO", "RoleEnum"]);

        let references: Vec<_> = resolved.dependencies.references().collect();
        assert_eq!(references[0], ("AddressDTO", "App\\Dto\\AddressDTO"));
        assert_eq!(references[1], ("RoleEnum", "RoleEnum"));
    }

    #[test]
    fn test_dependencies_nested_record() {
        let mut entity = EntityDescriptor::record("App\\Order");
        entity.add_field(
            FieldDescriptor::new("payload", "array")
                .with_annotation("array{customer: CustomerDTO, lines: LineDTO[], at: \\DateTimeImmutable}"),
        );
        entity.add_field(FieldDescriptor::new("again", "CustomerDTO"));
        entity.add_field(FieldDescriptor::new("parent", "?Order"));

        let resolved = ResolvedEntity::from_entity(&entity);
        let deps: Vec<_> = resolved.imports().collect();
        assert_eq!(deps, ["CustomerDTO", "LineDTO"]);
        assert_eq!(
            resolved.fields[0].ts_type,
            "{ customer: CustomerDTO; lines: LineDTO[]; at: string }"
        );
        assert_eq!(resolved.fields[2].ts_type, "Order | null");
    }

    #[test]
    fn test_nested_shaped_record_has_no_dependencies() {
        let mut entity = EntityDescriptor::record("App\\Payload");
        entity.add_field(FieldDescriptor::new("data", "array").with_annotation(
            "array{user: array{id: int, name: string}, meta: array{created: string}}",
        ));
        let resolved = ResolvedEntity::from_entity(&entity);
        assert!(resolved.dependencies.is_empty());
        assert_eq!(
            resolved.fields[0].ts_type,
            "{ user: { id: number; name: string }; meta: { created: string } }"
        );
    }

    #[test]
    fn test_nullability_applied_once() {
        let mut entity = EntityDescriptor::record("App\\Profile");
        entity.add_field(
            FieldDescriptor::new("email", "?string").with_annotation("string|null"),
        );
        entity.add_field(FieldDescriptor::new("nick", "string").nullable());
        entity.add_field(FieldDescriptor::new("extra", "mixed").nullable());

        let resolved = ResolvedEntity::from_entity(&entity);
        assert_eq!(resolved.fields[0].ts_type, "string | null");
        assert_eq!(resolved.fields[1].ts_type, "string | null");
        assert_eq!(resolved.fields[2].ts_type, "any");
    }

    #[test]
    fn test_annotation_overrides_declared_type() {
        let mut entity = EntityDescriptor::record("App\\Cart");
        entity.add_field(FieldDescriptor::new("items", "array").with_annotation("ItemDTO[]"));
        let resolved = ResolvedEntity::from_entity(&entity);
        assert_eq!(resolved.fields[0].ts_type, "ItemDTO[]");
        assert!(resolved.dependencies.contains("ItemDTO"));
    }

    #[test]
    fn test_malformed_annotation_recorded() {
        let mut entity = EntityDescriptor::record("App\\Broken");
        entity.add_field(FieldDescriptor::new("data", "array").with_annotation("array{id: int"));
        let resolved = ResolvedEntity::from_entity(&entity);
        assert_eq!(resolved.fields[0].ts_type, "any");
        assert_eq!(resolved.warnings.len(), 1);
        assert_eq!(resolved.warnings[0].0, "data");
        assert!(matches!(
            resolved.warnings[0].1,
            ParseWarning::Malformed { .. }
        ));
    }

    #[test]
    fn test_enum_has_no_dependencies() {
        let mut entity = EntityDescriptor::enumeration("App\\RoleEnum", Some(EnumBacking::String));
        entity.add_member(EnumMember::new("ADMIN", EnumValue::String("admin".into())));
        entity.add_field(FieldDescriptor::new("ignored", "OtherDTO"));

        let resolved = ResolvedEntity::from_entity(&entity);
        assert!(resolved.is_enum());
        assert!(resolved.dependencies.is_empty());
        assert!(resolved.fields.is_empty());
        assert_eq!(resolved.enum_members.len(), 1);
        assert_eq!(resolved.namespace(), "App");
    }

    #[test]
    fn test_dependency_set_dedupes_by_short_name() {
        let mut set = DependencySet::new();
        assert!(set.insert("App\\A\\User"));
        assert!(!set.insert("App\\B\\User"));
        assert!(!set.insert("\\App\\A\\User"));
        assert!(!set.insert("App\\B\\User"));
        assert!(set.insert("Role"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.references().next(), Some(("User", "App\\A\\User")));
        assert_eq!(set.get("User"), Some("App\\A\\User"));
        assert_eq!(set.shadowed(), ["App\\B\\User"]);
    }

    #[test]
    fn test_same_short_name_in_other_namespace_is_a_dependency() {
        let mut entity = EntityDescriptor::record("App\\A\\Item");
        entity.add_field(FieldDescriptor::new("other", "App\\B\\Item"));
        entity.add_field(FieldDescriptor::new("parent", "?App\\A\\Item"));
        entity.add_field(FieldDescriptor::new("sibling", "Item"));

        let resolved = ResolvedEntity::from_entity(&entity);
        let references: Vec<_> = resolved.dependencies.references().collect();
        assert_eq!(references, [("Item", "App\\B\\Item")]);
        assert_eq!(resolved.imports().count(), 0);
        assert_eq!(resolved.fields[0].ts_type, "Item");
    }

    #[test]
    fn test_pseudo_types_are_not_dependencies() {
        let mut entity = EntityDescriptor::record("App\\Index");
        entity.add_field(
            FieldDescriptor::new("map", "array").with_annotation("array<array-key, class-string>"),
        );
        let resolved = ResolvedEntity::from_entity(&entity);
        assert!(resolved.dependencies.is_empty());
        assert_eq!(resolved.fields[0].ts_type, "Record<string | number, string>");
    }
}
