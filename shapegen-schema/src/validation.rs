//! Entity validation utilities.
//!
//! Structural checks only: names, duplicate fields and enum case
//! consistency. Type annotations are never rejected here; the annotation
//! parser degrades them instead.

use crate::error::SchemaError;
use crate::types::{EntityDescriptor, EnumBacking, EnumValue};
use std::collections::HashSet;

/// Validates a parsed entity for correctness.
///
/// # Arguments
/// * `entity` - The entity to validate
///
/// # Returns
/// Ok(()) if valid, or SchemaError describing the issue.
///
/// # Errors
/// Returns `SchemaError` if validation fails.
pub fn validate_entity(entity: &EntityDescriptor) -> Result<(), SchemaError> {
    if entity.short_name.trim().is_empty() {
        return Err(SchemaError::EmptyName {
            namespace: entity.namespace().to_string(),
        });
    }

    if entity.is_enum() {
        validate_enum(entity)
    } else {
        validate_fields(entity)
    }
}

/// Validates a batch of entities, rejecting duplicate qualified names.
///
/// # Errors
/// Returns the first `SchemaError` found.
pub fn validate_entities(entities: &[EntityDescriptor]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for entity in entities {
        validate_entity(entity)?;
        if !seen.insert(entity.qualified_name.as_str()) {
            return Err(SchemaError::Validation {
                message: format!("entity '{}' is defined twice", entity.qualified_name),
            });
        }
    }
    Ok(())
}

fn validate_fields(entity: &EntityDescriptor) -> Result<(), SchemaError> {
    let mut names = HashSet::new();
    for field in &entity.fields {
        if field.name.trim().is_empty() {
            return Err(SchemaError::Validation {
                message: format!("entity '{}' has a field without a name", entity.short_name),
            });
        }
        if !names.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                entity: entity.short_name.clone(),
                field: field.name.clone(),
            });
        }
    }
    Ok(())
}

fn validate_enum(entity: &EntityDescriptor) -> Result<(), SchemaError> {
    let mut names = HashSet::new();
    let mut values = HashSet::new();

    for member in &entity.enum_members {
        if member.name.trim().is_empty() {
            return Err(SchemaError::enum_case(
                &entity.short_name,
                &member.name,
                "case name is empty",
            ));
        }
        if !names.insert(member.name.as_str()) {
            return Err(SchemaError::enum_case(
                &entity.short_name,
                &member.name,
                "case name is declared twice",
            ));
        }

        let matches_backing = match (entity.enum_backing, &member.value) {
            (Some(EnumBacking::Int), EnumValue::Int(_))
            | (Some(EnumBacking::String) | None, EnumValue::String(_)) => true,
            _ => false,
        };
        if !matches_backing {
            return Err(SchemaError::enum_case(
                &entity.short_name,
                &member.name,
                "value does not match the enum backing type",
            ));
        }

        if !values.insert(&member.value) {
            return Err(SchemaError::enum_case(
                &entity.short_name,
                &member.name,
                "value is already used by another case",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_entities;
    use crate::types::{EnumMember, FieldDescriptor};

    #[test]
    fn test_validate_valid_entities() {
        let xml = r#"<entities namespace="App">
    <entity name="UserDTO"><field name="id" type="int"/></entity>
    <entity name="RoleEnum" kind="enum" backing="int">
        <case name="A">1</case>
        <case name="B">2</case>
    </entity>
</entities>"#;
        let entities = parse_entities(xml).expect("Failed to parse");
        assert!(validate_entities(&entities).is_ok());
    }

    #[test]
    fn test_validate_duplicate_field() {
        let mut entity = EntityDescriptor::record("App\\UserDTO");
        entity.add_field(FieldDescriptor::new("id", "int"));
        entity.add_field(FieldDescriptor::new("id", "string"));
        assert!(matches!(
            validate_entity(&entity),
            Err(SchemaError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_validate_empty_name() {
        let entity = EntityDescriptor::record("App\\");
        assert!(matches!(
            validate_entity(&entity),
            Err(SchemaError::EmptyName { .. })
        ));
    }

    #[test]
    fn test_validate_enum_duplicates() {
        let mut entity = EntityDescriptor::enumeration("App\\Role", Some(EnumBacking::String));
        entity.add_member(EnumMember::new("A", EnumValue::String("a".into())));
        entity.add_member(EnumMember::new("B", EnumValue::String("a".into())));
        assert!(matches!(
            validate_entity(&entity),
            Err(SchemaError::InvalidEnumCase { .. })
        ));

        let mut entity = EntityDescriptor::enumeration("App\\Role", None);
        entity.add_member(EnumMember::new("A", EnumValue::String("A".into())));
        entity.add_member(EnumMember::new("A", EnumValue::String("A".into())));
        assert!(validate_entity(&entity).is_err());
    }

    #[test]
    fn test_validate_enum_backing_mismatch() {
        let mut entity = EntityDescriptor::enumeration("App\\Level", Some(EnumBacking::Int));
        entity.add_member(EnumMember::new("LOW", EnumValue::String("low".into())));
        assert!(matches!(
            validate_entity(&entity),
            Err(SchemaError::InvalidEnumCase { .. })
        ));
    }

    #[test]
    fn test_validate_duplicate_entity() {
        let entities = vec![
            EntityDescriptor::record("App\\User"),
            EntityDescriptor::record("\\App\\User"),
        ];
        assert!(matches!(
            validate_entities(&entities),
            Err(SchemaError::Validation { .. })
        ));
    }
}
