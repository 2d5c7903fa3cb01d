//! Dependency closure.
//!
//! Starting from a root entity, renders every entity reachable through
//! field references, breadth first. Each entity is rendered once; cycles
//! terminate because entities are tracked by qualified name.

use crate::error::CodegenError;
use crate::loader::EntityLoader;
use crate::renderer::Renderer;
use indexmap::IndexMap;
use shapegen_schema::ResolvedEntity;
use shapegen_schema::mapper;
use std::collections::{HashSet, VecDeque};

/// Two entities that share a short name; only the first one is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    /// Shared short name.
    pub short_name: String,
    /// Qualified name of the rendered entity.
    pub kept: String,
    /// Qualified name of the entity that was skipped.
    pub skipped: String,
}

/// Outputs of one closure run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResult {
    /// Rendered text keyed by short name, in discovery order.
    pub outputs: IndexMap<String, String>,
    /// References that did not resolve to a known entity.
    pub unresolved: Vec<String>,
    /// Short-name collisions encountered.
    pub collisions: Vec<Collision>,
}

impl GenerationResult {
    /// Returns the output for a short name.
    #[must_use]
    pub fn get(&self, short_name: &str) -> Option<&str> {
        self.outputs.get(short_name).map(String::as_str)
    }

    /// Returns the number of rendered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns true if nothing was rendered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Iterates `(short name, output)` pairs in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outputs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Resolves and loads the root entity.
fn load_root<L: EntityLoader>(
    root: &str,
    loader: &L,
) -> Result<(String, ResolvedEntity), CodegenError> {
    let qualified = loader
        .resolve(root, "")
        .ok_or_else(|| CodegenError::not_found(root))?;
    let entity = loader.load(&qualified)?;
    Ok((qualified, ResolvedEntity::from_entity(&entity)))
}

/// Renders a single entity without following its dependencies.
///
/// # Errors
/// Returns `CodegenError::EntityNotFound` if the root does not resolve, or
/// `CodegenError::Load` if it cannot be loaded.
pub fn generate_one<L, R>(root: &str, loader: &L, renderer: &R) -> Result<String, CodegenError>
where
    L: EntityLoader,
    R: Renderer + ?Sized,
{
    let (_, entity) = load_root(root, loader)?;
    Ok(renderer.render(&entity))
}

/// Renders the root entity and everything it transitively references.
///
/// Unresolved references are skipped and recorded. When two entities
/// share a short name the first one discovered wins.
///
/// # Errors
/// Returns `CodegenError::EntityNotFound` if the root does not resolve, or
/// `CodegenError::Load` if any reachable entity fails to load.
pub fn generate_closure<L, R>(
    root: &str,
    loader: &L,
    renderer: &R,
) -> Result<GenerationResult, CodegenError>
where
    L: EntityLoader,
    R: Renderer + ?Sized,
{
    let mut result = GenerationResult::default();
    let mut owners: IndexMap<String, String> = IndexMap::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    let (root_name, root_entity) = load_root(root, loader)?;
    visited.insert(root_name.clone());
    queue.push_back((root_name, Some(root_entity)));

    while let Some((qualified, preloaded)) = queue.pop_front() {
        let short = mapper::short_name(&qualified).to_string();
        if let Some(kept) = owners.get(&short) {
            tracing::warn!(
                short_name = %short,
                kept = %kept,
                skipped = %qualified,
                "short name collision, skipping entity"
            );
            result.collisions.push(Collision {
                short_name: short,
                kept: kept.clone(),
                skipped: qualified,
            });
            continue;
        }

        let entity = match preloaded {
            Some(entity) => entity,
            None => ResolvedEntity::from_entity(&loader.load(&qualified)?),
        };

        for (dep_short, written) in entity.dependencies.references() {
            match loader.resolve(written, entity.namespace()) {
                Some(dep) => {
                    if visited.insert(dep.clone()) {
                        queue.push_back((dep, None));
                    }
                }
                None => {
                    tracing::debug!(
                        entity = %entity.qualified_name,
                        dependency = %written,
                        "skipping unresolved dependency"
                    );
                    if !result.unresolved.iter().any(|u| u == dep_short) {
                        result.unresolved.push(dep_short.to_string());
                    }
                }
            }
        }

        record_shadowed(&entity, loader, &mut result.collisions);

        result.outputs.insert(short.clone(), renderer.render(&entity));
        owners.insert(short, qualified);
    }

    Ok(result)
}

/// Records references that lost their short name to another one in the
/// same entity and so are never rendered from it.
fn record_shadowed<L: EntityLoader>(
    entity: &ResolvedEntity,
    loader: &L,
    collisions: &mut Vec<Collision>,
) {
    let namespace = entity.namespace();
    for written in entity.dependencies.shadowed() {
        let short_name = mapper::short_name(written);
        let Some(skipped) = loader.resolve(written, namespace) else {
            continue;
        };
        let kept_written = entity
            .dependencies
            .get(short_name)
            .unwrap_or(entity.qualified_name.as_str());
        let kept = loader
            .resolve(kept_written, namespace)
            .unwrap_or_else(|| kept_written.to_string());
        if kept == skipped {
            continue;
        }

        tracing::warn!(
            entity = %entity.qualified_name,
            short_name = %short_name,
            kept = %kept,
            skipped = %skipped,
            "short name collision within entity, skipping reference"
        );
        let collision = Collision {
            short_name: short_name.to_string(),
            kept,
            skipped,
        };
        if !collisions.contains(&collision) {
            collisions.push(collision);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::loader::EntityRegistry;
    use crate::typescript::TypeScriptRenderer;

    fn registry(xml: &str) -> EntityRegistry {
        EntityRegistry::from_xml(xml).expect("Failed to parse")
    }

    fn name_renderer(entity: &ResolvedEntity) -> String {
        entity.short_name.clone()
    }

    #[test]
    fn test_closure_follows_dependencies() {
        let loader = registry(
            r#"<entities namespace="App\Dto">
    <entity name="UserDTO">
        <field name="address" type="AddressDTO"/>
        <field name="tags" type="array" annotation="array&lt;string, TagDTO&gt;"/>
    </entity>
    <entity name="AddressDTO"><field name="country" type="CountryDTO"/></entity>
    <entity name="TagDTO"/>
    <entity name="CountryDTO"/>
</entities>"#,
        );
        let result = generate_closure("App\\Dto\\UserDTO", &loader, &name_renderer).unwrap();
        let keys: Vec<_> = result.outputs.keys().map(String::as_str).collect();
        assert_eq!(keys, ["UserDTO", "AddressDTO", "TagDTO", "CountryDTO"]);
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_closure_terminates_on_cycle() {
        let loader = registry(
            r#"<entities namespace="App">
    <entity name="A"><field name="b" type="array" annotation="B[]"/></entity>
    <entity name="B"><field name="a" type="?A"/></entity>
</entities>"#,
        );
        let result = generate_closure("App\\A", &loader, &TypeScriptRenderer::default()).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.get("A").unwrap().contains("b: B[];"));
        assert!(result.get("B").unwrap().contains("a: A | null;"));
    }

    #[test]
    fn test_closure_self_reference() {
        let loader = registry(
            r#"<entity name="Node" namespace="App"><field name="children" type="array" annotation="Node[]"/></entity>"#,
        );
        let result = generate_closure("Node", &loader, &TypeScriptRenderer::default()).unwrap();
        assert_eq!(result.len(), 1);
        let output = result.get("Node").unwrap();
        assert!(output.contains("children: Node[];"));
        assert!(!output.contains("import"));
    }

    #[test]
    fn test_closure_skips_unresolved() {
        let loader = registry(
            r#"<entity name="UserDTO" namespace="App"><field name="addresses" type="array" annotation="array&lt;AddressDTO&gt;"/></entity>"#,
        );
        let result =
            generate_closure("App\\UserDTO", &loader, &TypeScriptRenderer::default()).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.get("UserDTO").unwrap().contains("addresses: AddressDTO[];"));
        assert_eq!(result.unresolved, ["AddressDTO"]);
    }

    #[test]
    fn test_closure_short_name_collision() {
        let loader = registry(
            r#"<entities>
    <entity name="Root" namespace="App">
        <field name="a" type="App\A\Item"/>
        <field name="b" type="App\B\Holder"/>
    </entity>
    <entity name="Item" namespace="App\A"/>
    <entity name="Holder" namespace="App\B"><field name="item" type="Item"/></entity>
    <entity name="Item" namespace="App\B"/>
</entities>"#,
        );
        let result = generate_closure("App\\Root", &loader, &name_renderer).unwrap();
        let keys: Vec<_> = result.outputs.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Root", "Item", "Holder"]);
        assert_eq!(
            result.collisions,
            [Collision {
                short_name: "Item".into(),
                kept: "App\\A\\Item".into(),
                skipped: "App\\B\\Item".into(),
            }]
        );
    }

    #[test]
    fn test_closure_reference_to_same_short_name_in_other_namespace() {
        let loader = registry(
            r#"<entities>
    <entity name="Item" namespace="App\A"><field name="other" type="App\B\Item"/></entity>
    <entity name="Item" namespace="App\B"/>
</entities>"#,
        );
        let result =
            generate_closure("App\\A\\Item", &loader, &TypeScriptRenderer::default()).unwrap();
        assert_eq!(result.len(), 1);
        assert!(!result.get("Item").unwrap().contains("import"));
        assert_eq!(
            result.collisions,
            [Collision {
                short_name: "Item".into(),
                kept: "App\\A\\Item".into(),
                skipped: "App\\B\\Item".into(),
            }]
        );
    }

    #[test]
    fn test_closure_records_shadowed_reference() {
        let loader = registry(
            r#"<entities>
    <entity name="Root" namespace="App">
        <field name="first" type="App\A\Item"/>
        <field name="second" type="App\B\Item"/>
    </entity>
    <entity name="Item" namespace="App\A"/>
    <entity name="Item" namespace="App\B"/>
</entities>"#,
        );
        let result = generate_closure("App\\Root", &loader, &name_renderer).unwrap();
        let keys: Vec<_> = result.outputs.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Root", "Item"]);
        assert_eq!(
            result.collisions,
            [Collision {
                short_name: "Item".into(),
                kept: "App\\A\\Item".into(),
                skipped: "App\\B\\Item".into(),
            }]
        );
    }

    #[test]
    fn test_closure_rejects_invalid_entity() {
        let loader = registry(
            r#"<entities namespace="App">
    <entity name="Root"><field name="child" type="Child"/></entity>
    <entity name="Child"><field name="x" type="int"/><field name="x" type="string"/></entity>
</entities>"#,
        );
        assert!(matches!(
            generate_closure("App\\Root", &loader, &TypeScriptRenderer::default()),
            Err(CodegenError::Load(LoadError::Schema(_)))
        ));
    }

    #[test]
    fn test_closure_missing_root() {
        let loader = registry(r#"<entity name="A"/>"#);
        assert!(matches!(
            generate_closure("Missing", &loader, &name_renderer),
            Err(CodegenError::EntityNotFound { .. })
        ));
    }

    #[test]
    fn test_generate_one_ignores_dependencies() {
        let loader = registry(
            r#"<entities namespace="App">
    <entity name="A"><field name="b" type="B"/></entity>
    <entity name="B"/>
</entities>"#,
        );
        let output = generate_one("A", &loader, &TypeScriptRenderer::default()).unwrap();
        assert!(output.starts_with("import { B } from './B';\n"));
        assert!(output.contains("export interface A {"));
    }

    #[test]
    fn test_closure_enum_dependency() {
        let loader = registry(
            r#"<entities namespace="App">
    <entity name="Task"><field name="priority" type="PriorityEnum"/></entity>
    <entity name="PriorityEnum" kind="enum" backing="int"><case name="LOW">1</case></entity>
</entities>"#,
        );
        let result = generate_closure("Task", &loader, &TypeScriptRenderer::default()).unwrap();
        assert!(result.get("PriorityEnum").unwrap().contains("LOW = 1"));
    }
}
