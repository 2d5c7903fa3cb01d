//! Entity loaders.
//!
//! A loader turns a reference, as written in an annotation, into a
//! qualified name and then into an [`EntityDescriptor`]. Two loaders are
//! provided: an in-memory [`EntityRegistry`] and a [`DirectoryLoader`]
//! that maps namespaces onto a directory tree of entity documents.

use crate::error::LoadError;
use indexmap::IndexMap;
use shapegen_schema::mapper;
use shapegen_schema::{EntityDescriptor, parse_entities, validate_entity};
use std::path::{Path, PathBuf};

/// File extension of entity documents.
pub const ENTITY_EXTENSION: &str = "xml";

/// Source of entity descriptors.
pub trait EntityLoader {
    /// Resolves a reference to a qualified name.
    ///
    /// Qualified references are tried as written; short references are
    /// tried in `context_namespace`. Returns `None` when the reference
    /// does not name a known entity.
    fn resolve(&self, name: &str, context_namespace: &str) -> Option<String>;

    /// Loads the entity with the given qualified name.
    ///
    /// Loaded entities are validated before they are returned.
    ///
    /// # Errors
    /// Returns `LoadError` if the entity cannot be read or is invalid.
    fn load(&self, qualified_name: &str) -> Result<EntityDescriptor, LoadError>;
}

impl<L: EntityLoader + ?Sized> EntityLoader for &L {
    fn resolve(&self, name: &str, context_namespace: &str) -> Option<String> {
        (**self).resolve(name, context_namespace)
    }

    fn load(&self, qualified_name: &str) -> Result<EntityDescriptor, LoadError> {
        (**self).load(qualified_name)
    }
}

/// Candidate qualified names for a reference, most specific first.
fn candidates(name: &str, context_namespace: &str) -> Vec<String> {
    if mapper::is_qualified(name) || context_namespace.is_empty() {
        vec![mapper::normalize_qualified(name)]
    } else {
        vec![
            mapper::join_namespace(context_namespace, name),
            mapper::normalize_qualified(name),
        ]
    }
}

/// In-memory entity registry keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: IndexMap<String, EntityDescriptor>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from an entity document.
    ///
    /// # Errors
    /// Returns `ParseError` if the document is invalid.
    pub fn from_xml(xml: &str) -> Result<Self, shapegen_schema::ParseError> {
        let mut registry = Self::new();
        registry.extend(parse_entities(xml)?);
        Ok(registry)
    }

    /// Creates a registry from an entity document file, or from every
    /// entity document found recursively under a directory.
    ///
    /// # Errors
    /// Returns `LoadError` if a file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let mut registry = Self::new();
        if path.is_dir() {
            let pattern = format!(
                "{}/**/*.{ENTITY_EXTENSION}",
                glob::Pattern::escape(&path.to_string_lossy())
            );
            for entry in glob::glob(&pattern)? {
                registry.extend(read_document(&entry?)?);
            }
        } else {
            registry.extend(read_document(path)?);
        }
        Ok(registry)
    }

    /// Adds an entity, returning the one it replaced.
    pub fn insert(&mut self, entity: EntityDescriptor) -> Option<EntityDescriptor> {
        self.entities.insert(entity.qualified_name.clone(), entity)
    }

    /// Adds several entities.
    pub fn extend(&mut self, entities: impl IntoIterator<Item = EntityDescriptor>) {
        for entity in entities {
            if let Some(previous) = self.insert(entity) {
                tracing::warn!(entity = %previous.qualified_name, "entity redefined");
            }
        }
    }

    /// Gets an entity by qualified name.
    #[must_use]
    pub fn get(&self, qualified_name: &str) -> Option<&EntityDescriptor> {
        self.entities.get(qualified_name)
    }

    /// Iterates entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities.values()
    }

    /// Returns the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Finds the only entity with this short name, if exactly one exists.
    fn unique_short_name(&self, short_name: &str) -> Option<&str> {
        let mut matches = self
            .entities
            .values()
            .filter(|entity| entity.short_name == short_name);
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(&first.qualified_name)
    }
}

impl EntityLoader for EntityRegistry {
    fn resolve(&self, name: &str, context_namespace: &str) -> Option<String> {
        if let Some(found) = candidates(name, context_namespace)
            .into_iter()
            .find(|candidate| self.entities.contains_key(candidate))
        {
            return Some(found);
        }
        if mapper::is_qualified(name) {
            return None;
        }
        self.unique_short_name(mapper::short_name(name))
            .map(str::to_string)
    }

    fn load(&self, qualified_name: &str) -> Result<EntityDescriptor, LoadError> {
        let entity = self
            .get(qualified_name)
            .ok_or_else(|| LoadError::not_found(qualified_name))?;
        validate_entity(entity)?;
        Ok(entity.clone())
    }
}

/// Loader backed by a directory of entity documents.
///
/// `Prefix\Sub\Name` maps to `base_dir/Sub/Name.xml` when the namespace
/// prefix is `Prefix`.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    base_dir: PathBuf,
    namespace_prefix: String,
}

impl DirectoryLoader {
    /// Creates a new directory loader.
    ///
    /// # Errors
    /// Returns `LoadError::BaseDirMissing` if `base_dir` is not a directory.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        namespace_prefix: impl AsRef<str>,
    ) -> Result<Self, LoadError> {
        let base_dir = base_dir.into();
        if !base_dir.is_dir() {
            return Err(LoadError::BaseDirMissing { path: base_dir });
        }
        Ok(Self {
            base_dir,
            namespace_prefix: mapper::normalize_qualified(namespace_prefix.as_ref()),
        })
    }

    /// Returns the base directory.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the namespace prefix.
    #[must_use]
    pub fn namespace_prefix(&self) -> &str {
        &self.namespace_prefix
    }

    /// Maps a qualified name to its entity document path.
    ///
    /// Returns `None` when the name lies outside the namespace prefix.
    #[must_use]
    pub fn path_for(&self, qualified_name: &str) -> Option<PathBuf> {
        let relative = self.strip_prefix(&mapper::normalize_qualified(qualified_name))?;
        if relative.is_empty() {
            return None;
        }
        let mut path = self.base_dir.clone();
        for segment in relative.split(mapper::CANONICAL_SEPARATOR) {
            path.push(segment);
        }
        path.set_extension(ENTITY_EXTENSION);
        Some(path)
    }

    fn strip_prefix(&self, qualified_name: &str) -> Option<String> {
        if self.namespace_prefix.is_empty() {
            return Some(qualified_name.to_string());
        }
        let rest = qualified_name.strip_prefix(&self.namespace_prefix)?;
        if rest.is_empty() {
            return Some(String::new());
        }
        rest.strip_prefix(mapper::CANONICAL_SEPARATOR)
            .map(str::to_string)
    }

    /// Maps an entity document path back to its qualified name.
    fn qualified_name_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_dir).ok()?.with_extension("");
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if segments.is_empty() {
            return None;
        }
        Some(mapper::join_namespace(
            &self.namespace_prefix,
            &segments.join("\\"),
        ))
    }

    /// Expands a namespace pattern into qualified entity names.
    ///
    /// `Ns\*` matches the direct children of `Ns`, `Ns\*\*` matches
    /// everything below it, and any other input names a single entity.
    ///
    /// # Errors
    /// Returns `LoadError` if the pattern is invalid, a directory cannot be
    /// traversed, or a single entity name does not exist.
    pub fn expand_pattern(&self, pattern: &str) -> Result<Vec<String>, LoadError> {
        let pattern = mapper::normalize_qualified(pattern);

        let (namespace, recursive) = if pattern == "*" {
            ("", false)
        } else if pattern == "*\\*" {
            ("", true)
        } else if let Some(ns) = pattern.strip_suffix("\\*\\*") {
            (ns, true)
        } else if let Some(ns) = pattern.strip_suffix("\\*") {
            (ns, false)
        } else {
            return match self.resolve(&pattern, "") {
                Some(name) => Ok(vec![name]),
                None => Err(LoadError::not_found(pattern)),
            };
        };

        let relative = if namespace.is_empty() {
            Some(String::new())
        } else {
            self.strip_prefix(namespace)
        };
        let Some(relative) = relative else {
            return Err(LoadError::not_found(pattern));
        };

        let mut dir = self.base_dir.clone();
        for segment in relative.split(mapper::CANONICAL_SEPARATOR).filter(|s| !s.is_empty()) {
            dir.push(segment);
        }
        if !dir.is_dir() {
            return Err(LoadError::not_found(pattern));
        }

        let glob_pattern = format!(
            "{}/{}*.{ENTITY_EXTENSION}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            if recursive { "**/" } else { "" }
        );

        let mut names = Vec::new();
        for entry in glob::glob(&glob_pattern)? {
            let path = entry?;
            if let Some(name) = self.qualified_name_for(&path) {
                names.push(name);
            }
        }
        tracing::debug!(%pattern, count = names.len(), "expanded namespace pattern");
        Ok(names)
    }
}

impl EntityLoader for DirectoryLoader {
    fn resolve(&self, name: &str, context_namespace: &str) -> Option<String> {
        candidates(name, context_namespace)
            .into_iter()
            .find(|candidate| self.path_for(candidate).is_some_and(|path| path.is_file()))
    }

    fn load(&self, qualified_name: &str) -> Result<EntityDescriptor, LoadError> {
        let path = self
            .path_for(qualified_name)
            .ok_or_else(|| LoadError::not_found(qualified_name))?;
        let qualified_name = mapper::normalize_qualified(qualified_name);
        let short_name = mapper::short_name(&qualified_name);

        let entities = read_document(&path)?;
        let mut exact = None;
        let mut fallback = None;
        for entity in entities {
            if entity.qualified_name == qualified_name {
                exact = Some(entity);
                break;
            }
            if entity.short_name == short_name && fallback.is_none() {
                fallback = Some(entity);
            }
        }

        // Documents may omit the namespace; the file location supplies it.
        let entity = match (exact, fallback) {
            (Some(entity), _) => entity,
            (None, Some(mut entity)) => {
                entity.qualified_name.clone_from(&qualified_name);
                entity
            }
            (None, None) => {
                return Err(LoadError::EntityMissing {
                    name: qualified_name,
                    path,
                });
            }
        };
        validate_entity(&entity)?;
        Ok(entity)
    }
}

/// Reads and parses one entity document.
fn read_document(path: &Path) -> Result<Vec<EntityDescriptor>, LoadError> {
    let xml = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_entities(&xml).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapegen_schema::SchemaError;
    use std::fs;
    use tempfile::TempDir;

    fn write_entity(dir: &Path, relative: &str, namespace: &str, name: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            format!(
                r#"<entity name="{name}" namespace="{namespace}"><field name="id" type="int"/></entity>"#
            ),
        )
        .unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_entity(dir.path(), "Dto/UserDTO.xml", "App\\Dto", "UserDTO");
        write_entity(dir.path(), "Dto/AddressDTO.xml", "App\\Dto", "AddressDTO");
        write_entity(dir.path(), "Dto/Nested/TagDTO.xml", "App\\Dto\\Nested", "TagDTO");
        write_entity(dir.path(), "Other/Thing.xml", "App\\Other", "Thing");
        dir
    }

    #[test]
    fn test_registry_resolution() {
        let xml = r#"<entities namespace="App\Dto">
    <entity name="UserDTO"/>
    <entity name="AddressDTO"/>
    <entity name="Shared" namespace="App\A"/>
    <entity name="Shared" namespace="App\B"/>
</entities>"#;
        let registry = EntityRegistry::from_xml(xml).unwrap();
        assert_eq!(registry.len(), 4);

        assert_eq!(
            registry.resolve("App\\Dto\\UserDTO", "").as_deref(),
            Some("App\\Dto\\UserDTO")
        );
        assert_eq!(
            registry.resolve("\\App\\Dto\\UserDTO", "Elsewhere").as_deref(),
            Some("App\\Dto\\UserDTO")
        );
        assert_eq!(
            registry.resolve("AddressDTO", "App\\Dto").as_deref(),
            Some("App\\Dto\\AddressDTO")
        );
        // unique short name fallback
        assert_eq!(
            registry.resolve("AddressDTO", "").as_deref(),
            Some("App\\Dto\\AddressDTO")
        );
        // ambiguous short name
        assert_eq!(registry.resolve("Shared", ""), None);
        assert_eq!(registry.resolve("Shared", "App\\B").as_deref(), Some("App\\B\\Shared"));
        assert_eq!(registry.resolve("App\\Missing\\UserDTO", ""), None);
    }

    #[test]
    fn test_registry_load() {
        let registry = EntityRegistry::from_xml(r#"<entity name="A" namespace="X"/>"#).unwrap();
        assert_eq!(registry.load("X\\A").unwrap().short_name, "A");
        assert!(matches!(
            registry.load("X\\B"),
            Err(LoadError::NotFound { .. })
        ));
    }

    #[test]
    fn test_registry_load_rejects_invalid_entity() {
        let registry = EntityRegistry::from_xml(
            r#"<entity name="A" namespace="App"><field name="x" type="int"/><field name="x" type="string"/></entity>"#,
        )
        .unwrap();
        assert!(matches!(
            registry.load("App\\A"),
            Err(LoadError::Schema(SchemaError::DuplicateField { .. }))
        ));
    }

    #[test]
    fn test_registry_from_path() {
        let dir = fixture();
        let registry = EntityRegistry::from_path(dir.path()).unwrap();
        assert_eq!(registry.len(), 4);
        assert!(registry.get("App\\Dto\\Nested\\TagDTO").is_some());

        let single = EntityRegistry::from_path(&dir.path().join("Other/Thing.xml")).unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_directory_loader_paths() {
        let dir = fixture();
        let loader = DirectoryLoader::new(dir.path(), "App").unwrap();
        assert_eq!(
            loader.path_for("App\\Dto\\UserDTO"),
            Some(dir.path().join("Dto").join("UserDTO.xml"))
        );
        assert_eq!(loader.path_for("Vendor\\UserDTO"), None);
        assert_eq!(loader.path_for("Application\\UserDTO"), None);
    }

    #[test]
    fn test_directory_loader_resolve_and_load() {
        let dir = fixture();
        let loader = DirectoryLoader::new(dir.path(), "App").unwrap();

        assert_eq!(
            loader.resolve("AddressDTO", "App\\Dto").as_deref(),
            Some("App\\Dto\\AddressDTO")
        );
        assert_eq!(loader.resolve("Missing", "App\\Dto"), None);

        let entity = loader.load("App\\Dto\\Nested\\TagDTO").unwrap();
        assert_eq!(entity.short_name, "TagDTO");
        assert_eq!(entity.fields.len(), 1);

        assert!(matches!(
            loader.load("App\\Dto\\Missing"),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn test_directory_loader_namespace_from_location() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Plain.xml"), r#"<entity name="Plain"/>"#).unwrap();
        let loader = DirectoryLoader::new(dir.path(), "App").unwrap();
        let entity = loader.load("App\\Plain").unwrap();
        assert_eq!(entity.qualified_name, "App\\Plain");
    }

    #[test]
    fn test_directory_loader_rejects_invalid_enum() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Level.xml"),
            r#"<entity name="Level" kind="enum" backing="int"><case name="LOW">1</case><case name="HIGH">1</case></entity>"#,
        )
        .unwrap();
        let loader = DirectoryLoader::new(dir.path(), "App").unwrap();
        assert!(matches!(
            loader.load("App\\Level"),
            Err(LoadError::Schema(SchemaError::InvalidEnumCase { .. }))
        ));
    }

    #[test]
    fn test_expand_pattern() {
        let dir = fixture();
        let loader = DirectoryLoader::new(dir.path(), "App").unwrap();

        let mut direct = loader.expand_pattern("App\\Dto\\*").unwrap();
        direct.sort();
        assert_eq!(direct, ["App\\Dto\\AddressDTO", "App\\Dto\\UserDTO"]);

        let mut recursive = loader.expand_pattern("App\\Dto\\*\\*").unwrap();
        recursive.sort();
        assert_eq!(
            recursive,
            [
                "App\\Dto\\AddressDTO",
                "App\\Dto\\Nested\\TagDTO",
                "App\\Dto\\UserDTO"
            ]
        );

        assert_eq!(
            loader.expand_pattern("App\\Other\\Thing").unwrap(),
            ["App\\Other\\Thing"]
        );
        assert!(matches!(
            loader.expand_pattern("App\\Nope\\*"),
            Err(LoadError::NotFound { .. })
        ));
    }

    #[test]
    fn test_directory_loader_missing_base_dir() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            DirectoryLoader::new(dir.path().join("absent"), ""),
            Err(LoadError::BaseDirMissing { .. })
        ));
    }
}
