//! Top-level generation entry point.

use crate::closure::{self, GenerationResult};
use crate::error::CodegenError;
use crate::loader::EntityLoader;
use crate::renderer::Renderer;
use crate::typescript::{TypeScriptOptions, TypeScriptRenderer};

/// Entity generator combining a loader and a renderer.
///
/// Stateless between calls: every call starts a fresh closure.
pub struct Generator<L, R = TypeScriptRenderer> {
    loader: L,
    renderer: R,
}

impl<L: EntityLoader> Generator<L> {
    /// Creates a generator with the default TypeScript renderer.
    #[must_use]
    pub fn new(loader: L) -> Self {
        Self::with_renderer(loader, TypeScriptRenderer::default())
    }

    /// Creates a TypeScript generator with the given options.
    #[must_use]
    pub fn with_options(loader: L, options: TypeScriptOptions) -> Self {
        Self::with_renderer(loader, TypeScriptRenderer::new(options))
    }
}

impl<L: EntityLoader, R: Renderer> Generator<L, R> {
    /// Creates a generator with a custom renderer.
    #[must_use]
    pub fn with_renderer(loader: L, renderer: R) -> Self {
        Self { loader, renderer }
    }

    /// Returns the loader.
    #[must_use]
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Renders a single entity.
    ///
    /// # Errors
    /// Returns `CodegenError` if the entity cannot be resolved or loaded.
    pub fn generate_one(&self, name: &str) -> Result<String, CodegenError> {
        closure::generate_one(name, &self.loader, &self.renderer)
    }

    /// Renders an entity together with all entities it references.
    ///
    /// # Errors
    /// Returns `CodegenError` if the root cannot be resolved or any
    /// reachable entity fails to load.
    pub fn generate_closure(&self, name: &str) -> Result<GenerationResult, CodegenError> {
        closure::generate_closure(name, &self.loader, &self.renderer)
    }
}
