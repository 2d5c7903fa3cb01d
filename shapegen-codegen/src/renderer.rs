//! Rendering seam between the dependency closure and output formats.

use shapegen_schema::ResolvedEntity;

/// Turns a resolved entity into output text.
pub trait Renderer {
    /// Renders one entity.
    fn render(&self, entity: &ResolvedEntity) -> String;
}

impl<F> Renderer for F
where
    F: Fn(&ResolvedEntity) -> String,
{
    fn render(&self, entity: &ResolvedEntity) -> String {
        self(entity)
    }
}
