//! Surface arena and the cross-output migration invariant (`spec.md`
//! §4.4 and §9 "Cyclic back-references").
//!
//! Surfaces live in their own arena, owned by whatever assembles the
//! outputs together (`Compositor`). An output's knowledge of a surface
//! is a weak relation -- `Surface::output` -- not ownership; the actual
//! GPU resource for a surface lives inside the owning output's
//! renderer and is released before the relation moves.

use std::collections::HashMap;

use crate::ids::{OutputId, SurfaceId};

/// One client surface. The `output` field answers "where is this
/// surface's buffer currently rendered," never "who owns this
/// surface" -- surfaces outlive any single output relation.
#[derive(Debug, Default)]
pub struct Surface {
    output: Option<OutputId>,
}

impl Surface {
    pub fn output(&self) -> Option<OutputId> {
        self.output
    }
}

/// Arena of all known surfaces, keyed by id.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    surfaces: HashMap<SurfaceId, Surface>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new surface with no output relation, returning its id.
    pub fn create(&mut self) -> SurfaceId {
        let id = SurfaceId::alloc();
        self.surfaces.insert(id, Surface::default());
        id
    }

    pub fn get(&self, surface: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&surface)
    }

    /// Removes the surface entirely (client destroyed it). Returns the
    /// output it was still attached to, if any, so the caller can
    /// release the matching renderer resource.
    pub fn remove(&mut self, surface: SurfaceId) -> Option<OutputId> {
        self.surfaces.remove(&surface).and_then(|s| s.output)
    }

    pub(crate) fn set_output(&mut self, surface: SurfaceId, output: Option<OutputId>) {
        if let Some(entry) = self.surfaces.get_mut(&surface) {
            entry.output = output;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_surface_has_no_output() {
        let mut registry = SurfaceRegistry::new();
        let surface = registry.create();
        assert_eq!(registry.get(surface).unwrap().output(), None);
    }

    #[test]
    fn set_output_is_a_weak_relation() {
        let mut registry = SurfaceRegistry::new();
        let surface = registry.create();
        let output = OutputId::alloc();
        registry.set_output(surface, Some(output));
        assert_eq!(registry.get(surface).unwrap().output(), Some(output));
        registry.set_output(surface, None);
        assert_eq!(registry.get(surface).unwrap().output(), None);
    }

    #[test]
    fn remove_returns_last_known_output() {
        let mut registry = SurfaceRegistry::new();
        let surface = registry.create();
        let output = OutputId::alloc();
        registry.set_output(surface, Some(output));
        assert_eq!(registry.remove(surface), Some(output));
        assert!(registry.get(surface).is_none());
    }
}
