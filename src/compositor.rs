//! Ties outputs and the surface arena together for cross-output
//! migration (`spec.md` §4.4). Everything else -- input, the wire
//! protocol dispatcher, layout -- is a host concern built on top of
//! this.

use std::collections::HashMap;

use crate::ids::{BufferId, OutputId, SurfaceId};
use crate::output::Output;
use crate::surface::SurfaceRegistry;

#[derive(Default)]
pub struct Compositor {
    outputs: HashMap<OutputId, Output>,
    surfaces: SurfaceRegistry,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_output(&mut self, output: Output) -> OutputId {
        let id = output.id();
        self.outputs.insert(id, output);
        id
    }

    pub fn remove_output(&mut self, id: OutputId) -> Option<Output> {
        self.outputs.remove(&id)
    }

    pub fn output(&self, id: OutputId) -> Option<&Output> {
        self.outputs.get(&id)
    }

    pub fn output_mut(&mut self, id: OutputId) -> Option<&mut Output> {
        self.outputs.get_mut(&id)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.values()
    }

    pub fn create_surface(&mut self) -> SurfaceId {
        self.surfaces.create()
    }

    pub fn surfaces(&self) -> &SurfaceRegistry {
        &self.surfaces
    }

    /// Attaches `surface` (with `buffer`) to `output`. If the surface
    /// was attached elsewhere, it is first destroyed there -- releasing
    /// its old renderer resource and scheduling a repaint on the old
    /// output -- before the new attach is attempted. Returns `false`
    /// without leaving partial state if the renderer refuses the new
    /// buffer.
    pub fn surface_attach(&mut self, output: OutputId, surface: SurfaceId, buffer: BufferId) -> bool {
        if let Some(previous) = self.surfaces.get(surface).and_then(|s| s.output()) {
            if previous != output {
                self.surface_destroy(previous, surface);
            }
        }

        let Some(target) = self.outputs.get_mut(&output) else {
            return false;
        };
        let Some((_, renderer)) = target.triple_mut() else {
            return false;
        };
        if !renderer.surface_attach(surface, buffer) {
            return false;
        }
        target.schedule_repaint();
        self.surfaces.set_output(surface, Some(output));
        true
    }

    /// Releases `surface`'s renderer resource on `output` and clears the
    /// weak relation, scheduling a repaint on `output`.
    pub fn surface_destroy(&mut self, output: OutputId, surface: SurfaceId) {
        if self.surfaces.get(surface).and_then(|s| s.output()) != Some(output) {
            return;
        }
        if let Some(target) = self.outputs.get_mut(&output) {
            if let Some((_, renderer)) = target.triple_mut() {
                renderer.surface_destroy(surface);
            }
            target.schedule_repaint();
        }
        self.surfaces.set_output(surface, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::context::GlContext;
    use crate::output::{Mode, OutputInfo};
    use crate::renderer::test_double::RecordingRenderer;
    use crate::signals::RecordingSink;
    use std::os::unix::io::RawFd;

    struct NoopContext;
    impl GlContext for NoopContext {
        fn make_current(&mut self) -> bool {
            true
        }
        fn swap(&mut self) {}
        fn poll_events(&mut self) {}
        fn event_fd(&self) -> RawFd {
            -1
        }
        fn terminate(&mut self) {}
    }

    fn output_with_triple() -> Output {
        let info = OutputInfo {
            make: "Test".into(),
            model: "Virtual".into(),
            physical_width_mm: 300,
            physical_height_mm: 200,
            subpixel: wayland_server::protocol::wl_output::Subpixel::Unknown,
            transform: wayland_server::protocol::wl_output::Transform::Normal,
            scale: 1,
            modes: vec![Mode { current: true, preferred: true, width: 800, height: 600, refresh_mhz: 60000 }],
        };
        let mut output = Output::new(info, Box::new(RecordingSink::default()), RenderConfig::default());
        output.set_surface(Box::new(NoopContext), Box::new(RecordingRenderer::new()));
        output
    }

    #[test]
    fn migrating_a_surface_detaches_from_the_old_output() {
        let mut compositor = Compositor::new();
        let a = compositor.add_output(output_with_triple());
        let b = compositor.add_output(output_with_triple());
        let surface = compositor.create_surface();
        let buffer = BufferId::alloc();

        assert!(compositor.surface_attach(a, surface, buffer));
        assert_eq!(compositor.surfaces().get(surface).unwrap().output(), Some(a));

        assert!(compositor.surface_attach(b, surface, buffer));
        assert_eq!(compositor.surfaces().get(surface).unwrap().output(), Some(b));
    }

    #[test]
    fn destroy_only_clears_relation_for_the_current_output() {
        let mut compositor = Compositor::new();
        let a = compositor.add_output(output_with_triple());
        let b = compositor.add_output(output_with_triple());
        let surface = compositor.create_surface();
        let buffer = BufferId::alloc();
        compositor.surface_attach(a, surface, buffer);

        // Destroying against the wrong output is a no-op.
        compositor.surface_destroy(b, surface);
        assert_eq!(compositor.surfaces().get(surface).unwrap().output(), Some(a));

        compositor.surface_destroy(a, surface);
        assert_eq!(compositor.surfaces().get(surface).unwrap().output(), None);
    }
}
