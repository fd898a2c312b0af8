//! The renderer contract (`spec.md` §6, "Outbound to renderer").
//!
//! This is an external collaborator: the render-scheduling core only
//! needs to drive it through this trait. `GlRenderer` is a minimal
//! OpenGL ES implementation grounded in the teacher's `renderer/mod.rs`
//! (same `RenderedWindow`-per-surface bookkeeping, same texture-pool
//! idea) but scoped down to exactly the nine operations the scheduler
//! calls; layout, effects and damage tracking are the host compositor's
//! job, not this crate's.

use std::collections::HashMap;
use std::ffi::c_void;

use crate::ids::{BufferId, OutputId, SurfaceId, ViewId};

/// Pixel geometry for a readback request: `(x, y, width, height)`.
pub type Geometry = (i32, i32, u32, u32);

pub trait Renderer {
    /// Make this output's GL context current and prepare to draw.
    /// Returns `false` on failure; the caller skips the frame.
    fn bind(&mut self, output: OutputId) -> bool;
    /// Gives the renderer the compositor's monotonic clock, in
    /// milliseconds, for this frame.
    fn time(&mut self, ms: u32);
    /// Render the background layer.
    fn background(&mut self);
    /// Clear to a neutral color (used when backgrounds are disabled).
    fn clear(&mut self, color: [f32; 4]);
    /// Paint one view, back-to-front order is the caller's
    /// responsibility.
    fn view_paint(&mut self, view: ViewId);
    /// Issue the GPU-side swap. Does not touch the backend's page-flip
    /// hook; that's `GlContext::swap`'s job.
    fn swap(&mut self);
    /// Attach `buffer` to `surface`'s GPU-side resources. Returns
    /// `false` without partial state on failure.
    fn surface_attach(&mut self, surface: SurfaceId, buffer: BufferId) -> bool;
    /// Release `surface`'s GPU-side resources.
    fn surface_destroy(&mut self, surface: SurfaceId);
    /// Read back `geometry` into `out_rgba`, which must be exactly
    /// `width * height * 4` bytes.
    fn read_pixels(&mut self, geometry: Geometry, out_rgba: &mut [u8]);
    /// Release all GPU resources this renderer owns.
    fn free(&mut self);
}

/// A per-surface GPU resource: just enough state to prove attach/detach
/// is tracked per surface, without the texture-pool machinery a real
/// compositor would add on top (out of scope here; see
/// `renderer/texture_pool.rs` in the teacher for that layer).
struct SurfaceResource {
    buffer: BufferId,
    texture: Option<u32>,
}

/// Minimal OpenGL ES renderer. Entry points are loaded by
/// `Context::new` via `gl::load_with`, so this type assumes a context is
/// already current when its methods are called -- exactly the ordering
/// `Output::repaint` enforces.
pub struct GlRenderer {
    surfaces: HashMap<SurfaceId, SurfaceResource>,
    bound_output: Option<OutputId>,
    frame_time_ms: u32,
}

impl GlRenderer {
    pub fn new() -> Self {
        Self {
            surfaces: HashMap::new(),
            bound_output: None,
            frame_time_ms: 0,
        }
    }
}

impl Default for GlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for GlRenderer {
    fn bind(&mut self, output: OutputId) -> bool {
        self.bound_output = Some(output);
        true
    }

    fn time(&mut self, ms: u32) {
        self.frame_time_ms = ms;
    }

    fn background(&mut self) {
        unsafe {
            gl::ClearColor(0.0, 0.0, 0.0, 1.0);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        unsafe {
            gl::ClearColor(color[0], color[1], color[2], color[3]);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    fn view_paint(&mut self, _view: ViewId) {
        // Layout and per-view drawing are the host's policy (`spec.md`
        // Non-goals); this contract only guarantees the call happens in
        // the caller's back-to-front order.
    }

    fn swap(&mut self) {
        unsafe {
            gl::Flush();
        }
    }

    fn surface_attach(&mut self, surface: SurfaceId, buffer: BufferId) -> bool {
        self.surfaces.insert(surface, SurfaceResource { buffer, texture: None });
        true
    }

    fn surface_destroy(&mut self, surface: SurfaceId) {
        if let Some(resource) = self.surfaces.remove(&surface) {
            if let Some(texture) = resource.texture {
                unsafe {
                    gl::DeleteTextures(1, &texture);
                }
            }
        }
    }

    fn read_pixels(&mut self, geometry: Geometry, out_rgba: &mut [u8]) {
        let (x, y, width, height) = geometry;
        debug_assert_eq!(out_rgba.len(), (width * height * 4) as usize);
        unsafe {
            gl::ReadPixels(
                x,
                y,
                width as i32,
                height as i32,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                out_rgba.as_mut_ptr() as *mut c_void,
            );
        }
    }

    fn free(&mut self) {
        let surfaces: Vec<SurfaceId> = self.surfaces.keys().copied().collect();
        for surface in surfaces {
            self.surface_destroy(surface);
        }
        self.bound_output = None;
    }
}

#[cfg(test)]
pub(crate) mod test_double {
    use super::*;

    /// Records every call instead of touching a real GL context, so the
    /// scheduler's tests can assert exactly what happened during a
    /// `repaint` without a display.
    #[derive(Default)]
    pub struct RecordingRenderer {
        pub bind_result: bool,
        pub bound: Vec<OutputId>,
        pub times: Vec<u32>,
        pub backgrounds_drawn: u32,
        pub clears: Vec<[f32; 4]>,
        pub views_painted: Vec<ViewId>,
        pub swaps: u32,
        pub attached: Vec<(SurfaceId, BufferId)>,
        pub destroyed: Vec<SurfaceId>,
        pub last_read: Option<Geometry>,
        pub freed: bool,
    }

    impl RecordingRenderer {
        pub fn new() -> Self {
            Self { bind_result: true, ..Default::default() }
        }
    }

    impl Renderer for RecordingRenderer {
        fn bind(&mut self, output: OutputId) -> bool {
            self.bound.push(output);
            self.bind_result
        }

        fn time(&mut self, ms: u32) {
            self.times.push(ms);
        }

        fn background(&mut self) {
            self.backgrounds_drawn += 1;
        }

        fn clear(&mut self, color: [f32; 4]) {
            self.clears.push(color);
        }

        fn view_paint(&mut self, view: ViewId) {
            self.views_painted.push(view);
        }

        fn swap(&mut self) {
            self.swaps += 1;
        }

        fn surface_attach(&mut self, surface: SurfaceId, buffer: BufferId) -> bool {
            self.attached.push((surface, buffer));
            true
        }

        fn surface_destroy(&mut self, surface: SurfaceId) {
            self.destroyed.push(surface);
        }

        fn read_pixels(&mut self, geometry: Geometry, out_rgba: &mut [u8]) {
            self.last_read = Some(geometry);
            out_rgba.fill(0xAB);
        }

        fn free(&mut self) {
            self.freed = true;
        }
    }
}
