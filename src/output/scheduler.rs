//! The adaptive, coalescing repaint scheduler (`spec.md` §4.3).
//!
//! Three booleans and one float drive the whole thing: `activity`
//! (something happened that wants a future repaint), `scheduled` (a
//! timer arming already exists, so new activity coalesces into it), and
//! `pending_flip` (a swap is in flight; no second one may start until
//! the backend reports it finished via `finish_frame`). The float,
//! `idle_interval_ms`, is nudged toward the floor under activity and
//! toward the ceiling under idleness, geometrically, on every
//! `finish_frame`.

use log::trace;

use super::Output;

impl Output {
    fn should_render(&self) -> bool {
        self.active && !self.pending_flip && self.has_triple()
    }

    /// Requests a future repaint. A second call before the timer fires
    /// coalesces into the first: `activity` is (re)set but `scheduled`
    /// is left alone.
    pub fn schedule_repaint(&mut self) {
        self.activity = true;
        self.scheduled = true;
    }

    /// Whether a timer arming is outstanding. A host's event loop polls
    /// this (or reacts to the return of `repaint`/`finish_frame`) to
    /// decide whether to keep the per-output timer alive.
    pub fn scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn idle_interval_ms(&self) -> f32 {
        self.idle_interval_ms
    }

    /// Timer callback, called by the host with the compositor's current
    /// monotonic clock in milliseconds. Returns `true` if a frame was
    /// drawn and swap was issued, `false` if the repaint was skipped
    /// (`should_render` was false) -- a host should stop re-arming the
    /// timer in that case and rely on `finish_frame` or the next
    /// external event to do it instead.
    pub fn repaint(&mut self, now_ms: u32) -> bool {
        if !self.should_render() {
            trace!(
                "output {}: repaint skipped (active={} pending_flip={} has_triple={})",
                self.id(),
                self.active,
                self.pending_flip,
                self.has_triple()
            );
            self.activity = false;
            self.scheduled = false;
            self.frames_dropped += 1;
            return false;
        }

        let output_id = self.id();
        let bound = {
            let Some(triple) = self.triple.as_mut() else {
                self.activity = false;
                self.scheduled = false;
                self.frames_dropped += 1;
                return false;
            };
            triple.context.make_current() && triple.renderer.bind(output_id)
        };
        if !bound {
            self.activity = false;
            self.scheduled = false;
            self.frames_dropped += 1;
            return false;
        }

        self.frame_time_ms = now_ms;
        let background_enabled = self.config().background.enabled;
        let clear_color = self.config().background.clear_color;
        let views = self.focused_space().map(|s| s.views().to_vec()).unwrap_or_default();

        let Some(triple) = self.triple.as_mut() else {
            self.activity = false;
            self.scheduled = false;
            return false;
        };
        let renderer = triple.renderer.as_mut();
        renderer.time(now_ms);

        if background_enabled {
            if !self.background_visible {
                self.background_visible = is_visible_stub();
            }
            if self.background_visible {
                renderer.background();
            }
        } else {
            renderer.clear(clear_color);
        }

        // Paint order is the focused space's insertion order
        // (back-to-front); collect each view's staged frame callbacks
        // as we go so they fire with this frame's timestamp, never the
        // next one.
        let mut collected: Vec<Box<dyn FnOnce(u32)>> = Vec::new();
        for view in &views {
            renderer.view_paint(*view);
            if let Some(callbacks) = self.staged_callbacks.remove(view) {
                collected.extend(callbacks);
            }
        }

        // Pointer compositing belongs to the input stack, which is out
        // of this crate's scope; `has_pointer` exists so a host can
        // drive it through `view_paint`-equivalent calls of its own.

        if let Some(task) = self.pixel_task.take() {
            let (_, _, w, h) = task.geometry;
            let mut buffer = vec![0u8; (w * h * 4) as usize];
            renderer.read_pixels(task.geometry, &mut buffer);
            (task.callback)(w, h, buffer);
        }

        renderer.swap();
        self.pending_flip = true;
        self.frames_rendered += 1;

        if let Some((context, _)) = self.triple_mut() {
            context.swap();
        }

        for callback in collected {
            callback(now_ms);
        }

        true
    }

    /// Called once the backend reports the display has actually
    /// flipped. Recomputes the adaptive idle interval, re-arms if
    /// anything still wants a frame, and emits the termination event
    /// exactly once if `terminate()` was called.
    pub fn finish_frame(&mut self, new_frame_time_ms: u32) {
        self.pending_flip = false;
        self.frame_time_ms = new_frame_time_ms;

        if self.config().background.enabled {
            self.background_visible = is_visible_stub();
        }

        let cfg = self.config().idle_interval.clone();
        if (self.background_visible || self.activity) && !self.terminating {
            let factor = if self.activity { cfg.decay_active } else { cfg.decay_idle };
            self.idle_interval_ms = (self.idle_interval_ms * factor).clamp(cfg.floor_ms, cfg.ceiling_ms);
            self.scheduled = true;
            self.activity = false;
        } else {
            self.scheduled = false;
        }

        if self.terminating {
            self.emit_removed();
            self.terminating = false;
        }
    }

    fn emit_removed(&mut self) {
        use crate::signals::OutputEvent;
        log::info!("output {} removed", self.id());
        self.sink.emit(OutputEvent::Removed { output: self.id() });
    }
}

/// Placeholder for the view-coverage computation a layout-aware host
/// owns. `spec.md` documents an inclusive/exclusive boundary quirk in
/// the original `is_visible` that must be preserved rather than fixed;
/// since layout is out of this crate's scope, this conservatively
/// reports the background as always visible.
fn is_visible_stub() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::context::GlContext;
    use crate::ids::ViewId;
    use crate::output::{Mode, OutputInfo};
    use crate::renderer::test_double::RecordingRenderer;
    use crate::signals::{OutputEvent, RecordingSink, SharedRecordingSink};
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

    fn output_info() -> OutputInfo {
        OutputInfo {
            make: "Test".into(),
            model: "Virtual".into(),
            physical_width_mm: 300,
            physical_height_mm: 200,
            subpixel: wayland_server::protocol::wl_output::Subpixel::Unknown,
            transform: wayland_server::protocol::wl_output::Transform::Normal,
            scale: 1,
            modes: vec![Mode { current: true, preferred: true, width: 800, height: 600, refresh_mhz: 60000 }],
        }
    }

    fn single_mode_output() -> Output {
        Output::new(output_info(), Box::new(RecordingSink::default()), RenderConfig::default())
    }

    fn bound_output() -> Output {
        let mut output = single_mode_output();
        assert!(output.set_surface(Box::new(NoopContext), Box::new(RecordingRenderer::new())));
        output
    }

    fn bound_output_with_sink(sink: SharedRecordingSink) -> Output {
        let mut output = Output::new(output_info(), Box::new(sink), RenderConfig::default());
        assert!(output.set_surface(Box::new(NoopContext), Box::new(RecordingRenderer::new())));
        output
    }

    #[test]
    fn schedule_repaint_coalesces() {
        let mut output = bound_output();
        for _ in 0..1000 {
            output.schedule_repaint();
        }
        assert!(output.scheduled());
        assert!(output.repaint(0));
        assert!(!output.scheduled());
    }

    #[test]
    fn repaint_short_circuits_while_flip_pending() {
        let mut output = bound_output();
        output.schedule_repaint();
        assert!(output.repaint(0));
        assert!(output.pending_flip);

        output.schedule_repaint();
        assert!(!output.repaint(1));

        output.finish_frame(2);
        assert!(!output.pending_flip);
        assert!(output.scheduled());
    }

    #[test]
    fn idle_interval_stays_in_bounds() {
        let mut output = bound_output();
        output.schedule_repaint();
        for t in 0..100u32 {
            output.repaint(t);
            output.finish_frame(t);
            output.schedule_repaint();
        }
        assert!(output.idle_interval_ms() <= 2.0);
        assert!(output.idle_interval_ms() >= 1.0);
    }

    #[test]
    fn idle_interval_saturates_at_ceiling_when_idle() {
        let mut output = bound_output();
        output.idle_interval_ms = 41.0;
        for t in 0..100u32 {
            output.activity = false;
            output.background_visible = true;
            output.finish_frame(t);
        }
        assert_eq!(output.idle_interval_ms(), 41.0);
    }

    #[test]
    fn frame_callback_fires_with_swap_timestamp_not_finish_frame_timestamp() {
        let mut output = bound_output();
        let view = ViewId::alloc();
        output.spaces[0].push_view(view);

        let fired = std::rc::Rc::new(std::cell::RefCell::new(None));
        let fired_clone = fired.clone();
        output.request_frame_callback(view, Box::new(move |ts| *fired_clone.borrow_mut() = Some(ts)));

        output.repaint(16);
        assert_eq!(*fired.borrow(), Some(16));

        output.finish_frame(17);
        assert_eq!(*fired.borrow(), Some(16));
    }

    #[test]
    fn terminate_emits_removed_exactly_once() {
        let sink = SharedRecordingSink::default();
        let mut output = bound_output_with_sink(sink.clone());
        output.terminate();
        output.repaint(0);
        output.finish_frame(1);
        output.finish_frame(2);
        // second finish_frame has nothing to re-emit.
        assert!(!output.terminating);
        let removed = sink.events().iter().filter(|e| matches!(e, OutputEvent::Removed { .. })).count();
        assert_eq!(removed, 1);
    }

    #[test]
    fn inactive_output_does_not_render() {
        let mut output = bound_output();
        output.set_active(false);
        output.schedule_repaint();
        assert!(!output.repaint(0));
        assert_eq!(output.metrics().frames_dropped, 1);

        output.set_active(true);
        assert!(output.scheduled());
        assert!(output.repaint(1));
    }

    #[test]
    fn metrics_count_rendered_and_dropped_frames() {
        let mut output = bound_output();
        output.schedule_repaint();
        assert!(output.repaint(0));
        assert_eq!(output.metrics().frames_rendered, 1);

        // A second repaint while the flip is still pending is dropped.
        output.schedule_repaint();
        assert!(!output.repaint(1));
        assert_eq!(output.metrics().frames_dropped, 1);
    }
}
