//! One physical output: its display information, its spaces, and the
//! `(backend_surface, context, renderer)` triple it renders through.
//!
//! The repaint state machine itself (`schedule_repaint`, `repaint`,
//! `finish_frame`) lives in [`scheduler`] as a second `impl Output`
//! block; this module owns construction, resolution/focus changes, and
//! the wl_output wire-level advertisement.

mod scheduler;
mod timer;

pub use timer::{arm_repaint_timer, queue_immediate_repaint};

use std::collections::HashMap;

use wayland_server::protocol::wl_output::{self, WlOutput};
use wayland_server::Resource;

use crate::config::RenderConfig;
use crate::context::GlContext;
use crate::ids::{OutputId, SpaceId, ViewId};
use crate::renderer::Renderer;
use crate::signals::{OutputEvent, OutputEventSink};
use crate::space::Space;

/// Highest wl_output protocol version this crate advertises. `scale`
/// and `done` were introduced in version 2; anything a client requests
/// above this is clamped down by the display's own global-bind
/// negotiation, so callers never see a version above this constant.
pub const MAX_PROTOCOL_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub current: bool,
    pub preferred: bool,
    pub width: i32,
    pub height: i32,
    pub refresh_mhz: i32,
}

/// Static display information advertised to clients.
#[derive(Debug, Clone)]
pub struct OutputInfo {
    pub make: String,
    pub model: String,
    pub physical_width_mm: i32,
    pub physical_height_mm: i32,
    pub subpixel: wl_output::Subpixel,
    pub transform: wl_output::Transform,
    pub scale: i32,
    pub modes: Vec<Mode>,
}

impl OutputInfo {
    /// The mode elected as current: first `current`, else first
    /// `preferred`. Panics if neither exists -- bring-up's precondition
    /// is that at least one mode carries one of those flags.
    fn elected_mode_index(&self) -> usize {
        self.modes
            .iter()
            .position(|m| m.current)
            .or_else(|| self.modes.iter().position(|m| m.preferred))
            .expect("output must have at least one current or preferred mode")
    }
}

/// A one-shot pixel readback request, armed by `Output::get_pixels`.
pub struct PixelTask {
    pub geometry: (i32, i32, u32, u32),
    pub callback: Box<dyn FnOnce(u32, u32, Vec<u8>)>,
}

/// The `(backend_surface handle, context, renderer)` triple. Either all
/// present or all absent -- never partially initialized.
struct RenderTriple {
    context: Box<dyn GlContext>,
    renderer: Box<dyn Renderer>,
}

pub struct Output {
    id: OutputId,
    info: OutputInfo,
    mode_index: usize,
    width: i32,
    height: i32,

    spaces: Vec<Space>,
    space_ids: Vec<SpaceId>,
    focused: Option<usize>,

    triple: Option<RenderTriple>,
    resources: Vec<WlOutput>,

    sink: Box<dyn OutputEventSink>,
    config: RenderConfig,

    // Scheduler state (`spec.md` §4.3); mutated only from `scheduler.rs`.
    pub(super) active: bool,
    pub(super) activity: bool,
    pub(super) scheduled: bool,
    pub(super) pending_flip: bool,
    pub(super) terminating: bool,
    pub(super) background_visible: bool,
    pub(super) frame_time_ms: u32,
    pub(super) idle_interval_ms: f32,
    pub(super) pixel_task: Option<PixelTask>,
    pub(super) has_pointer: bool,
    /// Frame-callback requests staged per view, moved into a local list
    /// and drained during `repaint` (`spec.md` §4.3 step 5 and step 9).
    pub(super) staged_callbacks: HashMap<ViewId, Vec<Box<dyn FnOnce(u32)>>>,

    // Metrics (`spec.md` §6 "metrics" supplement); read-only to callers
    // via `Output::metrics`.
    pub(super) frames_rendered: u64,
    pub(super) frames_dropped: u64,
}

/// A read-only snapshot of one output's repaint activity, taken at the
/// moment `Output::metrics` is called. Mirrors the teacher's
/// `performance_monitoring.rs` pattern of a plain `Debug`/`Clone` struct
/// rather than a live counter registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputMetricsSnapshot {
    pub frames_rendered: u64,
    pub frames_dropped: u64,
    pub idle_interval_ms: f32,
}

impl Output {
    /// Allocates an output, elects its current mode, and creates one
    /// initial space. Does not yet have a render triple; callers attach
    /// one with [`Output::set_surface`] before the scheduler can render.
    pub fn new(info: OutputInfo, sink: Box<dyn OutputEventSink>, config: RenderConfig) -> Self {
        let mode_index = info.elected_mode_index();
        let mode = info.modes[mode_index];
        let id = OutputId::alloc();
        let initial_space = Space::new(id);
        let idle_interval_ms = config.idle_interval.floor_ms;

        Self {
            id,
            info,
            mode_index,
            width: mode.width,
            height: mode.height,
            spaces: vec![initial_space],
            space_ids: vec![SpaceId::alloc()],
            focused: Some(0),
            triple: None,
            resources: Vec::new(),
            sink,
            config,
            active: true,
            activity: false,
            scheduled: false,
            pending_flip: false,
            terminating: false,
            background_visible: false,
            frame_time_ms: 0,
            idle_interval_ms,
            pixel_task: None,
            has_pointer: false,
            staged_callbacks: HashMap::new(),
            frames_rendered: 0,
            frames_dropped: 0,
        }
    }

    /// Sets whether the session is foreground. `should_render` is
    /// gated on this (`spec.md` §3, §6): a backgrounded compositor
    /// keeps its scheduler state but stops issuing draw calls until
    /// reactivated, at which point a repaint is scheduled to catch up.
    pub fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        if active {
            self.schedule_repaint();
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// A snapshot of this output's repaint counters and current
    /// adaptive interval, for a host to log or export.
    pub fn metrics(&self) -> OutputMetricsSnapshot {
        OutputMetricsSnapshot {
            frames_rendered: self.frames_rendered,
            frames_dropped: self.frames_dropped,
            idle_interval_ms: self.idle_interval_ms,
        }
    }

    /// Stages a frame-callback request for `view`, committed before the
    /// next swap. Delivered with that swap's timestamp, never dropped on
    /// a rendered frame (`spec.md` §8 invariant 5).
    pub fn request_frame_callback(&mut self, view: ViewId, callback: Box<dyn FnOnce(u32)>) {
        self.staged_callbacks.entry(view).or_default().push(callback);
        self.schedule_repaint();
    }

    pub fn id(&self) -> OutputId {
        self.id
    }

    pub fn resolution(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn info(&self) -> &OutputInfo {
        &self.info
    }

    pub fn mode_index(&self) -> usize {
        self.mode_index
    }

    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    pub fn focused_space(&self) -> Option<&Space> {
        self.focused.map(|i| &self.spaces[i])
    }

    pub fn focused_space_id(&self) -> Option<SpaceId> {
        self.focused.map(|i| self.space_ids[i])
    }

    /// Appends a new space and returns its id. Does not change focus.
    pub fn add_space(&mut self) -> SpaceId {
        let id = SpaceId::alloc();
        self.spaces.push(Space::new(self.id));
        self.space_ids.push(id);
        if self.focused.is_none() {
            self.focused = Some(self.spaces.len() - 1);
        }
        id
    }

    /// Removes a space. If it was focused, focus moves to its previous
    /// sibling (or to `None` if the output now has no spaces), matching
    /// the behavior of `set_surface`'s teardown-adjacent `space_free`.
    pub fn remove_space(&mut self, space: SpaceId) {
        let Some(idx) = self.space_ids.iter().position(|s| *s == space) else {
            return;
        };
        self.spaces.remove(idx);
        self.space_ids.remove(idx);

        self.focused = match self.focused {
            None => None,
            Some(f) if f < idx => Some(f),
            Some(f) if f == idx => {
                if self.spaces.is_empty() {
                    None
                } else {
                    Some(idx.saturating_sub(1))
                }
            }
            Some(f) => Some(f - 1),
        };
    }

    /// Swaps focus to `space`. No-op if already focused; schedules a
    /// repaint and emits `space.activated` otherwise.
    pub fn focus_space(&mut self, space: SpaceId) {
        if self.focused_space_id() == Some(space) {
            return;
        }
        if let Some(idx) = self.space_ids.iter().position(|s| *s == space) {
            self.focused = Some(idx);
            self.sink.emit(OutputEvent::SpaceActivated { output: self.id, space });
            self.schedule_repaint();
        }
    }

    /// Atomically swaps the render triple. The caller constructs
    /// `context` before `renderer` (a renderer binds against an already
    /// current context), matching `spec.md`'s build order. Any existing
    /// triple is fully released (`free`, `terminate`) first; if the new
    /// renderer fails to bind, the output is left with no triple at all
    /// rather than a half-swapped one -- `should_render` already
    /// accounts for that case.
    pub fn set_surface(&mut self, context: Box<dyn GlContext>, mut renderer: Box<dyn Renderer>) -> bool {
        if let Some(mut old) = self.triple.take() {
            old.renderer.free();
            old.context.terminate();
        }
        if !renderer.bind(self.id) {
            return false;
        }
        self.triple = Some(RenderTriple { context, renderer });
        self.schedule_repaint();
        true
    }

    pub(crate) fn has_triple(&self) -> bool {
        self.triple.is_some()
    }

    pub(crate) fn triple_mut(&mut self) -> Option<(&mut (dyn GlContext + '_), &mut (dyn Renderer + '_))> {
        match self.triple.as_mut() {
            Some(t) => Some((t.context.as_mut(), t.renderer.as_mut())),
            None => None,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Updates resolution; no-op if unchanged. Emits `output.resolution`
    /// and schedules a repaint otherwise.
    pub fn set_resolution(&mut self, width: i32, height: i32) {
        if (self.width, self.height) == (width, height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.sink.emit(OutputEvent::Resolution { output: self.id, width, height });
        self.schedule_repaint();
    }

    /// Arms termination: the next `finish_frame` emits
    /// `OUTPUT_EVENT_REMOVE` exactly once and clears the flag.
    pub fn terminate(&mut self) {
        self.terminating = true;
        self.schedule_repaint();
    }

    /// Arms a one-shot pixel readback. Ignored if one is already
    /// pending.
    pub fn get_pixels(&mut self, geometry: (i32, i32, u32, u32), callback: Box<dyn FnOnce(u32, u32, Vec<u8>)>) {
        if self.pixel_task.is_some() {
            return;
        }
        self.pixel_task = Some(PixelTask { geometry, callback });
        self.schedule_repaint();
    }

    /// Registers a freshly bound client resource and sends the
    /// wl_output advertisement sequence: `geometry`, `scale` (version
    /// >= 2), every known `mode`, `done` (version >= 2). The host's own
    /// `GlobalDispatch<WlOutput, _>::bind` impl calls this after
    /// `data_init.init` -- the wire protocol dispatcher that owns that
    /// impl is out of this crate's scope, but the advertisement
    /// sequence itself is this type's responsibility.
    pub fn bind_client(&mut self, output: WlOutput) {
        self.advertise(&output);
        self.resources.push(output);
    }

    fn advertise(&self, output: &WlOutput) {
        output.geometry(
            0,
            0,
            self.info.physical_width_mm,
            self.info.physical_height_mm,
            self.info.subpixel,
            self.info.make.clone(),
            self.info.model.clone(),
            self.info.transform,
        );
        if output.version() >= 2 {
            output.scale(self.info.scale);
        }
        for mode in &self.info.modes {
            let mut flags = wl_output::Mode::empty();
            if mode.current {
                flags |= wl_output::Mode::Current;
            }
            if mode.preferred {
                flags |= wl_output::Mode::Preferred;
            }
            output.mode(flags, mode.width, mode.height, mode.refresh_mhz);
        }
        if output.version() >= 2 {
            output.done();
        }
    }
}

/// No-op request handler for the subset of `wl_output` a host can reuse
/// as-is: the interface has no client-to-server requests besides
/// `release` (version >= 3, also a no-op here). Hosts that embed this
/// crate implement their own `Dispatch<WlOutput, _>` against their own
/// state type; this is provided for hosts happy with the default.
pub fn handle_output_request(_request: wl_output::Request) {}
