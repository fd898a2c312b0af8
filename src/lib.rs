//! # compositor-core
//!
//! The output render-scheduling and composition pipeline for a Wayland
//! compositor: a per-output state machine that decides when to
//! repaint, interleaves with page-flip events, migrates surfaces
//! between outputs, and delivers frame callbacks, plus the dynamic
//! GL/EGL context bring-up its render path depends on.
//!
//! ## Architecture
//!
//! - `context`: dynamic loading and bring-up of the native GL context
//!   library.
//! - `backend`: the platform abstraction the context loader consumes.
//! - `output`: per-output state, the repaint scheduler, and the
//!   wl_output advertisement sequence.
//! - `space`: ordered view collections belonging to one output.
//! - `surface`: the surface arena and cross-output migration glue.
//! - `renderer`: the collaborator contract this crate renders through.
//! - `compositor`: ties outputs and the surface arena together.
//! - `signals`: the event sink outputs emit onto.
//! - `config`: tunables for the render core.
//! - `error`: bring-up and per-frame error kinds.
//!
//! The input stack, the Wayland wire protocol dispatcher, view layout
//! policy, Xwayland, session management, and a user-facing
//! configuration surface are out of scope; this crate consumes all of
//! them only through the contracts above.

pub mod backend;
pub mod clock;
pub mod compositor;
pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod logging;
pub mod output;
pub mod renderer;
pub mod signals;
pub mod space;
pub mod surface;

pub use compositor::Compositor;
pub use context::{Context, GlContext};
pub use error::{Error, Result};
pub use ids::{BufferId, OutputId, SpaceId, SurfaceId, ViewId};
pub use output::{Mode, Output, OutputInfo, OutputMetricsSnapshot};
pub use renderer::{GlRenderer, Renderer};
pub use signals::{OutputEvent, OutputEventSink};
pub use space::Space;
pub use surface::{Surface, SurfaceRegistry};

/// Version information for this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
