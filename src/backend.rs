//! Platform abstraction consumed by the GL context loader.
//!
//! `spec.md` §4.2: "a neutral backend yielding a native display handle,
//! native window handle, event pump, event file descriptor, and an
//! optional page-flip hook." Everything that actually owns a DRM device,
//! a Wayland client connection to a nested compositor, or a winit window
//! lives outside this crate and implements this trait; bring-up of those
//! real backends is out of scope (`spec.md` §1 Out of scope).

use std::ffi::c_void;
use std::os::unix::io::RawFd;

/// A native display/window pair plus an event pump, handed to the
/// dynamic GL context loader during bring-up.
pub trait Backend {
    /// Canonical name, used only for diagnostics.
    fn name(&self) -> &str;

    /// Native display handle (e.g. `wl_display*`, `EGLNativeDisplayType`).
    fn native_display(&self) -> *mut c_void;

    /// Native window handle the GL context renders into.
    fn native_window(&self) -> *mut c_void;

    /// Pump whatever event source the backend owns (DRM uevents, a
    /// nested Wayland connection, ...). Must not block.
    fn poll_events(&mut self);

    /// File descriptor the host event loop can poll for backend
    /// activity (drives `poll_events`).
    fn event_fd(&self) -> RawFd;

    /// Optional hook invoked immediately after `swap_buffers`, for
    /// backends that must separately tell the kernel/driver about the
    /// flip (e.g. `drmModePageFlip`). Default is a no-op for backends
    /// where the GL driver's swap already performs the flip.
    fn page_flip(&mut self) {}
}

/// A backend with no real display, used by tests that exercise the
/// scheduler and output lifecycle without a GPU. `native_display` and
/// `native_window` return null, so a real `Context` will fail to bind
/// during bring-up against it -- tests that need a working render path
/// use `GlContext`/`Renderer` test doubles instead of a real `Context`
/// bound to this backend.
#[derive(Debug, Default)]
pub struct NullBackend {
    event_fd: RawFd,
}

impl NullBackend {
    pub fn new() -> Self {
        Self { event_fd: -1 }
    }
}

impl Backend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn native_display(&self) -> *mut c_void {
        std::ptr::null_mut()
    }

    fn native_window(&self) -> *mut c_void {
        std::ptr::null_mut()
    }

    fn poll_events(&mut self) {}

    fn event_fd(&self) -> RawFd {
        self.event_fd
    }
}
