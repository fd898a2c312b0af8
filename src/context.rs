//! Dynamic GL context loader (`spec.md` §4.1).
//!
//! Locates and opens the native GL context library at runtime, binds
//! entry points, initializes a display connection, chooses a framebuffer
//! config, creates a context + window surface, and exposes the uniform
//! `{make_current, swap, poll_events, event_fd, terminate}` contract.
//!
//! Entry points are resolved as a fixed record via
//! `khronos_egl::DynamicInstance::<EGL1_4>::load_required_from`, which
//! covers exactly the EGL 1.0-1.4 functions this loader needs (error
//! query, get-display, initialize, terminate, query-string,
//! choose-config, bind-API, create/destroy-context,
//! create/destroy-window-surface, make-current, swap-buffers) and fails
//! the whole load if any of them is absent from the library -- the
//! "explicit absence, null-checked at load" behavior `spec.md` §9 asks
//! for, without hand-maintaining a per-symbol `libloading::Symbol` table.

use khronos_egl as egl;
use log::{debug, warn};
use std::collections::HashSet;
use std::ffi::c_void;
use std::os::unix::io::RawFd;

use crate::backend::Backend;
use crate::config::RenderConfig;
use crate::error::{Error, Result};

type Instance = egl::DynamicInstance<egl::EGL1_4>;

/// The uniform contract the rest of the system renders through.
pub trait GlContext {
    fn make_current(&mut self) -> bool;
    fn swap(&mut self);
    fn poll_events(&mut self);
    fn event_fd(&self) -> RawFd;
    fn terminate(&mut self);
}

/// A ready-to-render EGL context bound to one `Backend`'s native window.
pub struct Context {
    backend: Box<dyn Backend>,
    instance: Option<Instance>,
    display: Option<egl::Display>,
    config: Option<egl::Config>,
    egl_context: Option<egl::Context>,
    surface: Option<egl::Surface>,
    extensions: HashSet<String>,
    #[allow(dead_code)]
    version: (egl::Int, egl::Int),
}

impl Context {
    /// Runs the ordered bring-up protocol from `spec.md` §4.1. Each step
    /// is fatal on failure: on any error this calls `terminate()` (which
    /// tolerates the partially-initialized state) and returns the error.
    pub fn new(backend: Box<dyn Backend>, config: &RenderConfig) -> Result<Self> {
        let mut this = Self {
            backend,
            instance: None,
            display: None,
            config: None,
            egl_context: None,
            surface: None,
            extensions: HashSet::new(),
            version: (0, 0),
        };

        if let Err(e) = this.bring_up(config) {
            warn!("GL context bring-up failed: {e}");
            this.terminate();
            return Err(e);
        }
        debug!("GL context ready ({}.{})", this.version.0, this.version.1);
        Ok(this)
    }

    fn bring_up(&mut self, config: &RenderConfig) -> Result<()> {
        // Step 2: open the library and resolve the fixed entry-point record.
        let library = open_first(&config.egl_library_names)?;
        let instance = unsafe { Instance::load_required_from(library) }
            .map_err(|e| Error::SymbolMissing(e.to_string()))?;

        // Step 3: obtain a display handle from the backend's native display.
        let native_display = self.backend.native_display() as egl::NativeDisplayType;
        let display = unsafe { instance.get_display(native_display) }
            .ok_or_else(|| Error::DisplayInitFailed("eglGetDisplay returned null".into()))?;

        // Step 4: initialize the display; record major/minor versions.
        let version = instance
            .initialize(display)
            .map_err(|e| Error::DisplayInitFailed(e.to_string()))?;

        // Step 5: bind the OpenGL ES API flavor.
        instance
            .bind_api(egl::OPENGL_ES_API)
            .map_err(|e| Error::DisplayInitFailed(format!("eglBindAPI failed: {e}")))?;

        // Step 6: query extensions string; cache whitespace-tokenized.
        let extensions = instance
            .query_string(Some(display), egl::EXTENSIONS)
            .map(|s| {
                s.to_string_lossy()
                    .split_whitespace()
                    .map(str::to_owned)
                    .collect::<HashSet<_>>()
            })
            .unwrap_or_default();

        // Step 7: choose exactly one config matching the spec's criteria.
        let chosen = choose_config(&instance, display)?;

        // Step 8: create context with client version 2.
        let context_attribs = [egl::CONTEXT_CLIENT_VERSION, 2, egl::NONE];
        let egl_context = instance
            .create_context(display, chosen, None, &context_attribs)
            .map_err(|e| Error::ContextCreateFailed(e.to_string()))?;

        // Step 9: create window surface bound to the backend's native window.
        let native_window = self.backend.native_window() as egl::NativeWindowType;
        let surface = unsafe { instance.create_window_surface(display, chosen, native_window, None) }
            .map_err(|e| Error::SurfaceCreateFailed(e.to_string()))?;

        // Step 10: make current.
        instance
            .make_current(display, Some(surface), Some(surface), Some(egl_context))
            .map_err(|e| Error::MakeCurrentFailed(e.to_string()))?;

        gl::load_with(|symbol| {
            instance
                .get_proc_address(symbol)
                .map(|f| f as *const c_void)
                .unwrap_or(std::ptr::null())
        });

        self.instance = Some(instance);
        self.display = Some(display);
        self.config = Some(chosen);
        self.egl_context = Some(egl_context);
        self.surface = Some(surface);
        self.extensions = extensions;
        self.version = version;
        Ok(())
    }

    /// Whole-token extension lookup. `"FOO"` must not match inside
    /// `"FOOBAR"`; see `spec.md` §8 boundary behavior.
    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    pub fn major_minor(&self) -> (egl::Int, egl::Int) {
        self.version
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn Backend {
        self.backend.as_mut()
    }
}

impl GlContext for Context {
    fn make_current(&mut self) -> bool {
        match (&self.instance, self.display, self.surface, self.egl_context) {
            (Some(instance), Some(display), Some(surface), Some(context)) => instance
                .make_current(display, Some(surface), Some(surface), Some(context))
                .is_ok(),
            _ => false,
        }
    }

    fn swap(&mut self) {
        if let (Some(instance), Some(display), Some(surface)) =
            (&self.instance, self.display, self.surface)
        {
            let _ = instance.swap_buffers(display, surface);
        }
        self.backend.page_flip();
    }

    fn poll_events(&mut self) {
        self.backend.poll_events();
    }

    fn event_fd(&self) -> RawFd {
        self.backend.event_fd()
    }

    /// Reverses bring-up. Safe to call on a partially-initialized
    /// context (null slots are skipped) and safe to call more than
    /// once: every step is guarded by `Option::take`.
    fn terminate(&mut self) {
        if let (Some(instance), Some(display)) = (&self.instance, self.display) {
            let _ = instance.make_current(display, None, None, None);
            if let Some(surface) = self.surface.take() {
                let _ = instance.destroy_surface(display, surface);
            }
            if let Some(context) = self.egl_context.take() {
                let _ = instance.destroy_context(display, context);
            }
            let _ = instance.terminate(display);
        }
        self.display = None;
        self.config = None;
        self.instance = None;
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn open_first(names: &[String]) -> Result<libloading::Library> {
    let mut last_err = None;
    for name in names {
        match unsafe { libloading::Library::new(name) } {
            Ok(lib) => {
                debug!("opened GL context library {name}");
                return Ok(lib);
            }
            Err(e) => {
                debug!("could not open {name}: {e}");
                last_err = Some(e);
            }
        }
    }
    Err(Error::LibraryNotFound(
        last_err.map(|e| e.to_string()).unwrap_or_else(|| names.join(", ")),
    ))
}

fn choose_config(instance: &Instance, display: egl::Display) -> Result<egl::Config> {
    let attribs = [
        egl::SURFACE_TYPE,
        egl::WINDOW_BIT,
        egl::RED_SIZE,
        1,
        egl::GREEN_SIZE,
        1,
        egl::BLUE_SIZE,
        1,
        egl::DEPTH_SIZE,
        1,
        egl::RENDERABLE_TYPE,
        egl::OPENGL_ES2_BIT,
        egl::NONE,
    ];

    let mut candidates = Vec::with_capacity(32);
    instance
        .choose_config(display, &attribs, &mut candidates)
        .map_err(|_| Error::ConfigChooseFailed)?;

    // EGL's attribute matching treats ALPHA_SIZE as a minimum, so "0
    // alpha" (spec.md's requirement, not merely "at least 0") has to be
    // enforced by filtering the candidates rather than by the attribute
    // list itself.
    for candidate in &candidates {
        if instance
            .get_config_attrib(display, *candidate, egl::ALPHA_SIZE)
            .unwrap_or(-1)
            == 0
        {
            return Ok(*candidate);
        }
    }
    Err(Error::ConfigChooseFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts(s: &str) -> HashSet<String> {
        s.split_whitespace().map(str::to_owned).collect()
    }

    #[test]
    fn extension_match_is_whole_token() {
        let set = exts("FOOBAR BAZ");
        assert!(!set.contains("FOO"));
        let set = exts("BAZ FOO BAR");
        assert!(set.contains("FOO"));
    }

    #[test]
    fn missing_library_is_reported() {
        let err = open_first(&["definitely-not-a-real-library.so".to_string()]).unwrap_err();
        assert!(matches!(err, Error::LibraryNotFound(_)));
    }
}
