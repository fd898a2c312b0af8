//! Error kinds for bring-up and per-frame failures.
//!
//! Bring-up errors (context/output construction) are fatal to the caller
//! and propagate as `Err`. Per-frame errors degrade silently per
//! `spec.md` §7 and never reach this type; they are logged and the frame
//! is skipped instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not locate the native GL context library: {0}")]
    LibraryNotFound(String),

    #[error("required symbol missing from the GL context library: {0}")]
    SymbolMissing(String),

    #[error("failed to initialize the EGL display: {0}")]
    DisplayInitFailed(String),

    #[error("no EGL config matched the requested attributes")]
    ConfigChooseFailed,

    #[error("failed to create the EGL context: {0}")]
    ContextCreateFailed(String),

    #[error("failed to create the EGL window surface: {0}")]
    SurfaceCreateFailed(String),

    #[error("eglMakeCurrent failed: {0}")]
    MakeCurrentFailed(String),

    #[error("allocation failed ({0} bytes)")]
    AllocationFailed(usize),

    #[error("renderer failed to bind to the output")]
    RendererBindFailed,
}

pub type Result<T> = std::result::Result<T, Error>;
