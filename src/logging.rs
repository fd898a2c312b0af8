//! Logging bring-up.
//!
//! Mirrors the `env_logger::Builder::from_env` pattern used by the host
//! compositor's own `main.rs`; this crate just gives it a name so library
//! consumers (and tests) don't have to duplicate the filter defaulting.

/// Initialize `env_logger` with `level` as the default filter, honoring
/// `RUST_LOG` when set. Safe to call more than once; later calls are
/// no-ops once a logger is installed.
pub fn init(default_level: &str) {
    let _ =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .is_test(cfg!(test))
            .try_init();
}
