//! Configuration for the render-scheduling core.
//!
//! Layout, input and keybinding configuration are out of scope (owned by
//! the host compositor); this only covers the tunables the render core
//! itself reads at startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level configuration for the render core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Candidate sonames to try, in order, when opening the native GL
    /// context library. Defaults to the two names commonly used for EGL.
    pub egl_library_names: Vec<String>,

    /// Background compositing settings.
    pub background: BackgroundConfig,

    /// Idle interval bounds, in milliseconds. `spec.md` fixes these at
    /// `[1, 41]`; the field exists so tests can narrow the range without
    /// touching scheduler code, but production configs should leave the
    /// defaults alone.
    pub idle_interval: IdleIntervalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundConfig {
    /// Whether the compositor draws a background layer at all. When
    /// disabled, the scheduler clears to `clear_color` every frame
    /// instead of computing view-coverage visibility.
    pub enabled: bool,

    /// Clear color used when backgrounds are disabled, as linear RGBA.
    pub clear_color: [f32; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleIntervalConfig {
    pub floor_ms: f32,
    pub ceiling_ms: f32,
    /// Multiplier applied while there was activity (converges downward).
    pub decay_active: f32,
    /// Multiplier applied while idle (backs off upward).
    pub decay_idle: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            egl_library_names: vec!["libEGL.so.1".to_string(), "libEGL.so".to_string()],
            background: BackgroundConfig::default(),
            idle_interval: IdleIntervalConfig::default(),
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Default for IdleIntervalConfig {
    fn default() -> Self {
        Self {
            floor_ms: 1.0,
            ceiling_ms: 41.0,
            decay_active: 0.9,
            decay_idle: 1.1,
        }
    }
}

impl RenderConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// any field the file omits.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: RenderConfig = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.egl_library_names.is_empty() {
            anyhow::bail!("egl_library_names must list at least one library to try");
        }
        let i = &self.idle_interval;
        if !(i.floor_ms > 0.0 && i.floor_ms <= i.ceiling_ms) {
            anyhow::bail!(
                "invalid idle interval bounds: floor_ms={} ceiling_ms={}",
                i.floor_ms,
                i.ceiling_ms
            );
        }
        if i.decay_active <= 0.0 || i.decay_active > 1.0 {
            anyhow::bail!("idle_interval.decay_active must be in (0, 1]");
        }
        if i.decay_idle < 1.0 {
            anyhow::bail!("idle_interval.decay_idle must be >= 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        RenderConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_inverted_bounds() {
        let mut cfg = RenderConfig::default();
        cfg.idle_interval.floor_ms = 50.0;
        cfg.idle_interval.ceiling_ms = 10.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_roundtrips_through_toml() {
        let cfg = RenderConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.toml");
        std::fs::write(&path, text).unwrap();
        let loaded = RenderConfig::load(&path).unwrap();
        assert_eq!(loaded.idle_interval.floor_ms, cfg.idle_interval.floor_ms);
    }
}
