use crate::data::Viewport;
use crate::particles::DEFAULT_MAX_PARTICLES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub session: SessionSettings,
    pub viewport: ViewportSettings,
    pub content: ContentSettings,
    pub narration: NarrationSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub tick_rate_hz: u16,
    /// Seeds particle jitter and cloud layout
    pub seed: u64,
    pub max_particles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    /// Route file (YAML or JSON); the built-in route is used when unset
    pub route: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationSettings {
    pub enabled: bool,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub console_enabled: bool,
    /// Log file directory for the interactive terminal mode
    pub dir: Option<PathBuf>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            seed: 0x5EED_2025,
            max_particles: DEFAULT_MAX_PARTICLES,
        }
    }
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 4000,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_enabled: true,
            dir: None,
        }
    }
}

impl SimConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: SimConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            warn!("Failed to load config {}: {}, using defaults", path.display(), e);
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.tick_rate_hz == 0 {
            return Err(ConfigError::Invalid("session.tick_rate_hz must be > 0".to_string()));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "viewport must be non-zero, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.viewport.width as f32,
            height: self.viewport.height as f32,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.session.tick_rate_hz.max(1) as f64)
    }

    pub fn narration_timeout(&self) -> Duration {
        Duration::from_millis(self.narration.timeout_ms)
    }
}
