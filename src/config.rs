// Application configuration, stored as RON

use crate::sequencer::Meter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),
}

/// Files for the three click sounds (.wav or .flac)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickSamplePaths {
    pub downbeat: PathBuf,
    pub beat: PathBuf,
    pub subdivision: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Meter used when no song is loaded
    pub meter: Meter,
    /// Click volume (0.0 to 1.0)
    pub volume: f32,
    /// Click sounds; synthesized clicks are used when absent
    pub click_samples: Option<ClickSamplePaths>,
    /// Sample rate for offline rendering
    pub render_sample_rate: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            meter: Meter::default(),
            volume: 0.8,
            click_samples: None,
            render_sample_rate: 44100,
        }
    }
}

impl AppConfig {
    /// Default location: `<config dir>/songclick/config.ron`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("songclick").join("config.ron"))
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = ron::from_str(text)?;
        Ok(config.sanitized())
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&text)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing file yields the defaults. A file that exists but fails to
    /// parse is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => {
                    log::debug!("No config directory on this platform, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    fn sanitized(mut self) -> Self {
        self.meter = Meter::clamped(self.meter.bpm, self.meter.beats, self.meter.subdivisions);
        self.volume = self.volume.clamp(0.0, 1.0);
        if self.render_sample_rate == 0 {
            log::warn!("render_sample_rate of 0 replaced with 44100");
            self.render_sample_rate = 44100;
        }
        self
    }
}
