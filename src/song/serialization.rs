// Song file formats - RON for hand-written songs, JSON for exchange with storage

use crate::song::types::Song;
use crate::song::validation::{SongError, validate_song};
use ron::ser::PrettyConfig;
use std::path::Path;

impl Song {
    pub fn from_ron_str(data: &str) -> Result<Self, SongError> {
        let mut song: Song = ron::from_str(data)?;
        song.renumber_bars();
        Ok(song)
    }

    pub fn to_ron_string(&self) -> Result<String, SongError> {
        Ok(ron::ser::to_string_pretty(self, PrettyConfig::default())?)
    }

    pub fn from_json_str(data: &str) -> Result<Self, SongError> {
        let mut song: Song = serde_json::from_str(data)?;
        song.renumber_bars();
        Ok(song)
    }

    pub fn to_json_string(&self) -> Result<String, SongError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a song file, picking the format from its extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SongError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        if extension != "ron" && extension != "json" {
            return Err(SongError::UnsupportedFormat(path.display().to_string()));
        }

        let data = std::fs::read_to_string(path)?;
        let song = if extension == "ron" {
            Self::from_ron_str(&data)?
        } else {
            Self::from_json_str(&data)?
        };

        validate_song(&song)?;
        log::debug!(
            "Loaded song '{}' ({} bars, {} ticks) from {}",
            song.name,
            song.bars.len(),
            song.total_length(),
            path.display()
        );
        Ok(song)
    }

    /// Save a song, picking the format from the extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SongError> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let data = match extension.to_lowercase().as_str() {
            "ron" => self.to_ron_string()?,
            "json" => self.to_json_string()?,
            _ => return Err(SongError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, data)?;
        Ok(())
    }
}
