// Song validation - keeps invalid tempo and meter values away from playback

use crate::song::types::{Bar, Song};

pub const MAX_TEMPO: u32 = 999;
pub const MAX_BEATS_PER_BAR: u32 = 32;
pub const MAX_SUBDIVISIONS: u32 = 32;
const MAX_NAME_LEN: usize = 255;

/// Song error types
#[derive(Debug, thiserror::Error)]
pub enum SongError {
    #[error("Bar {index}: tempo must be between 1 and {max} BPM (got {value})", max = MAX_TEMPO)]
    InvalidTempo { index: usize, value: u32 },

    #[error("Bar {index}: beats per bar must be between 1 and {max} (got {value})", max = MAX_BEATS_PER_BAR)]
    InvalidBeats { index: usize, value: u32 },

    #[error("Bar {index}: subdivisions must be between 1 and {max} (got {value})", max = MAX_SUBDIVISIONS)]
    InvalidSubdivisions { index: usize, value: u32 },

    #[error("Bar {index}: repeat count must be at least 1")]
    InvalidRepeatCount { index: usize },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Bar ids are not contiguous: bar at index {index} has id {id}")]
    NonContiguousIds { index: usize, id: usize },

    #[error("Bar not found: {0}")]
    BarNotFound(usize),

    #[error("Unsupported song file: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),
}

/// Check the playback fields of a single bar
pub fn validate_bar(index: usize, bar: &Bar) -> Result<(), SongError> {
    if bar.tempo == 0 || bar.tempo > MAX_TEMPO {
        return Err(SongError::InvalidTempo {
            index,
            value: bar.tempo,
        });
    }

    if bar.beats_per_bar == 0 || bar.beats_per_bar > MAX_BEATS_PER_BAR {
        return Err(SongError::InvalidBeats {
            index,
            value: bar.beats_per_bar,
        });
    }

    if bar.subdivisions == 0 || bar.subdivisions > MAX_SUBDIVISIONS {
        return Err(SongError::InvalidSubdivisions {
            index,
            value: bar.subdivisions,
        });
    }

    if bar.repeat_count == 0 {
        return Err(SongError::InvalidRepeatCount { index });
    }

    if bar.name.len() > MAX_NAME_LEN {
        return Err(SongError::InvalidName(format!(
            "bar {} name cannot exceed {} characters",
            index, MAX_NAME_LEN
        )));
    }

    Ok(())
}

/// Check a whole song, name included, as read from a file
pub fn validate_song(song: &Song) -> Result<(), SongError> {
    if song.name.trim().is_empty() {
        return Err(SongError::InvalidName(
            "song name cannot be empty".to_string(),
        ));
    }

    if song.name.len() > MAX_NAME_LEN {
        return Err(SongError::InvalidName(format!(
            "song name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }

    validate_bars(&song.bars)
}

/// Check the playback fields of every bar and that ids follow their index
pub fn validate_bars(bars: &[Bar]) -> Result<(), SongError> {
    for (index, bar) in bars.iter().enumerate() {
        if bar.id != index {
            return Err(SongError::NonContiguousIds { index, id: bar.id });
        }
        validate_bar(index, bar)?;
    }

    Ok(())
}
