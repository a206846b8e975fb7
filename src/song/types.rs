// Song and bar records
// A song owns an ordered list of bars; each bar carries its own tempo and meter

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One section of a song played at a fixed tempo and meter
///
/// `id` is the bar's index inside its song. It is rewritten after every
/// structural edit, so it never identifies a bar outside of its song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub id: usize,
    pub name: String,
    /// Tempo in beats per minute
    pub tempo: u32,
    /// Time signature numerator (beats counted per bar)
    pub beats_per_bar: u32,
    /// Clicks per beat
    pub subdivisions: u32,
    /// How many times the bar is played back to back
    pub repeat_count: u32,
    /// Reserved, playback ignores it
    #[serde(default)]
    pub delay: u32,
}

impl Bar {
    /// Create a bar with the given tempo and meter, played once
    pub fn new(name: impl Into<String>, tempo: u32, beats_per_bar: u32, subdivisions: u32) -> Self {
        Self {
            id: 0,
            name: name.into(),
            tempo,
            beats_per_bar,
            subdivisions,
            repeat_count: 1,
            delay: 0,
        }
    }

    /// The bar offered when a song has no bars yet
    pub fn starter() -> Self {
        Self::new("Lento", 40, 4, 4).with_repeat_count(2)
    }

    /// Builder-style repeat count
    pub fn with_repeat_count(mut self, repeat_count: u32) -> Self {
        self.repeat_count = repeat_count;
        self
    }

    /// Ticks occupied by one pass through the bar
    pub fn ticks_per_repeat(&self) -> u64 {
        self.beats_per_bar as u64 * self.subdivisions as u64
    }

    /// Ticks occupied by the bar including all of its repeats
    pub fn block_length(&self) -> u64 {
        self.repeat_count as u64 * self.ticks_per_repeat()
    }

    /// Rate the transport must run at so that one tick lands on every sub-beat
    pub fn tick_rate(&self) -> f64 {
        self.tempo as f64 * self.subdivisions as f64
    }

    /// Wall-clock length of the bar in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.tempo == 0 || self.subdivisions == 0 {
            return 0.0;
        }
        self.block_length() as f64 * 60.0 / self.tick_rate()
    }
}

impl Default for Bar {
    fn default() -> Self {
        Self::new("Default", 120, 4, 1)
    }
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} BPM, {}x{} x{})",
            self.name, self.tempo, self.beats_per_bar, self.subdivisions, self.repeat_count
        )
    }
}

/// A named sequence of bars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: Uuid,
    pub name: String,
    pub instrument: String,
    #[serde(default)]
    pub favorite: bool,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    #[serde(default)]
    pub bars: Vec<Bar>,
}

impl Song {
    /// Create an empty song
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            instrument: "Piano".to_string(),
            favorite: false,
            created_at: chrono::Utc::now().to_rfc3339(),
            bars: Vec::new(),
        }
    }

    /// Create a song from a list of bars, numbering them in order
    pub fn with_bars(name: impl Into<String>, bars: Vec<Bar>) -> Self {
        let mut song = Self::new(name);
        song.bars = bars;
        song.renumber_bars();
        song
    }

    /// Total ticks across every bar
    pub fn total_length(&self) -> u64 {
        self.bars.iter().map(Bar::block_length).sum()
    }

    /// Total playing time in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.bars.iter().map(Bar::duration_seconds).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn toggle_favorite(&mut self) {
        self.favorite = !self.favorite;
    }

    /// Reassign bar ids so they match their index
    pub fn renumber_bars(&mut self) {
        for (index, bar) in self.bars.iter_mut().enumerate() {
            bar.id = index;
        }
    }
}

impl Default for Song {
    fn default() -> Self {
        Self::new("New Song")
    }
}
