// Display state published by the scheduler after every tick

use std::fmt;

/// What the presentation layer shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayState {
    /// Absolute tick counter (-1 right after start, before the first tick)
    pub counter: i64,
    /// Bar being played, when a song is loaded
    pub bar_index: Option<usize>,
    pub beat: u32,
    pub sub_beat: u32,
    pub beats_per_bar: u32,
    pub subdivisions: u32,
    pub tempo: u32,
    pub sample_loaded: bool,
    pub playing: bool,
}

impl DisplayState {
    /// Tick within the current bar, as shown next to the absolute counter
    pub fn normalized_counter(&self) -> u32 {
        self.beat * self.subdivisions + self.sub_beat
    }
}

impl fmt::Display for DisplayState {
    /// 1-based "beat.sub-beat", e.g. `3.2`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.beat + 1, self.sub_beat + 1)
    }
}
