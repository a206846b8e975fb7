// Position resolver
// Maps an absolute tick counter onto the bar sequence of a song

use crate::song::Bar;

/// Where a tick falls inside the song
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarPosition {
    pub bar_index: usize,
    /// Tick at which the bar (first repeat) starts
    pub bar_start: u64,
    pub beats_per_bar: u32,
    pub subdivisions: u32,
    pub tempo: u32,
    /// Beat within the bar (0-based)
    pub beat: u32,
    /// Sub-beat within the beat (0-based)
    pub sub_beat: u32,
    /// Which pass through a repeated bar (0-based)
    pub repeat: u32,
}

impl BarPosition {
    pub fn is_downbeat(&self) -> bool {
        self.beat == 0 && self.sub_beat == 0
    }

    /// Rate the transport must run at so one tick lands on every sub-beat
    pub fn tick_rate(&self) -> f64 {
        self.tempo as f64 * self.subdivisions as f64
    }
}

/// Result of resolving a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Bar(BarPosition),
    /// The tick is past the last bar
    EndOfSong,
    /// Nothing to play (no bars, or a bar with a zero divisor)
    Empty,
}

/// Resolve `tick` against `bars` with a full scan
pub fn resolve(tick: u64, bars: &[Bar]) -> Resolution {
    if bars.is_empty() {
        return Resolution::Empty;
    }

    let mut bar_start = 0u64;
    for (bar_index, bar) in bars.iter().enumerate() {
        if bar.beats_per_bar == 0 || bar.subdivisions == 0 {
            return Resolution::Empty;
        }

        let block_length = bar.block_length();
        if tick < bar_start + block_length {
            return Resolution::Bar(position_in_bar(tick, bar_index, bar_start, bar));
        }
        bar_start += block_length;
    }

    Resolution::EndOfSong
}

fn position_in_bar(tick: u64, bar_index: usize, bar_start: u64, bar: &Bar) -> BarPosition {
    let offset = tick - bar_start;
    let subdivisions = bar.subdivisions as u64;
    let beats = bar.beats_per_bar as u64;

    BarPosition {
        bar_index,
        bar_start,
        beats_per_bar: bar.beats_per_bar,
        subdivisions: bar.subdivisions,
        tempo: bar.tempo,
        beat: ((offset / subdivisions) % beats) as u32,
        sub_beat: (offset % subdivisions) as u32,
        repeat: (offset / bar.ticks_per_repeat()) as u32,
    }
}

/// Resolver that remembers the last bar interval it hit
///
/// Consecutive ticks almost always land in the same bar, so the cached
/// interval is checked first. Any miss falls back to [`resolve`].
#[derive(Debug, Clone, Default)]
pub struct CachedResolver {
    last: Option<(usize, u64, u64)>, // (bar index, start, end)
}

impl CachedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the cached interval (the bar sequence changed)
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn resolve(&mut self, tick: u64, bars: &[Bar]) -> Resolution {
        if let Some((bar_index, start, end)) = self.last
            && tick >= start
            && tick < end
            && let Some(bar) = bars.get(bar_index)
            && bar.block_length() == end - start
            && bar.beats_per_bar > 0
            && bar.subdivisions > 0
        {
            return Resolution::Bar(position_in_bar(tick, bar_index, start, bar));
        }

        let resolution = resolve(tick, bars);
        self.last = match resolution {
            Resolution::Bar(pos) => {
                let length = bars[pos.bar_index].block_length();
                Some((pos.bar_index, pos.bar_start, pos.bar_start + length))
            }
            _ => None,
        };
        resolution
    }
}
