// Meter - tempo and meter of the free-running metronome (no song loaded)

use serde::{Deserialize, Serialize};

/// Free-running metronome settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub bpm: u32,
    pub beats: u32,
    pub subdivisions: u32,
}

impl Meter {
    /// Build a meter, raising any zero value to 1
    pub fn clamped(bpm: u32, beats: u32, subdivisions: u32) -> Self {
        if bpm == 0 || beats == 0 || subdivisions == 0 {
            log::warn!(
                "Meter values must be at least 1 (bpm {}, beats {}, subdivisions {}), clamping",
                bpm,
                beats,
                subdivisions
            );
        }
        Self {
            bpm: bpm.max(1),
            beats: beats.max(1),
            subdivisions: subdivisions.max(1),
        }
    }

    /// Same meter at another tempo
    pub fn with_bpm(self, bpm: u32) -> Self {
        Self::clamped(bpm, self.beats, self.subdivisions)
    }

    /// Ticks in one bar
    pub fn ticks_per_bar(&self) -> u64 {
        self.beats as u64 * self.subdivisions as u64
    }

    /// Transport rate giving one tick per sub-beat
    pub fn tick_rate(&self) -> f64 {
        self.bpm as f64 * self.subdivisions as f64
    }

    /// (beat, sub-beat) of an absolute tick
    pub fn position(&self, tick: u64) -> (u32, u32) {
        let subdivisions = self.subdivisions.max(1) as u64;
        let beats = self.beats.max(1) as u64;
        (
            ((tick / subdivisions) % beats) as u32,
            (tick % subdivisions) as u32,
        )
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self {
            bpm: 40,
            beats: 4,
            subdivisions: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamping() {
        let meter = Meter::clamped(0, 0, 0);
        assert_eq!(meter, Meter { bpm: 1, beats: 1, subdivisions: 1 });

        let meter = Meter::clamped(90, 7, 2);
        assert_eq!(meter.ticks_per_bar(), 14);
        assert_eq!(meter.tick_rate(), 180.0);
    }

    #[test]
    fn test_position_wraps_per_bar() {
        let meter = Meter::clamped(60, 3, 2);
        assert_eq!(meter.position(0), (0, 0));
        assert_eq!(meter.position(1), (0, 1));
        assert_eq!(meter.position(2), (1, 0));
        assert_eq!(meter.position(5), (2, 1));
        assert_eq!(meter.position(6), (0, 0));
    }
}
