// Metronome - Click sounds and the sink the scheduler triggers
// Three click sounds: downbeat, start of a beat, and the sub-beats in between

use std::f32::consts::PI;

/// Which click to play on a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickType {
    /// First sub-beat of the first beat of a bar
    Downbeat,
    /// First sub-beat of any other beat, when beats are subdivided
    BeatStart,
    /// Every other tick
    Subdivision,
}

impl ClickType {
    /// Pick the click for a position; exactly one click per tick
    pub fn select(beat: u32, sub_beat: u32, subdivisions: u32) -> Self {
        if beat == 0 && sub_beat == 0 {
            ClickType::Downbeat
        } else if sub_beat == 0 && subdivisions > 1 {
            ClickType::BeatStart
        } else {
            ClickType::Subdivision
        }
    }

    pub const ALL: [ClickType; 3] = [
        ClickType::Downbeat,
        ClickType::BeatStart,
        ClickType::Subdivision,
    ];
}

/// Destination of the scheduler's clicks
pub trait ClickSink {
    /// False while sounds are still loading; triggers are skipped until then
    fn is_loaded(&self) -> bool;

    /// Play `click` at transport time `at` (seconds)
    fn trigger(&mut self, click: ClickType, at: f64);
}

/// One mono buffer per click type
#[derive(Debug, Clone)]
pub struct ClickKit {
    downbeat: Vec<f32>,
    beat_start: Vec<f32>,
    subdivision: Vec<f32>,
}

impl ClickKit {
    /// Duration of a synthesized click
    const CLICK_DURATION_MS: f32 = 10.0;

    pub fn new(downbeat: Vec<f32>, beat_start: Vec<f32>, subdivision: Vec<f32>) -> Self {
        Self {
            downbeat,
            beat_start,
            subdivision,
        }
    }

    /// Short decaying sine clicks, highest and loudest on the downbeat
    pub fn synthesized(sample_rate: f32) -> Self {
        let click_samples = ((Self::CLICK_DURATION_MS / 1000.0) * sample_rate) as usize;

        Self {
            downbeat: Self::generate_click(sample_rate, click_samples, 1500.0, 0.6),
            beat_start: Self::generate_click(sample_rate, click_samples, 1000.0, 0.45),
            subdivision: Self::generate_click(sample_rate, click_samples, 700.0, 0.3),
        }
    }

    fn generate_click(
        sample_rate: f32,
        num_samples: usize,
        frequency: f32,
        amplitude: f32,
    ) -> Vec<f32> {
        let phase_increment = 2.0 * PI * frequency / sample_rate;

        (0..num_samples)
            .map(|i| {
                let t = i as f32 / num_samples as f32;
                let envelope = (-t * 8.0).exp();
                (i as f32 * phase_increment).sin() * envelope * amplitude
            })
            .collect()
    }

    pub fn get_click(&self, click_type: ClickType) -> &[f32] {
        match click_type {
            ClickType::Downbeat => &self.downbeat,
            ClickType::BeatStart => &self.beat_start,
            ClickType::Subdivision => &self.subdivision,
        }
    }

    /// Longest click in samples
    pub fn max_click_len(&self) -> usize {
        ClickType::ALL
            .iter()
            .map(|click| self.get_click(*click).len())
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
struct ClickPlayback {
    click_type: ClickType,
    position: usize,
}

/// Monophonic click renderer
/// A new click replaces the one still ringing
#[derive(Debug, Clone)]
pub struct Metronome {
    kit: Option<ClickKit>,
    enabled: bool,
    volume: f32,
    current_click: Option<ClickPlayback>,
}

impl Metronome {
    /// Metronome without sounds; it reports not loaded until a kit is set
    pub fn new() -> Self {
        Self {
            kit: None,
            enabled: true,
            volume: 0.5,
            current_click: None,
        }
    }

    pub fn with_kit(kit: ClickKit) -> Self {
        let mut metronome = Self::new();
        metronome.set_kit(kit);
        metronome
    }

    pub fn set_kit(&mut self, kit: ClickKit) {
        self.kit = Some(kit);
        self.current_click = None;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.current_click = None;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Set volume (0.0 to 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn trigger_click(&mut self, click_type: ClickType) {
        if !self.enabled || self.kit.is_none() {
            return;
        }

        self.current_click = Some(ClickPlayback {
            click_type,
            position: 0,
        });
    }

    /// Next output sample (0.0 when silent)
    pub fn process_sample(&mut self) -> f32 {
        let (Some(kit), Some(playback)) = (&self.kit, &mut self.current_click) else {
            return 0.0;
        };

        let click_samples = kit.get_click(playback.click_type);
        if playback.position < click_samples.len() {
            let sample = click_samples[playback.position] * self.volume;
            playback.position += 1;
            sample
        } else {
            self.current_click = None;
            0.0
        }
    }

    pub fn process_buffer(&mut self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            *sample = self.process_sample();
        }
    }

    pub fn is_ringing(&self) -> bool {
        self.current_click.is_some()
    }

    pub fn reset(&mut self) {
        self.current_click = None;
    }
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new()
    }
}

impl ClickSink for Metronome {
    fn is_loaded(&self) -> bool {
        self.kit.is_some()
    }

    fn trigger(&mut self, click: ClickType, _at: f64) {
        self.trigger_click(click);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }

    #[test]
    fn test_click_selection_priority() {
        // Downbeat wins even without subdivisions
        assert_eq!(ClickType::select(0, 0, 1), ClickType::Downbeat);
        assert_eq!(ClickType::select(0, 0, 4), ClickType::Downbeat);
        // Beat start only when beats are subdivided
        assert_eq!(ClickType::select(2, 0, 2), ClickType::BeatStart);
        assert_eq!(ClickType::select(2, 0, 1), ClickType::Subdivision);
        assert_eq!(ClickType::select(0, 1, 2), ClickType::Subdivision);
    }

    #[test]
    fn test_synthesized_kit() {
        let kit = ClickKit::synthesized(48000.0);

        for click in ClickType::ALL {
            // 10ms at 48kHz
            assert_eq!(kit.get_click(click).len(), 480);
        }
        assert_eq!(kit.max_click_len(), 480);

        let downbeat = peak(kit.get_click(ClickType::Downbeat));
        let beat = peak(kit.get_click(ClickType::BeatStart));
        let sub = peak(kit.get_click(ClickType::Subdivision));
        assert!(downbeat > beat);
        assert!(beat > sub);
    }

    #[test]
    fn test_unloaded_metronome_is_silent() {
        let mut metronome = Metronome::new();
        assert!(!metronome.is_loaded());

        metronome.trigger(ClickType::Downbeat, 0.0);
        assert!(!metronome.is_ringing());
        assert_eq!(metronome.process_sample(), 0.0);
    }

    #[test]
    fn test_click_playback() {
        let mut metronome = Metronome::with_kit(ClickKit::synthesized(48000.0));
        assert!(metronome.is_loaded());
        assert_eq!(metronome.process_sample(), 0.0);

        metronome.trigger(ClickType::Downbeat, 0.0);

        let mut non_zero_count = 0;
        for _ in 0..500 {
            if metronome.process_sample().abs() > 0.0001 {
                non_zero_count += 1;
            }
        }
        assert!(non_zero_count > 400);

        assert_eq!(metronome.process_sample(), 0.0);
        assert!(!metronome.is_ringing());
    }

    #[test]
    fn test_volume_control() {
        let mut metronome = Metronome::with_kit(ClickKit::synthesized(48000.0));

        metronome.set_volume(0.5);
        metronome.trigger_click(ClickType::Downbeat);
        let mut half = vec![0.0f32; 500];
        metronome.process_buffer(&mut half);

        metronome.reset();
        metronome.set_volume(1.0);
        metronome.trigger_click(ClickType::Downbeat);
        let mut full = vec![0.0f32; 500];
        metronome.process_buffer(&mut full);

        assert!(peak(&full) > peak(&half) * 1.8);
        assert!(peak(&full) < peak(&half) * 2.2);

        metronome.set_volume(3.0);
        assert_eq!(metronome.volume(), 1.0);
    }

    #[test]
    fn test_disabled_metronome() {
        let mut metronome = Metronome::with_kit(ClickKit::synthesized(48000.0));
        metronome.set_enabled(false);
        assert!(!metronome.is_enabled());

        metronome.trigger_click(ClickType::Downbeat);
        assert_eq!(metronome.process_sample(), 0.0);
    }

    #[test]
    fn test_new_click_replaces_ringing_click() {
        let mut metronome = Metronome::with_kit(ClickKit::synthesized(48000.0));
        metronome.trigger_click(ClickType::Downbeat);
        let mut buffer = vec![0.0f32; 300];
        metronome.process_buffer(&mut buffer);

        metronome.trigger_click(ClickType::Subdivision);
        let mut rest = vec![0.0f32; 480];
        metronome.process_buffer(&mut rest);
        // The replacement click plays in full, then silence
        assert!(rest.iter().take(470).any(|s| s.abs() > 0.0001));
        assert_eq!(metronome.process_sample(), 0.0);
    }
}
