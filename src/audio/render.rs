// Offline render - bounce a song's click track to a buffer or WAV file
//
// The scheduler runs against `ManualTransport`, so every click carries its
// exact scheduled time; clicks are placed at `time x sample_rate`.

use crate::audio::error::AudioError;
use crate::audio::output::ClickEvent;
use crate::sequencer::{ClickKit, ClickSink, ClickType, ManualTransport, Metronome, Scheduler};
use crate::song::{Song, SongError};
use hound::{WavSpec, WavWriter};
use std::path::Path;

/// Sink that keeps every click for later rendering
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<ClickEvent>,
}

impl ClickSink for RecordingSink {
    fn is_loaded(&self) -> bool {
        true
    }

    fn trigger(&mut self, click: ClickType, at: f64) {
        self.events.push(ClickEvent { click, at });
    }
}

/// Schedule the whole song and return its clicks in order
pub fn schedule_song(song: &Song) -> Result<Vec<ClickEvent>, SongError> {
    let mut scheduler = Scheduler::new(ManualTransport::new(), RecordingSink::default());
    scheduler.set_song(song.clone())?;

    let total = song.total_length();
    if total == 0 {
        return Ok(Vec::new());
    }

    scheduler.start();
    // One extra tick reaches the end of the song
    scheduler.run_until_stopped(Some(total + 1));
    Ok(std::mem::take(&mut scheduler.sink_mut().events))
}

/// Render the click track of `song` as mono samples
pub fn render_song(
    song: &Song,
    kit: ClickKit,
    sample_rate: u32,
    volume: f32,
) -> Result<Vec<f32>, SongError> {
    let events = schedule_song(song)?;
    let tail = kit.max_click_len();
    let length = (song.duration_seconds() * sample_rate as f64).ceil() as usize + tail;

    let mut metronome = Metronome::with_kit(kit);
    metronome.set_volume(volume);

    let mut output = vec![0.0f32; length];
    let mut pending = events.iter().peekable();
    for (index, sample) in output.iter_mut().enumerate() {
        while let Some(event) = pending.next_if(|event| {
            (event.at * sample_rate as f64).round() as usize <= index
        }) {
            metronome.trigger_click(event.click);
        }
        *sample = metronome.process_sample();
    }

    log::debug!(
        "Rendered '{}': {} clicks, {} samples at {} Hz",
        song.name,
        events.len(),
        length,
        sample_rate
    );
    Ok(output)
}

/// Convert f32 sample to i16, clamping to [-1.0, 1.0]
#[inline]
fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped >= 0.0 {
        (clamped * i16::MAX as f32) as i16
    } else {
        (clamped * -(i16::MIN as f32)) as i16
    }
}

/// Write mono samples as a 16-bit WAV file
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    for sample in samples {
        writer.write_sample(f32_to_i16(*sample))?;
    }
    writer.finalize()?;

    log::info!(
        "Wrote {} ({:.2}s)",
        path.as_ref().display(),
        samples.len() as f64 / sample_rate as f64
    );
    Ok(())
}
