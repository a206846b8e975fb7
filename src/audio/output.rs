// Realtime click output
//
// The scheduler runs on its own thread and hands clicks to the cpal callback
// through a lock-free SPSC ring buffer. The callback owns a `ClickPlayhead`,
// which starts every click at the frame matching its scheduled time, one
// buffer behind the transport.

use crate::audio::error::AudioError;
use crate::config::ClickSamplePaths;
use crate::sequencer::{ClickKit, ClickSink, ClickType, Metronome};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::{HeapRb, traits::Split};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A click handed from the scheduler to the audio callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickEvent {
    pub click: ClickType,
    /// Scheduled transport time in seconds
    pub at: f64,
}

pub type ClickProducer = ringbuf::HeapProd<ClickEvent>;
pub type ClickConsumer = ringbuf::HeapCons<ClickEvent>;

pub fn create_click_channel(capacity: usize) -> (ClickProducer, ClickConsumer) {
    let rb = HeapRb::<ClickEvent>::new(capacity);
    rb.split()
}

/// Scheduler-side end of the click channel
pub struct ChannelSink {
    tx: ClickProducer,
    loaded: Arc<AtomicBool>,
    dropped: u64,
}

impl ChannelSink {
    pub fn new(tx: ClickProducer, loaded: Arc<AtomicBool>) -> Self {
        Self {
            tx,
            loaded,
            dropped: 0,
        }
    }

    /// Clicks lost because the audio side fell behind
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl ClickSink for ChannelSink {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    fn trigger(&mut self, click: ClickType, at: f64) {
        let event = ClickEvent { click, at };
        if ringbuf::traits::Producer::try_push(&mut self.tx, event).is_err() {
            self.dropped += 1;
            log::warn!("Click queue full, dropped {:?} at {:.3}s", click, at);
        }
    }
}

/// Places scheduled clicks on the output frame clock
///
/// The first click of a play session (transport time not after the previous
/// click) anchors transport time zero one buffer after the current buffer.
/// Later clicks land at `anchor + at x sample_rate`, so delivery jitter of
/// less than a buffer never moves a click. Clicks that arrive past their
/// frame start immediately.
#[derive(Debug)]
pub struct ClickPlayhead {
    metronome: Metronome,
    sample_rate: f64,
    frame: u64,
    buffer_end: u64,
    anchor: f64,
    last_at: Option<f64>,
    pending: Option<(ClickType, u64)>,
}

impl ClickPlayhead {
    pub fn new(metronome: Metronome, sample_rate: u32) -> Self {
        Self {
            metronome,
            sample_rate: sample_rate as f64,
            frame: 0,
            buffer_end: 0,
            anchor: 0.0,
            last_at: None,
            pending: None,
        }
    }

    /// Call before rendering a buffer of `frames` frames
    pub fn begin_buffer(&mut self, frames: usize) {
        self.buffer_end = self.frame + frames as u64;
    }

    /// Render one frame, pulling clicks from `poll` as they come due
    pub fn next_sample(&mut self, mut poll: impl FnMut() -> Option<ClickEvent>) -> f32 {
        loop {
            if self.pending.is_none() {
                let Some(event) = poll() else { break };
                let frame = self.place(&event);
                self.pending = Some((event.click, frame));
            }
            match self.pending {
                Some((click, frame)) if frame <= self.frame => {
                    self.metronome.trigger_click(click);
                    self.pending = None;
                }
                _ => break,
            }
        }

        self.frame += 1;
        self.metronome.process_sample()
    }

    fn place(&mut self, event: &ClickEvent) -> u64 {
        let offset = event.at * self.sample_rate;
        if self.last_at.is_none_or(|last| event.at <= last) {
            self.anchor = self.buffer_end as f64 - offset;
        }
        self.last_at = Some(event.at);
        (self.anchor + offset).round().max(0.0) as u64
    }
}

/// Open output stream playing scheduler clicks
pub struct ClickOutput {
    _device: Device,
    _stream: Stream,
    sample_rate: u32,
}

impl ClickOutput {
    const QUEUE_CAPACITY: usize = 64;

    /// Open the default output device and return the sink feeding it
    ///
    /// Without sample paths the clicks are synthesized at the device rate.
    /// The sink reports loaded once the stream is playing.
    pub fn open(
        samples: Option<&ClickSamplePaths>,
        volume: f32,
    ) -> Result<(Self, ChannelSink), AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        log::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device.default_output_config()?;
        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0;
        log::debug!("Audio config: {:?}", supported_config);
        let config: StreamConfig = supported_config.into();

        let kit = match samples {
            Some(paths) => ClickKit::from_files(paths, sample_rate)?,
            None => ClickKit::synthesized(sample_rate as f32),
        };
        let mut metronome = Metronome::with_kit(kit);
        metronome.set_volume(volume);

        let (tx, rx) = create_click_channel(Self::QUEUE_CAPACITY);
        let playhead = ClickPlayhead::new(metronome, sample_rate);
        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, playhead, rx),
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, playhead, rx),
            SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, playhead, rx),
            other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
        }?;
        stream.play()?;

        let sink = ChannelSink::new(tx, Arc::new(AtomicBool::new(true)));
        Ok((
            Self {
                _device: device,
                _stream: stream,
                sample_rate,
            },
            sink,
        ))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        mut playhead: ClickPlayhead,
        mut rx: ClickConsumer,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let channels = config.channels as usize;
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // No allocations, no I/O, no locks
                playhead.begin_buffer(data.len() / channels);
                for frame in data.chunks_mut(channels) {
                    let sample =
                        playhead.next_sample(|| ringbuf::traits::Consumer::try_pop(&mut rx));
                    let value: T = Sample::from_sample::<f32>(sample);
                    for channel_sample in frame.iter_mut() {
                        *channel_sample = value;
                    }
                }
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )?;
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[test]
    fn test_channel_sink_delivers_clicks() {
        let (tx, mut rx) = create_click_channel(4);
        let loaded = Arc::new(AtomicBool::new(false));
        let mut sink = ChannelSink::new(tx, Arc::clone(&loaded));

        assert!(!sink.is_loaded());
        loaded.store(true, Ordering::Release);
        assert!(sink.is_loaded());

        sink.trigger(ClickType::Downbeat, 0.0);
        sink.trigger(ClickType::Subdivision, 0.25);

        let first = ringbuf::traits::Consumer::try_pop(&mut rx).unwrap();
        assert_eq!(first.click, ClickType::Downbeat);
        let second = ringbuf::traits::Consumer::try_pop(&mut rx).unwrap();
        assert_eq!(second.at, 0.25);
        assert!(ringbuf::traits::Consumer::try_pop(&mut rx).is_none());
    }

    fn playhead() -> ClickPlayhead {
        let mut metronome =
            Metronome::with_kit(ClickKit::new(vec![1.0; 2], vec![0.5; 2], vec![0.25; 2]));
        metronome.set_volume(1.0);
        ClickPlayhead::new(metronome, 1000)
    }

    /// Render `buffers` buffers of 10 frames; `deliver(n)` lists the clicks
    /// arriving during buffer `n`
    fn run(
        playhead: &mut ClickPlayhead,
        buffers: usize,
        deliver: impl Fn(usize) -> Vec<ClickEvent>,
    ) -> Vec<f32> {
        let mut queue = VecDeque::new();
        let mut output = Vec::new();
        for buffer in 0..buffers {
            queue.extend(deliver(buffer));
            playhead.begin_buffer(10);
            for _ in 0..10 {
                output.push(playhead.next_sample(|| queue.pop_front()));
            }
        }
        output
    }

    fn onsets(output: &[f32]) -> Vec<usize> {
        (0..output.len())
            .filter(|&i| output[i] != 0.0 && (i == 0 || output[i - 1] == 0.0))
            .collect()
    }

    fn event(click: ClickType, at: f64) -> ClickEvent {
        ClickEvent { click, at }
    }

    #[test]
    fn test_playhead_places_clicks_at_scheduled_frames() {
        let output = run(&mut playhead(), 4, |buffer| match buffer {
            0 => vec![
                event(ClickType::Downbeat, 0.0),
                event(ClickType::Subdivision, 0.005),
            ],
            _ => vec![],
        });

        assert!(output[..10].iter().all(|s| *s == 0.0));
        assert_eq!(onsets(&output), vec![10, 15]);
        assert_eq!(output[10], 1.0);
        assert_eq!(output[15], 0.25);
    }

    #[test]
    fn test_playhead_absorbs_delivery_jitter() {
        // The same click delivered one buffer apart starts on the same frame
        for late_buffer in [1, 2] {
            let output = run(&mut playhead(), 5, |buffer| {
                if buffer == 0 {
                    vec![event(ClickType::Downbeat, 0.0)]
                } else if buffer == late_buffer {
                    vec![event(ClickType::BeatStart, 0.013)]
                } else {
                    vec![]
                }
            });
            assert_eq!(onsets(&output), vec![10, 23]);
            assert_eq!(output[23], 0.5);
        }
    }

    #[test]
    fn test_playhead_reanchors_on_restart() {
        let output = run(&mut playhead(), 8, |buffer| match buffer {
            0 => vec![event(ClickType::Downbeat, 0.0)],
            5 => vec![event(ClickType::Downbeat, 0.0)],
            _ => vec![],
        });
        assert_eq!(onsets(&output), vec![10, 60]);
    }

    #[test]
    fn test_playhead_plays_overdue_click_at_once() {
        let output = run(&mut playhead(), 6, |buffer| match buffer {
            0 => vec![event(ClickType::Downbeat, 0.0)],
            4 => vec![event(ClickType::Subdivision, 0.005)],
            _ => vec![],
        });
        assert_eq!(onsets(&output), vec![10, 40]);
    }

    #[test]
    fn test_channel_sink_counts_overflow() {
        let (tx, _rx) = create_click_channel(2);
        let mut sink = ChannelSink::new(tx, Arc::new(AtomicBool::new(true)));
        for _ in 0..5 {
            sink.trigger(ClickType::BeatStart, 0.0);
        }
        assert_eq!(sink.dropped(), 3);
    }
}
