// Scheduler - Drives the click track from the transport's recurring tick
//
// One tick per sub-beat. Each tick advances the counter, resolves it against
// the loaded song (or the free-running meter), moves the transport to the
// bar's tempo when a new bar begins, and fires exactly one click.
//
// All mutation happens either inside `on_tick` or through the public
// operations, which run between ticks. Only one recurring registration is
// ever active; ticks from any other registration are dropped.

use super::display::DisplayState;
use super::meter::Meter;
use super::metronome::{ClickSink, ClickType};
use super::resolver::{CachedResolver, Resolution};
use super::transport::{NoteValue, RecurringHandle, Tick, Transport};
use crate::song::{Song, SongError, validate_bars};

/// Click-track scheduler owning one transport for its play sessions
#[derive(Debug)]
pub struct Scheduler<T: Transport, S: ClickSink> {
    transport: T,
    sink: S,
    song: Option<Song>,
    meter: Meter,
    resolver: CachedResolver,
    counter: i64,
    /// Start tick of the bar whose tempo the transport is running at
    cached_bar_start: Option<u64>,
    registration: Option<RecurringHandle>,
    display: DisplayState,
}

impl<T: Transport, S: ClickSink> Scheduler<T, S> {
    /// Create a stopped scheduler in free-running mode
    pub fn new(transport: T, sink: S) -> Self {
        let meter = Meter::default();
        Self {
            transport,
            sink,
            song: None,
            meter,
            resolver: CachedResolver::new(),
            counter: 0,
            cached_bar_start: None,
            registration: None,
            display: DisplayState {
                beats_per_bar: meter.beats,
                subdivisions: meter.subdivisions,
                tempo: meter.bpm,
                ..Default::default()
            },
        }
    }

    /// Start from the top of the song (or bar one of the free meter)
    pub fn start(&mut self) {
        if self.is_playing() {
            log::debug!("Start ignored, already playing");
            return;
        }

        self.counter = -1;
        self.cached_bar_start = None;
        self.resolver.invalidate();
        if self.song.is_none() {
            self.transport.set_bpm(self.meter.tick_rate());
        }

        self.transport.start();
        self.install_registration();
        log::info!(
            "Playback started ({})",
            self.song
                .as_ref()
                .map(|song| format!("song '{}'", song.name))
                .unwrap_or_else(|| "free metronome".to_string())
        );
    }

    /// Stop the transport, rewind it, and detach the recurring tick
    pub fn stop(&mut self) {
        if self.registration.is_none() && !self.transport.state().is_started() {
            return;
        }

        self.transport.stop();
        self.transport.set_seconds(0.0);
        if let Some(handle) = self.registration.take() {
            self.transport.cancel(handle);
        }
        log::info!("Playback stopped at tick {}", self.counter);
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.stop();
        } else {
            self.start();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.registration.is_some()
    }

    /// Swap the song; the next tick resolves against it
    ///
    /// The counter and transport are left alone, so a song shorter than the
    /// current position ends playback on the next tick. A song with an
    /// unplayable bar is rejected and the previous one stays loaded; the song
    /// name plays no part here.
    pub fn set_song(&mut self, song: Song) -> Result<(), SongError> {
        validate_bars(&song.bars)?;
        log::debug!(
            "Song '{}' loaded ({} bars, {} ticks)",
            song.name,
            song.bars.len(),
            song.total_length()
        );
        self.song = Some(song);
        self.resolver.invalidate();
        self.cached_bar_start = None;
        Ok(())
    }

    /// Drop the song and return to the free-running meter
    pub fn clear_song(&mut self) {
        if self.song.take().is_some() {
            self.resolver.invalidate();
            self.cached_bar_start = None;
            if self.is_playing() {
                self.transport.set_bpm(self.meter.tick_rate());
            }
            log::debug!("Song cleared, free metronome at {} BPM", self.meter.bpm);
        }
    }

    /// Change the free-running meter
    ///
    /// While playing without a song, the counter restarts at 0 and a fresh
    /// registration replaces the old one, so the change lands on the next tick.
    /// Zero values are clamped to 1.
    pub fn set_beats_and_subdivisions(&mut self, beats: u32, subdivisions: u32) {
        self.meter = Meter::clamped(self.meter.bpm, beats, subdivisions);

        if self.song.is_some() {
            log::debug!(
                "Meter {}x{} stored, the loaded song sets the meter",
                self.meter.beats,
                self.meter.subdivisions
            );
            return;
        }

        if self.is_playing() {
            self.counter = 0;
            self.transport.set_bpm(self.meter.tick_rate());
            self.install_registration();
        }
        self.display.beats_per_bar = self.meter.beats;
        self.display.subdivisions = self.meter.subdivisions;
        log::debug!(
            "Meter set to {} beats x {} subdivisions",
            self.meter.beats,
            self.meter.subdivisions
        );
    }

    /// Change the free-running tempo, effective from the next tick
    pub fn set_tempo(&mut self, bpm: u32) {
        self.meter = self.meter.with_bpm(bpm);
        if self.song.is_none() {
            self.display.tempo = self.meter.bpm;
            if self.is_playing() {
                self.transport.set_bpm(self.meter.tick_rate());
            }
        }
    }

    /// Handle one firing of the recurring tick
    pub fn on_tick(&mut self, tick: Tick) {
        if self.registration != Some(tick.handle) {
            log::trace!("Dropping stale tick from registration {}", tick.handle);
            return;
        }

        self.counter += 1;
        let position = self.counter.max(0) as u64;

        let (bar_index, beat, sub_beat, beats_per_bar, subdivisions, tempo) = match &self.song {
            Some(song) => match self.resolver.resolve(position, &song.bars) {
                Resolution::EndOfSong => {
                    self.counter -= 1;
                    log::info!("End of song '{}'", song.name);
                    self.stop();
                    return;
                }
                Resolution::Empty => {
                    log::trace!("Tick {} with nothing to play", position);
                    self.display = DisplayState {
                        counter: self.counter,
                        bar_index: None,
                        beat: 0,
                        sub_beat: 0,
                        playing: true,
                        ..self.display
                    };
                    return;
                }
                Resolution::Bar(pos) => {
                    if self.cached_bar_start != Some(pos.bar_start) {
                        self.transport.schedule_tempo(pos.tick_rate(), tick.time);
                        self.cached_bar_start = Some(pos.bar_start);
                        log::debug!(
                            "Bar {} '{}' at tick {}: {} BPM, {}x{}",
                            pos.bar_index,
                            song.bars[pos.bar_index].name,
                            pos.bar_start,
                            pos.tempo,
                            pos.beats_per_bar,
                            pos.subdivisions
                        );
                    }
                    (
                        Some(pos.bar_index),
                        pos.beat,
                        pos.sub_beat,
                        pos.beats_per_bar,
                        pos.subdivisions,
                        pos.tempo,
                    )
                }
            },
            None => {
                let (beat, sub_beat) = self.meter.position(position);
                (
                    None,
                    beat,
                    sub_beat,
                    self.meter.beats,
                    self.meter.subdivisions,
                    self.meter.bpm,
                )
            }
        };

        let click = ClickType::select(beat, sub_beat, subdivisions);
        if self.sink.is_loaded() {
            self.sink.trigger(click, tick.time);
        } else {
            log::trace!("Click {:?} skipped, sounds not loaded", click);
        }

        self.display = DisplayState {
            counter: self.counter,
            bar_index,
            beat,
            sub_beat,
            beats_per_bar,
            subdivisions,
            tempo,
            sample_loaded: false,
            playing: true,
        };
        log::trace!("Tick {} -> {} {:?}", position, self.display, click);
    }

    /// Pull one tick from the transport and handle it
    /// Returns false when the transport has nothing to fire
    pub fn pump(&mut self) -> bool {
        match self.transport.next_tick() {
            Some(tick) => {
                self.on_tick(tick);
                true
            }
            None => false,
        }
    }

    /// Pump ticks until playback stops or `max_ticks` ticks were handled
    pub fn run_until_stopped(&mut self, max_ticks: Option<u64>) -> u64 {
        let mut handled = 0;
        while self.is_playing() && max_ticks.is_none_or(|max| handled < max) {
            if !self.pump() {
                break;
            }
            handled += 1;
        }
        handled
    }

    /// State for the presentation layer
    pub fn snapshot(&self) -> DisplayState {
        DisplayState {
            counter: self.counter,
            sample_loaded: self.sink.is_loaded(),
            playing: self.is_playing(),
            ..self.display
        }
    }

    pub fn counter(&self) -> i64 {
        self.counter
    }

    pub fn song(&self) -> Option<&Song> {
        self.song.as_ref()
    }

    pub fn meter(&self) -> Meter {
        self.meter
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Replace the active registration with a fresh one
    fn install_registration(&mut self) {
        if let Some(old) = self.registration.take() {
            self.transport.cancel(old);
        }
        self.registration = Some(self.transport.register_recurring(NoteValue::Quarter));
    }
}
