// Transport clocks
// `ManualTransport` runs on virtual time and fires on demand,
// `SystemTransport` runs the same clock against the wall clock

use super::transport::{
    NoteValue, RecurringHandle, TempoPoint, TempoTimeline, Tick, Transport, TransportEvent,
    TransportListeners, TransportState,
};
use std::time::{Duration, Instant};

/// Default transport tempo before anything sets it
pub const DEFAULT_TRANSPORT_BPM: f64 = 120.0;

/// Clock state shared by both transports
#[derive(Debug)]
struct ClockCore {
    state: TransportState,
    timeline: TempoTimeline,
    registration: Option<(RecurringHandle, NoteValue)>,
    next_handle: u64,
    /// Explicit time of the first tick of a fresh registration
    first_tick_at: Option<f64>,
    last_tick_at: Option<f64>,
    position: f64,
    listeners: TransportListeners,
}

impl ClockCore {
    fn new(bpm: f64) -> Self {
        Self {
            state: TransportState::Stopped,
            timeline: TempoTimeline::new(bpm),
            registration: None,
            next_handle: 1,
            first_tick_at: None,
            last_tick_at: None,
            position: 0.0,
            listeners: TransportListeners::new(),
        }
    }

    fn start(&mut self) {
        if self.state.is_started() {
            return;
        }
        self.state = TransportState::Started;
        self.listeners.notify(TransportEvent::Started);
    }

    fn stop(&mut self) {
        if !self.state.is_started() {
            return;
        }
        self.state = TransportState::Stopped;
        self.listeners.notify(TransportEvent::Stopped);
    }

    fn set_seconds(&mut self, seconds: f64) {
        self.timeline.reset(self.position);
        self.position = seconds.max(0.0);
        self.last_tick_at = None;
        if self.first_tick_at.is_some() {
            self.first_tick_at = Some(self.position);
        }
    }

    fn set_bpm(&mut self, bpm: f64) {
        let at = self.last_tick_at.unwrap_or(self.position);
        self.timeline.schedule(bpm, at);
    }

    /// Time the following tick would be scheduled at, ignoring transport state
    fn following_tick_time(&self, interval: NoteValue) -> f64 {
        match self.last_tick_at {
            Some(last) => last + self.timeline.interval_after(last, interval),
            None => self.position,
        }
    }

    fn register(&mut self, interval: NoteValue) -> RecurringHandle {
        let handle = RecurringHandle(self.next_handle);
        self.next_handle += 1;
        self.registration = Some((handle, interval));
        self.first_tick_at = Some(self.following_tick_time(interval));
        handle
    }

    fn cancel(&mut self, handle: RecurringHandle) {
        if matches!(self.registration, Some((active, _)) if active == handle) {
            self.registration = None;
            self.first_tick_at = None;
        }
    }

    /// Scheduled time of the next tick, if one can fire
    fn due_time(&self) -> Option<f64> {
        if !self.state.is_started() {
            return None;
        }
        let (_, interval) = self.registration?;
        Some(
            self.first_tick_at
                .unwrap_or_else(|| self.following_tick_time(interval)),
        )
    }

    fn emit(&mut self) -> Option<Tick> {
        let time = self.due_time()?;
        let (handle, _) = self.registration?;
        self.first_tick_at = None;
        self.last_tick_at = Some(time);
        self.position = time;
        Some(Tick { handle, time })
    }
}

/// Transport on virtual time
///
/// Each call to `next_tick` fires the active registration immediately and
/// advances virtual time to that tick. Used for tests and offline rendering.
#[derive(Debug)]
pub struct ManualTransport {
    core: ClockCore,
    tempo_log: Vec<TempoPoint>,
}

impl ManualTransport {
    pub fn new() -> Self {
        Self::with_bpm(DEFAULT_TRANSPORT_BPM)
    }

    pub fn with_bpm(bpm: f64) -> Self {
        Self {
            core: ClockCore::new(bpm),
            tempo_log: Vec::new(),
        }
    }

    /// Every tempo change committed through `schedule_tempo`, in call order
    pub fn tempo_log(&self) -> &[TempoPoint] {
        &self.tempo_log
    }

    /// The active registration, if any
    pub fn active_registration(&self) -> Option<RecurringHandle> {
        self.core.registration.map(|(handle, _)| handle)
    }

    /// Tempo in force at an arbitrary transport time
    pub fn bpm_at(&self, time: f64) -> f64 {
        self.core.timeline.bpm_at(time)
    }
}

impl Default for ManualTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ManualTransport {
    fn state(&self) -> TransportState {
        self.core.state
    }

    fn start(&mut self) {
        self.core.start();
    }

    fn stop(&mut self) {
        self.core.stop();
    }

    fn seconds(&self) -> f64 {
        self.core.position
    }

    fn set_seconds(&mut self, seconds: f64) {
        self.core.set_seconds(seconds);
    }

    fn bpm(&self) -> f64 {
        self.core.timeline.bpm_at(self.core.position)
    }

    fn set_bpm(&mut self, bpm: f64) {
        self.core.set_bpm(bpm);
    }

    fn schedule_tempo(&mut self, bpm: f64, at: f64) {
        self.tempo_log.push(TempoPoint { at, bpm });
        self.core.timeline.schedule(bpm, at);
    }

    fn register_recurring(&mut self, interval: NoteValue) -> RecurringHandle {
        self.core.register(interval)
    }

    fn cancel(&mut self, handle: RecurringHandle) {
        self.core.cancel(handle);
    }

    fn next_tick(&mut self) -> Option<Tick> {
        self.core.emit()
    }

    fn once(&mut self, event: TransportEvent, callback: Box<dyn FnOnce() + Send>) {
        self.core.listeners.once(event, callback);
    }
}

/// Transport paced by the wall clock
///
/// `next_tick` blocks the calling thread until the tick is due. Transport
/// time zero is anchored to the instant of the first start.
#[derive(Debug)]
pub struct SystemTransport {
    core: ClockCore,
    anchor: Option<Instant>,
}

impl SystemTransport {
    pub fn new() -> Self {
        Self::with_bpm(DEFAULT_TRANSPORT_BPM)
    }

    pub fn with_bpm(bpm: f64) -> Self {
        Self {
            core: ClockCore::new(bpm),
            anchor: None,
        }
    }

    fn reanchor(&mut self) {
        let elapsed = Duration::from_secs_f64(self.core.position);
        self.anchor = Some(Instant::now().checked_sub(elapsed).unwrap_or_else(Instant::now));
    }
}

impl Default for SystemTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SystemTransport {
    fn state(&self) -> TransportState {
        self.core.state
    }

    fn start(&mut self) {
        if !self.core.state.is_started() {
            self.reanchor();
        }
        self.core.start();
    }

    fn stop(&mut self) {
        self.core.stop();
    }

    fn seconds(&self) -> f64 {
        match (self.core.state, self.anchor) {
            (TransportState::Started, Some(anchor)) => anchor.elapsed().as_secs_f64(),
            _ => self.core.position,
        }
    }

    fn set_seconds(&mut self, seconds: f64) {
        self.core.set_seconds(seconds);
        if self.core.state.is_started() {
            self.reanchor();
        }
    }

    fn bpm(&self) -> f64 {
        self.core.timeline.bpm_at(self.core.position)
    }

    fn set_bpm(&mut self, bpm: f64) {
        self.core.set_bpm(bpm);
    }

    fn schedule_tempo(&mut self, bpm: f64, at: f64) {
        self.core.timeline.schedule(bpm, at);
    }

    fn register_recurring(&mut self, interval: NoteValue) -> RecurringHandle {
        self.core.register(interval)
    }

    fn cancel(&mut self, handle: RecurringHandle) {
        self.core.cancel(handle);
    }

    fn next_tick(&mut self) -> Option<Tick> {
        let due = self.core.due_time()?;
        if let Some(anchor) = self.anchor {
            let target = anchor + Duration::from_secs_f64(due);
            let now = Instant::now();
            if target > now {
                std::thread::sleep(target - now);
            }
        }
        self.core.emit()
    }

    fn once(&mut self, event: TransportEvent, callback: Box<dyn FnOnce() + Send>) {
        self.core.listeners.once(event, callback);
    }
}
