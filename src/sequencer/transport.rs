// Transport - capability contract of the clock that paces the scheduler
// Start/stop state, tempo automation and recurring tick registration

use std::fmt;

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    Started,
    #[default]
    Stopped,
}

impl TransportState {
    pub fn is_started(&self) -> bool {
        matches!(self, TransportState::Started)
    }
}

/// State transitions a listener can wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportEvent {
    Started,
    Stopped,
}

/// Interval of a recurring registration, as a note value at the transport tempo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteValue {
    Whole,
    Half,
    #[default]
    Quarter,
    Eighth,
    Sixteenth,
}

impl NoteValue {
    /// Length in quarter notes
    pub fn quarters(&self) -> f64 {
        match self {
            NoteValue::Whole => 4.0,
            NoteValue::Half => 2.0,
            NoteValue::Quarter => 1.0,
            NoteValue::Eighth => 0.5,
            NoteValue::Sixteenth => 0.25,
        }
    }

    /// Length in seconds at `bpm`
    pub fn seconds_at(&self, bpm: f64) -> f64 {
        60.0 / bpm * self.quarters()
    }
}

/// Identifies one recurring registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecurringHandle(pub u64);

impl fmt::Display for RecurringHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One firing of a recurring registration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub handle: RecurringHandle,
    /// Scheduled transport time of this tick in seconds
    pub time: f64,
}

/// A committed tempo change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoPoint {
    pub at: f64,
    pub bpm: f64,
}

/// Tempo automation: bpm values taking effect at transport times
#[derive(Debug, Clone)]
pub struct TempoTimeline {
    points: Vec<TempoPoint>, // sorted by `at`, first point at 0.0
}

impl TempoTimeline {
    const EPSILON: f64 = 1e-9;

    pub fn new(bpm: f64) -> Self {
        Self {
            points: vec![TempoPoint { at: 0.0, bpm }],
        }
    }

    /// Tempo in force at `time`
    pub fn bpm_at(&self, time: f64) -> f64 {
        self.points
            .iter()
            .rev()
            .find(|point| point.at <= time + Self::EPSILON)
            .map(|point| point.bpm)
            .unwrap_or(self.points[0].bpm)
    }

    /// Commit `bpm` from `at` onwards; a point at the same time is replaced
    pub fn schedule(&mut self, bpm: f64, at: f64) {
        let at = at.max(0.0);
        self.points
            .retain(|point| (point.at - at).abs() > Self::EPSILON);
        let index = self.points.partition_point(|point| point.at < at);
        self.points.insert(index, TempoPoint { at, bpm });
    }

    /// Drop all automation, keeping the tempo in force at `time` as the base
    pub fn reset(&mut self, time: f64) {
        let bpm = self.bpm_at(time);
        self.points.clear();
        self.points.push(TempoPoint { at: 0.0, bpm });
    }

    /// Interval after an event at `time`, using the tempo in force at `time`
    pub fn interval_after(&self, time: f64, interval: NoteValue) -> f64 {
        interval.seconds_at(self.bpm_at(time))
    }

    pub fn points(&self) -> &[TempoPoint] {
        &self.points
    }
}

type Listener = Box<dyn FnOnce() + Send>;

/// One-shot listeners for start/stop transitions
#[derive(Default)]
pub struct TransportListeners {
    on_started: Vec<Listener>,
    on_stopped: Vec<Listener>,
}

impl TransportListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` to run on the next `event`
    pub fn once(&mut self, event: TransportEvent, callback: Listener) {
        match event {
            TransportEvent::Started => self.on_started.push(callback),
            TransportEvent::Stopped => self.on_stopped.push(callback),
        }
    }

    /// Run and drop the listeners waiting for `event`
    pub fn notify(&mut self, event: TransportEvent) {
        let listeners = match event {
            TransportEvent::Started => std::mem::take(&mut self.on_started),
            TransportEvent::Stopped => std::mem::take(&mut self.on_stopped),
        };
        for listener in listeners {
            listener();
        }
    }

    pub fn pending(&self, event: TransportEvent) -> usize {
        match event {
            TransportEvent::Started => self.on_started.len(),
            TransportEvent::Stopped => self.on_stopped.len(),
        }
    }
}

impl fmt::Debug for TransportListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportListeners")
            .field("on_started", &self.on_started.len())
            .field("on_stopped", &self.on_stopped.len())
            .finish()
    }
}

/// Clock consumed by the scheduler
///
/// The tempo is expressed in the transport's native unit: a recurring
/// registration with interval [`NoteValue::Quarter`] fires `bpm` times per
/// minute. Callers that want one tick per sub-beat multiply the musical tempo
/// by the number of subdivisions.
pub trait Transport {
    fn state(&self) -> TransportState;

    /// Started → no-op; Stopped → Started, firing `Started` listeners
    fn start(&mut self);

    /// Started → Stopped, firing `Stopped` listeners; no-op when stopped
    fn stop(&mut self);

    /// Elapsed transport time in seconds
    fn seconds(&self) -> f64;

    /// Move the elapsed time; tempo automation collapses to the current tempo
    fn set_seconds(&mut self, seconds: f64);

    /// Tempo in force at the current transport time
    fn bpm(&self) -> f64;

    /// Change the tempo from the current transport time onwards
    fn set_bpm(&mut self, bpm: f64);

    /// Commit a tempo change at a scheduled transport time
    fn schedule_tempo(&mut self, bpm: f64, at: f64);

    /// Register the recurring tick; replaces any previous registration
    fn register_recurring(&mut self, interval: NoteValue) -> RecurringHandle;

    /// Detach a registration; unknown or stale handles are ignored
    fn cancel(&mut self, handle: RecurringHandle);

    /// Next due tick of the active registration, or `None` when nothing can fire
    fn next_tick(&mut self) -> Option<Tick>;

    /// Run `callback` once on the next `event` transition
    fn once(&mut self, event: TransportEvent, callback: Box<dyn FnOnce() + Send>);
}
