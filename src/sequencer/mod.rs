// Sequencer module
// Tick-to-position resolution, the click scheduler and the transport it runs on

pub mod clock;
pub mod display;
pub mod meter;
pub mod metronome;
pub mod resolver;
pub mod scheduler;
pub mod transport;

pub use clock::{ManualTransport, SystemTransport};
pub use display::DisplayState;
pub use meter::Meter;
pub use metronome::{ClickKit, ClickSink, ClickType, Metronome};
pub use resolver::{BarPosition, CachedResolver, Resolution, resolve};
pub use scheduler::Scheduler;
pub use transport::{
    NoteValue, RecurringHandle, TempoPoint, TempoTimeline, Tick, Transport, TransportEvent,
    TransportListeners, TransportState,
};
