// SongClick - Library exports for the binary, tests and benchmarks

pub mod audio;
pub mod config;
pub mod sequencer;
pub mod song;

// Re-export commonly used types for convenience
pub use audio::{AudioError, ChannelSink, ClickOutput, render_song, write_wav};
pub use config::{AppConfig, ClickSamplePaths, ConfigError};
pub use sequencer::{
    BarPosition, ClickKit, ClickSink, ClickType, DisplayState, ManualTransport, Meter, Metronome,
    Resolution, Scheduler, SystemTransport, Transport, resolve,
};
pub use song::{Bar, BarEdit, Song, SongError, TempoMarking};
