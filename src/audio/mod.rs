// Audio module - click samples, realtime output and offline rendering

pub mod error;
pub mod loader;
pub mod output;
pub mod render;

pub use error::AudioError;
pub use loader::{Sample, load_sample};
pub use output::{ChannelSink, ClickEvent, ClickOutput, ClickPlayhead, create_click_channel};
pub use render::{RecordingSink, render_song, schedule_song, write_wav};
