// Audio error types

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio configuration error: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("Audio stream build error: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Audio stream play error: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Sample file contains no audio: {0}")]
    EmptySample(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("FLAC error: {0}")]
    Flac(#[from] claxon::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
