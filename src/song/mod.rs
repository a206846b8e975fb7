// Song module
// Song/bar data model, structural editing, validation and file formats

pub mod edit;
pub mod serialization;
pub mod tempo_marking;
pub mod types;
pub mod validation;

pub use edit::BarEdit;
pub use tempo_marking::TempoMarking;
pub use types::{Bar, Song};
pub use validation::{SongError, validate_bar, validate_bars, validate_song};
