// Structural bar edits
// Every edit renumbers the bars so ids stay equal to their index

use crate::song::types::{Bar, Song};
use crate::song::validation::SongError;

/// Edit actions offered by the bar editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarEdit {
    /// Overwrite the bar at `index`
    Save { index: usize, bar: Bar },
    /// Delete the bar at `index`
    Remove { index: usize },
    /// Insert `bar` in front of the bar at `index`
    AddBefore { index: usize, bar: Bar },
    /// Insert `bar` right after the bar at `index`
    AddAfter { index: usize, bar: Bar },
}

impl Song {
    /// Apply one editor action
    pub fn apply(&mut self, edit: BarEdit) -> Result<(), SongError> {
        match edit {
            BarEdit::Save { index, bar } => self.replace_bar(index, bar),
            BarEdit::Remove { index } => self.remove_bar(index).map(|_| ()),
            BarEdit::AddBefore { index, bar } => self.insert_bar_before(index, bar),
            BarEdit::AddAfter { index, bar } => self.insert_bar_after(index, bar),
        }
    }

    /// Append a bar at the end of the song
    pub fn push_bar(&mut self, bar: Bar) {
        self.bars.push(bar);
        self.renumber_bars();
    }

    pub fn replace_bar(&mut self, index: usize, bar: Bar) -> Result<(), SongError> {
        let slot = self
            .bars
            .get_mut(index)
            .ok_or(SongError::BarNotFound(index))?;
        *slot = bar;
        self.renumber_bars();
        Ok(())
    }

    pub fn remove_bar(&mut self, index: usize) -> Result<Bar, SongError> {
        if index >= self.bars.len() {
            return Err(SongError::BarNotFound(index));
        }
        let removed = self.bars.remove(index);
        self.renumber_bars();
        Ok(removed)
    }

    pub fn insert_bar_before(&mut self, index: usize, bar: Bar) -> Result<(), SongError> {
        if index >= self.bars.len() {
            return Err(SongError::BarNotFound(index));
        }
        self.bars.insert(index, bar);
        self.renumber_bars();
        Ok(())
    }

    pub fn insert_bar_after(&mut self, index: usize, bar: Bar) -> Result<(), SongError> {
        if index >= self.bars.len() {
            return Err(SongError::BarNotFound(index));
        }
        self.bars.insert(index + 1, bar);
        self.renumber_bars();
        Ok(())
    }
}
