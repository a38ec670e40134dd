//! The highlighted index shared by the list and the map markers.

use crate::error::StateError;

/// Index into the currently displayed places, or nothing.
///
/// Only ever holds an index that was valid for the displayed set at the time
/// it was set; the store clears it whenever that set is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Highlight(Option<usize>);

impl Highlight {
    pub fn index(&self) -> Option<usize> {
        self.0
    }

    pub fn is_highlighted(&self, index: usize) -> bool {
        self.0 == Some(index)
    }

    /// Highlight `index` (or clear with `None`) against a displayed set of `len` places.
    pub fn select(&mut self, index: Option<usize>, len: usize) -> Result<(), StateError> {
        match index {
            Some(i) if i >= len => Err(StateError::IndexOutOfRange { index: i, len }),
            other => {
                self.0 = other;
                Ok(())
            }
        }
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }
}
