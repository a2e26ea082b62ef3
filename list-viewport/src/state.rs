use alloc::string::{String, ToString};
use core::fmt;
use core::num::ParseIntError;
use core::str::FromStr;

use crate::{Align, ScrollIntent};

/// A lightweight, serializable snapshot of the scroll position.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`. Its string form is
/// the decimal start index, suitable for persisting across sessions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SavedScrollState {
    pub start_index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RestoreError {
    #[error("empty restore string")]
    Empty,
    #[error("invalid start index")]
    InvalidIndex(#[from] ParseIntError),
}

impl SavedScrollState {
    pub fn to_restore_string(&self) -> String {
        self.to_string()
    }

    /// The intent that brings `start_index` back to the window start.
    pub fn into_intent(self) -> ScrollIntent {
        ScrollIntent::jump(self.start_index, Align::Start)
    }
}

impl fmt::Display for SavedScrollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start_index)
    }
}

impl FromStr for SavedScrollState {
    type Err = RestoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RestoreError::Empty);
        }
        Ok(Self {
            start_index: s.parse()?,
        })
    }
}
