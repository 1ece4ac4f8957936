use std::fmt::{Display, Formatter};
use std::path::Path;

use crate::flags::EventMask;
use crate::primitive::RawEvent;

/// An event produced by a [`DirWatcher`](crate::DirWatcher).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum FileEvent {
    /// A change to a file somewhere below the watched root.
    Changed(RawEvent),
    /// No further events will be produced.
    EndOfStream,
}

impl FileEvent {
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    pub const fn raw(&self) -> Option<&RawEvent> {
        match self {
            Self::Changed(raw) => Some(raw),
            Self::EndOfStream => None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.raw().map(|raw| raw.path.as_path())
    }

    pub fn mask(&self) -> EventMask {
        self.raw().map_or_else(EventMask::empty, |raw| raw.mask)
    }
}

impl Display for FileEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Changed(raw) => raw.fmt(f),
            Self::EndOfStream => write!(f, "<end of stream>"),
        }
    }
}
