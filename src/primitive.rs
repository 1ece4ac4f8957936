//! The flat, per-path watch interface the recursive watcher is built on.
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

use crate::flags::EventMask;

/// Opaque identifier of a watch installed on a single path.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct WatchDescriptor(i32);

impl WatchDescriptor {
    /// Wrap a descriptor handed out by a [`WatchPrimitive`].
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// The descriptor as the primitive knows it.
    pub const fn as_raw(self) -> i32 {
        self.0
    }
}

/// A change record as reported by a [`WatchPrimitive`].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct RawEvent {
    pub path: PathBuf,
    pub mask: EventMask,
    pub raw_mask: u32,
    /// `None` for synthesized events and for queue overflow records.
    pub wd: Option<WatchDescriptor>,
    /// Links the two halves of a rename, zero otherwise.
    pub cookie: u32,
}

impl RawEvent {
    /// A creation record for an entry that existed before its directory was watched.
    pub fn synthesized_create(path: PathBuf) -> Self {
        Self {
            path,
            mask: EventMask::CREATE,
            raw_mask: EventMask::CREATE.bits(),
            wd: None,
            cookie: 0,
        }
    }
}

impl Display for RawEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] path: {:?}, flags: {}({:x})",
            self.wd.map_or(-1, WatchDescriptor::as_raw),
            self.path,
            self.mask,
            self.raw_mask
        )
    }
}

/// Wakes a [`WatchPrimitive`] blocked in [`read_batch`](WatchPrimitive::read_batch).
pub trait Interrupt: Send + Sync + 'static {
    /// Make every pending and future `read_batch` call fail.
    fn interrupt(&self);
}

/// A change-notification facility that watches single paths and cannot recurse.
///
/// The primitive owns the descriptor to path table. Events it returns must
/// carry full paths: the watched path itself for self events, the watched
/// directory joined with the entry name otherwise.
pub trait WatchPrimitive: Send + 'static {
    type Interrupt: Interrupt;

    /// Start watching `path` for the events in `mask`.
    ///
    /// # Errors
    /// Return error when the path can't be watched.
    fn install(&mut self, path: &Path, mask: EventMask) -> io::Result<WatchDescriptor>;

    /// Stop watching the path registered under `wd`.
    ///
    /// # Errors
    /// Return error when `wd` is not a live watch.
    fn remove(&mut self, wd: WatchDescriptor) -> io::Result<()>;

    /// Block until at least one event is available.
    ///
    /// # Errors
    /// Any error ends the event stream for good, including a clean shutdown.
    fn read_batch(&mut self) -> io::Result<Vec<RawEvent>>;

    /// Handle that unblocks `read_batch` from another thread.
    fn interrupt_handle(&self) -> Self::Interrupt;
}
