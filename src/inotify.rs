//! Linux inotify as a [`WatchPrimitive`](WatchPrimitive).
use std::collections::HashMap;
use std::ffi::OsStr;
use std::io;
use std::os::fd::{AsFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::error;

use crate::ffi;
use crate::flags::EventMask;
use crate::primitive::{Interrupt, RawEvent, WatchDescriptor, WatchPrimitive};

// Holds dozens of records even with long names. A single record never exceeds
// `EVENT_HEADER_SIZE + NAME_MAX + 1`.
const BUFFER_SIZE: usize = 16 * 1024;

/// An inotify instance together with the paths of its watches.
///
/// The event stream ends once no watch is left, e.g. after the watched root is deleted.
pub struct Inotify {
    fd: OwnedFd,
    wake: Arc<OwnedFd>,
    watches: HashMap<WatchDescriptor, PathBuf>,
    buffer: Vec<u8>,
}

impl Inotify {
    /// Create a new inotify instance.
    ///
    /// # Errors
    /// Return error when the kernel refuses a new instance, e.g. because of
    /// `fs.inotify.max_user_instances`.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            fd: ffi::inotify_init()?,
            wake: Arc::new(ffi::eventfd()?),
            watches: HashMap::new(),
            buffer: vec![0; BUFFER_SIZE],
        })
    }

    fn parse(&mut self, len: usize) -> Vec<RawEvent> {
        let mut events = Vec::new();
        let mut offset = 0;
        while offset + ffi::EVENT_HEADER_SIZE <= len {
            // Safety: the header lies within the filled part of the buffer.
            let header: libc::inotify_event =
                unsafe { std::ptr::read_unaligned(self.buffer[offset..].as_ptr().cast()) };
            let name_start = offset + ffi::EVENT_HEADER_SIZE;
            let name_end = name_start + header.len as usize;
            if name_end > len {
                error!("Discarding truncated inotify record");
                break;
            }
            // The name is nul-padded to an aligned length.
            let name = self.buffer[name_start..name_end]
                .split(|b| *b == 0)
                .next()
                .unwrap_or_default();
            offset = name_end;

            let wd = WatchDescriptor::new(header.wd);
            let mask = EventMask::from_bits_truncate(header.mask);
            let path = match self.watches.get(&wd) {
                Some(dir) if name.is_empty() => dir.clone(),
                Some(dir) => dir.join(OsStr::from_bytes(name)),
                None => PathBuf::new(),
            };
            if mask.contains(EventMask::IGNORED) {
                self.watches.remove(&wd);
            }

            events.push(RawEvent {
                path,
                mask,
                raw_mask: header.mask,
                wd: (header.wd >= 0).then_some(wd),
                cookie: header.cookie,
            });
        }
        events
    }
}

/// Wakes an [`Inotify`](Inotify) blocked in `read_batch` through its eventfd.
pub struct InotifyInterrupt(Arc<OwnedFd>);

impl Interrupt for InotifyInterrupt {
    fn interrupt(&self) {
        if let Err(e) = ffi::signal(self.0.as_fd()) {
            error!("Unable to interrupt inotify reader: {}", e);
        }
    }
}

impl WatchPrimitive for Inotify {
    type Interrupt = InotifyInterrupt;

    fn install(&mut self, path: &Path, mask: EventMask) -> io::Result<WatchDescriptor> {
        let wd = WatchDescriptor::new(ffi::add_watch(self.fd.as_fd(), path, mask.bits())?);
        // The same inode always maps to the same descriptor, so this also follows renames.
        self.watches.insert(wd, path.to_path_buf());
        Ok(wd)
    }

    fn remove(&mut self, wd: WatchDescriptor) -> io::Result<()> {
        self.watches.remove(&wd);
        ffi::rm_watch(self.fd.as_fd(), wd.as_raw())
    }

    fn read_batch(&mut self) -> io::Result<Vec<RawEvent>> {
        loop {
            if self.watches.is_empty() {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no watches remain"));
            }

            let [readable, interrupted] =
                ffi::poll_readable([self.fd.as_fd(), self.wake.as_fd()])?;
            if interrupted {
                return Err(io::Error::new(io::ErrorKind::Other, "inotify reader interrupted"));
            }
            if !readable {
                continue;
            }

            let len = ffi::read(self.fd.as_fd(), &mut self.buffer)?;
            if len > 0 {
                return Ok(self.parse(len));
            }
        }
    }

    fn interrupt_handle(&self) -> Self::Interrupt {
        InotifyInterrupt(Arc::clone(&self.wake))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::Inotify;
    use crate::flags::EventMask;
    use crate::primitive::{Interrupt, WatchPrimitive};

    #[test]
    fn must_resolve_event_paths() {
        let dir = tempdir().expect("to be created");
        let mut inotify = Inotify::new().expect("to be created");
        let wd = inotify
            .install(dir.path(), EventMask::ALL_EVENTS)
            .expect("to be installed");

        fs::write(dir.path().join("file"), b"x").expect("to be written");

        let events = inotify.read_batch().expect("to be read");
        let created = events
            .iter()
            .find(|event| event.mask.contains(EventMask::CREATE))
            .expect("create event to exist");
        assert_eq!(created.path, dir.path().join("file"));
        assert_eq!(created.wd, Some(wd));
    }

    #[test]
    fn must_fail_read_after_interrupt() {
        let dir = tempdir().expect("to be created");
        let mut inotify = Inotify::new().expect("to be created");
        inotify
            .install(dir.path(), EventMask::ALL_EVENTS)
            .expect("to be installed");

        inotify.interrupt_handle().interrupt();
        assert!(inotify.read_batch().is_err());
        // Stays interrupted.
        assert!(inotify.read_batch().is_err());
    }

    #[test]
    fn must_end_when_no_watch_remains() {
        let dir = tempdir().expect("to be created");
        let root = dir.path().join("root");
        fs::create_dir(&root).expect("to be created");
        let mut inotify = Inotify::new().expect("to be created");
        inotify
            .install(&root, EventMask::ALL_EVENTS)
            .expect("to be installed");

        fs::remove_dir(&root).expect("to be removed");

        let mut ended = false;
        for _ in 0..8 {
            match inotify.read_batch() {
                Ok(events) => assert!(events
                    .iter()
                    .all(|event| event.path.as_os_str().is_empty() || event.path == root)),
                Err(_) => {
                    ended = true;
                    break;
                }
            }
        }
        assert!(ended);
    }
}
