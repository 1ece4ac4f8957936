//! Tree walks that install watches and synthesize creation events.
use std::fs;
use std::io;
use std::path::Path;

use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::flags::EventMask;
use crate::primitive::{RawEvent, WatchPrimitive};

/// What a walk does when a watch can't be installed on a directory.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum OnInstallFailure {
    /// Fail the walk when the walked directory itself can't be watched. Subdirectories are
    /// skipped as with [`Skip`](OnInstallFailure::Skip).
    Abort,
    /// Log and move on. The subtree stays unwatched.
    Skip,
}

/// Watch every directory below `root` and snapshot the entries already in it.
///
/// The returned events are in walk order, which is unspecified across siblings.
pub(crate) fn install_tree<P: WatchPrimitive>(
    primitive: &mut P,
    root: &Path,
) -> Result<Vec<RawEvent>> {
    let metadata = fs::metadata(root).map_err(|source| Error::Root {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(Error::Root {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    let mut snapshot = Vec::new();
    scan_tree(primitive, root, OnInstallFailure::Abort, |event| {
        snapshot.push(event);
        true
    })?;
    debug!(
        "Installed watches under {:?}, {} existing entries",
        root,
        snapshot.len()
    );
    Ok(snapshot)
}

/// Walk `dir`, installing a watch on each directory before its entries are listed, and
/// hand a synthesized creation event for every other entry to `emit`.
///
/// Stops early, returning `Ok(false)`, once `emit` returns `false`.
pub(crate) fn scan_tree<P, F>(
    primitive: &mut P,
    dir: &Path,
    on_failure: OnInstallFailure,
    mut emit: F,
) -> Result<bool>
where
    P: WatchPrimitive,
    F: FnMut(RawEvent) -> bool,
{
    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            if !emit(RawEvent::synthesized_create(entry.into_path())) {
                return Ok(false);
            }
            continue;
        }

        if let Err(source) = primitive.install(entry.path(), EventMask::ALL_EVENTS) {
            // Below the root, an unwatchable directory only costs its own subtree.
            if on_failure == OnInstallFailure::Abort && entry.depth() == 0 {
                return Err(Error::Install {
                    path: entry.into_path(),
                    source,
                });
            }
            warn!("Unable to watch {:?}, skipping: {}", entry.path(), source);
        }
    }
    Ok(true)
}
