use std::io;
use std::path::PathBuf;

/// Reasons a [`DirWatcher`](crate::DirWatcher) could not be constructed.
///
/// Once a watcher exists, failures are absorbed and the stream ends with
/// [`FileEvent::EndOfStream`](crate::FileEvent::EndOfStream) instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to initialize the watch primitive: {0}")]
    Primitive(#[source] io::Error),
    #[error("unable to watch root {path:?}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to install watch on {path:?}: {source}")]
    Install {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
