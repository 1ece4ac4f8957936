//! Stream-based recursive directory watcher.
#![allow(clippy::module_name_repetitions)]

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;

use futures_core::{ready, Stream};
use futures_executor::block_on;
use futures_util::stream::StreamExt;
use log::debug;
#[cfg(feature = "tokio")]
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::error::{Error, Result};
use crate::events::FileEvent;
use crate::flags::EventMask;
#[cfg(target_os = "linux")]
use crate::inotify::Inotify;
use crate::installer::install_tree;
use crate::primitive::{Interrupt, RawEvent, WatchPrimitive};
use crate::translate::{conduit, ConduitReceiver, Translator};

/// A stream of [`FileEvent`](FileEvent)s for every file below a root directory.
///
/// Files that already exist when the watcher is created are reported first, as
/// [`CREATE`](EventMask::CREATE) events in no particular order. Live events follow. A file
/// may be reported as created more than once when a walk and a live watch both see it.
/// Events about directories themselves are never yielded.
///
/// The stream ends in one of two ways:
/// - the underlying primitive stops delivering events (for example because the root was
///   removed): a single [`FileEvent::EndOfStream`](FileEvent::EndOfStream) is yielded,
///   then `None`;
/// - the cancellation token given at construction is cancelled: the stream yields `None`
///   straight away, without draining buffered events.
///
/// Dropping the watcher stops its background threads.
pub struct DirWatcher {
    #[cfg(feature = "tokio")]
    events: ReceiverStream<RawEvent>,
    #[cfg(feature = "async-std")]
    events: ConduitReceiver,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    cancel: CancellationToken,
    mask: EventMask,
    terminated: bool,
}

impl DirWatcher {
    /// Watch `root` recursively with inotify, yielding events that intersect `mask`.
    ///
    /// The watcher lives until `ctx` is cancelled, the watcher is dropped, or the root goes
    /// away.
    ///
    /// # Errors
    /// Return error when inotify can't be initialized, or `root` is not a readable directory
    /// that can be watched. Subdirectories that can't be watched are skipped.
    #[cfg(target_os = "linux")]
    pub fn new(ctx: &CancellationToken, mask: EventMask, root: impl AsRef<Path>) -> Result<Self> {
        let inotify = Inotify::new().map_err(Error::Primitive)?;
        Self::with_primitive(ctx, mask, root, inotify)
    }

    /// Like [`new`](DirWatcher::new), on top of a caller-provided [`WatchPrimitive`].
    ///
    /// # Errors
    /// Return error when `root` is not a readable directory that can be watched, or a worker
    /// thread can't be spawned.
    pub fn with_primitive<P: WatchPrimitive>(
        ctx: &CancellationToken,
        mask: EventMask,
        root: impl AsRef<Path>,
        primitive: P,
    ) -> Result<Self> {
        let cancel = ctx.child_token();
        match start_pipeline(&cancel, root.as_ref(), primitive) {
            Ok(rx) => {
                debug!("Watching {:?} for {}", root.as_ref(), mask);
                Ok(Self {
                    #[cfg(feature = "tokio")]
                    events: ReceiverStream::new(rx),
                    #[cfg(feature = "async-std")]
                    events: rx,
                    cancelled: Box::pin(cancel.clone().cancelled_owned()),
                    cancel,
                    mask,
                    terminated: false,
                })
            }
            Err(e) => {
                // Unwind whatever was started before the failure.
                cancel.cancel();
                Err(e)
            }
        }
    }

    /// Upstream closes on its own, or because cancellation interrupted it. Only the former
    /// is reported as [`FileEvent::EndOfStream`](FileEvent::EndOfStream).
    fn upstream_closed(&mut self) -> Option<FileEvent> {
        let cancelled = self.cancel.is_cancelled();
        self.terminate();
        if cancelled {
            debug!("Watcher cancelled");
            None
        } else {
            debug!("Upstream closed, ending stream");
            Some(FileEvent::EndOfStream)
        }
    }

    fn terminate(&mut self) {
        self.terminated = true;
        self.cancel.cancel();
        self.events.close();
    }
}

impl Stream for DirWatcher {
    type Item = FileEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.terminated {
            return Poll::Ready(None);
        }

        if this.cancelled.as_mut().poll(cx).is_ready() {
            debug!("Watcher cancelled");
            this.terminate();
            return Poll::Ready(None);
        }

        loop {
            match ready!(this.events.poll_next_unpin(cx)) {
                Some(event) if event.mask.intersects(this.mask) => {
                    return Poll::Ready(Some(FileEvent::Changed(event)));
                }
                Some(_) => {}
                None => return Poll::Ready(this.upstream_closed()),
            }
        }
    }
}

impl Drop for DirWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Walk the initial tree, then start the translation stage and its interrupter.
fn start_pipeline<P: WatchPrimitive>(
    cancel: &CancellationToken,
    root: &Path,
    mut primitive: P,
) -> Result<ConduitReceiver> {
    let snapshot = install_tree(&mut primitive, root)?;
    let (tx, rx) = conduit();
    spawn_interrupter(cancel.clone(), primitive.interrupt_handle())?;
    Translator::new(primitive, tx, cancel.clone())
        .spawn(snapshot)
        .map_err(Error::Spawn)?;
    Ok(rx)
}

/// Interrupt the primitive once `cancel` fires, so a blocked read returns.
fn spawn_interrupter<I: Interrupt>(cancel: CancellationToken, interrupt: I) -> Result<()> {
    thread::Builder::new()
        .name(String::from("dirwatch-interrupt"))
        .spawn(move || {
            block_on(cancel.cancelled());
            interrupt.interrupt();
        })
        .map(drop)
        .map_err(Error::Spawn)
}
