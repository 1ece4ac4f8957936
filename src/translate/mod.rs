//! Turns the flat per-directory event feed into a recursive, file-only one.
use std::io;
use std::thread;

#[cfg(feature = "async-std")]
use async_std1 as async_std;
use futures_executor::block_on;
use futures_util::future::{select, Either};
use futures_util::pin_mut;
use log::{debug, warn};
#[cfg(feature = "tokio")]
use tokio1 as tokio;
use tokio_util::sync::CancellationToken;

use crate::flags::EventMask;
use crate::installer::{scan_tree, OnInstallFailure};
use crate::primitive::{RawEvent, WatchPrimitive};


#[cfg(feature = "tokio")]
pub(crate) type ConduitSender = tokio::sync::mpsc::Sender<RawEvent>;
#[cfg(feature = "tokio")]
pub(crate) type ConduitReceiver = tokio::sync::mpsc::Receiver<RawEvent>;
#[cfg(feature = "async-std")]
pub(crate) type ConduitSender = async_std::channel::Sender<RawEvent>;
#[cfg(feature = "async-std")]
pub(crate) type ConduitReceiver = async_std::channel::Receiver<RawEvent>;

/// A single-slot channel, so that the translation stage runs at most one event ahead of the
/// consumer.
pub(crate) fn conduit() -> (ConduitSender, ConduitReceiver) {
    #[cfg(feature = "tokio")]
    let pair = tokio::sync::mpsc::channel(1);
    #[cfg(feature = "async-std")]
    let pair = async_std::channel::bounded(1);
    pair
}

struct Handoff {
    conduit: ConduitSender,
    cancel: CancellationToken,
}

impl Handoff {
    /// Block until the consumer takes `event`. Returns `false` once the consumer is gone or
    /// cancellation fires first.
    fn send(&self, event: RawEvent) -> bool {
        let delivered = self.conduit.send(event);
        let cancelled = self.cancel.cancelled();
        pin_mut!(delivered, cancelled);
        matches!(
            block_on(select(delivered, cancelled)),
            Either::Left((Ok(()), _))
        )
    }
}

pub(crate) struct Translator<P> {
    primitive: P,
    handoff: Handoff,
}

impl<P: WatchPrimitive> Translator<P> {
    pub(crate) fn new(primitive: P, conduit: ConduitSender, cancel: CancellationToken) -> Self {
        Self {
            primitive,
            handoff: Handoff { conduit, cancel },
        }
    }

    /// Run the stage on its own thread. `snapshot` is delivered before any live event.
    ///
    /// # Errors
    /// Return error when the thread can't be spawned.
    pub(crate) fn spawn(self, snapshot: Vec<RawEvent>) -> io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name(String::from("dirwatch-translate"))
            .spawn(move || self.run(snapshot))
    }

    // Returning drops the sender, which closes the conduit.
    fn run(mut self, snapshot: Vec<RawEvent>) {
        if !snapshot.into_iter().all(|event| self.handoff.send(event)) {
            return;
        }

        while !self.handoff.cancel.is_cancelled() {
            let batch = match self.primitive.read_batch() {
                Ok(batch) => batch,
                Err(e) => {
                    debug!("Watch primitive stream ended: {}", e);
                    return;
                }
            };
            debug!("Received {} event(s)", batch.len());

            for event in batch {
                if !self.handle(event) {
                    return;
                }
            }
        }
    }

    /// Process one raw event. Returns `false` once nothing downstream will read further events.
    fn handle(&mut self, event: RawEvent) -> bool {
        let mask = event.mask;

        if mask.contains(EventMask::IGNORED) {
            return true;
        }

        if mask.contains(EventMask::ISDIR)
            && mask.intersects(EventMask::CREATE | EventMask::MOVED_TO)
        {
            // Entries may have landed in the new directory before its watch existed. Report
            // them now, before looking at the next raw event.
            let handoff = &self.handoff;
            return match scan_tree(
                &mut self.primitive,
                &event.path,
                OnInstallFailure::Skip,
                |caught_up| handoff.send(caught_up),
            ) {
                Ok(delivered) => delivered,
                Err(e) => {
                    warn!("Catch-up walk of {:?} failed: {}", event.path, e);
                    true
                }
            };
        }

        if mask.contains(EventMask::DELETE_SELF) {
            if let Some(wd) = event.wd {
                if let Err(e) = self.primitive.remove(wd) {
                    debug!("Unable to remove watch on {:?}: {}", event.path, e);
                }
            }
            return true;
        }

        if mask.contains(EventMask::ISDIR) {
            return true;
        }

        if mask.contains(EventMask::Q_OVERFLOW) {
            warn!("Event queue overflowed, some events were dropped");
        }

        self.handoff.send(event)
    }
}
