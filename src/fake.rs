//! A scripted [`WatchPrimitive`] for exercising the pipeline without a kernel.
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::flags::EventMask;
use crate::primitive::{Interrupt, RawEvent, WatchDescriptor, WatchPrimitive};

type Batch = io::Result<Vec<RawEvent>>;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Call {
    Install(PathBuf),
    Remove(WatchDescriptor),
}

#[derive(Default)]
struct Shared {
    calls: Vec<Call>,
    refused: HashSet<PathBuf>,
    doomed: HashMap<PathBuf, PathBuf>,
}

pub struct FakePrimitive {
    batches: Receiver<Batch>,
    feeder: Sender<Batch>,
    shared: Arc<Mutex<Shared>>,
    next_wd: i32,
}

/// The test's side of a [`FakePrimitive`].
#[derive(Clone)]
pub struct FakeHandle {
    feeder: Sender<Batch>,
    shared: Arc<Mutex<Shared>>,
}

pub fn fake_primitive() -> (FakePrimitive, FakeHandle) {
    let (feeder, batches) = channel();
    let shared = Arc::new(Mutex::new(Shared::default()));
    (
        FakePrimitive {
            batches,
            feeder: feeder.clone(),
            shared: shared.clone(),
            next_wd: 1,
        },
        FakeHandle { feeder, shared },
    )
}

impl FakeHandle {
    pub fn push(&self, batch: Vec<RawEvent>) {
        self.feeder.send(Ok(batch)).expect("primitive to be alive");
    }

    /// End the event stream as if the kernel stopped delivering events.
    pub fn close(&self) {
        self.feeder
            .send(Err(io::ErrorKind::UnexpectedEof.into()))
            .expect("primitive to be alive");
    }

    /// Whether the primitive has been dropped. Feeds an empty batch while it is alive.
    pub fn primitive_dropped(&self) -> bool {
        self.feeder.send(Ok(Vec::new())).is_err()
    }

    pub fn refuse(&self, path: impl Into<PathBuf>) {
        self.shared.lock().unwrap().refused.insert(path.into());
    }

    /// Delete `victim` from disk as soon as a watch is installed on `trigger`.
    pub fn remove_on_install(&self, trigger: impl Into<PathBuf>, victim: impl Into<PathBuf>) {
        self.shared
            .lock()
            .unwrap()
            .doomed
            .insert(trigger.into(), victim.into());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.lock().unwrap().calls.clone()
    }

    pub fn installed(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Install(path) => Some(path),
                Call::Remove(_) => None,
            })
            .collect()
    }
}

pub struct FakeInterrupt(Mutex<Sender<Batch>>);

impl Interrupt for FakeInterrupt {
    fn interrupt(&self) {
        drop(
            self.0
                .lock()
                .unwrap()
                .send(Err(io::ErrorKind::Interrupted.into())),
        );
    }
}

impl WatchPrimitive for FakePrimitive {
    type Interrupt = FakeInterrupt;

    fn install(&mut self, path: &Path, _mask: EventMask) -> io::Result<WatchDescriptor> {
        let mut shared = self.shared.lock().unwrap();
        if shared.refused.contains(path) {
            return Err(io::ErrorKind::PermissionDenied.into());
        }
        if !path.exists() {
            return Err(io::ErrorKind::NotFound.into());
        }
        if let Some(victim) = shared.doomed.remove(path) {
            drop(fs::remove_dir_all(victim));
        }
        shared.calls.push(Call::Install(path.to_path_buf()));
        let wd = WatchDescriptor::new(self.next_wd);
        self.next_wd += 1;
        Ok(wd)
    }

    fn remove(&mut self, wd: WatchDescriptor) -> io::Result<()> {
        self.shared.lock().unwrap().calls.push(Call::Remove(wd));
        Ok(())
    }

    fn read_batch(&mut self) -> io::Result<Vec<RawEvent>> {
        self.batches
            .recv()
            .unwrap_or_else(|_| Err(io::ErrorKind::BrokenPipe.into()))
    }

    fn interrupt_handle(&self) -> Self::Interrupt {
        FakeInterrupt(Mutex::new(self.feeder.clone()))
    }
}

/// A live event as the primitive would report it.
pub fn live(path: impl Into<PathBuf>, mask: EventMask, wd: i32) -> RawEvent {
    RawEvent {
        path: path.into(),
        mask,
        raw_mask: mask.bits(),
        wd: Some(WatchDescriptor::new(wd)),
        cookie: 0,
    }
}
