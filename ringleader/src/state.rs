//! # Summary
//!
//! This module contains the per-process record shared between every
//! concurrently running thread. Liveness and coordinatorship are atomic
//! flags; the replicated value and the ring view sit behind the process's
//! own exclusive lock.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, MutexGuard};

/// Unique process identifier, doubling as election priority.
pub type ProcessID = usize;

/// Replicated data value
pub trait Value: std::fmt::Debug
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Clone
    + PartialEq
    + Send
    + Sync
    + 'static
{
}

impl<T> Value for T where T: std::fmt::Debug
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Clone
    + PartialEq
    + Send
    + Sync
    + 'static
{
}

/// Fields guarded by the process lock.
#[derive(Clone, Debug, PartialEq)]
pub struct Local<D: Value> {
    pub data: D,
    pub ring: Vec<ProcessID>,
}

#[derive(Debug)]
pub struct Process<D: Value> {
    id: ProcessID,
    alive: AtomicBool,
    elected: AtomicBool,
    local: Mutex<Local<D>>,
}

impl<D: Value> Process<D> {

    pub fn new(id: ProcessID, data: D, ring: Vec<ProcessID>) -> Self {
        Process {
            id,
            alive: AtomicBool::new(true),
            elected: AtomicBool::new(false),
            local: Mutex::new(Local { data, ring }),
        }
    }

    pub fn id(&self) -> ProcessID {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Whether this process believes itself to be the coordinator.
    pub fn is_elected(&self) -> bool {
        self.elected.load(Ordering::SeqCst)
    }

    pub(crate) fn set_elected(&self, elected: bool) {
        self.elected.store(elected, Ordering::SeqCst);
    }

    /// Acquires the process lock.
    pub fn lock(&self) -> MutexGuard<Local<D>> {
        self.local.lock()
    }

    pub fn data(&self) -> D {
        self.local.lock().data.clone()
    }

    pub fn ring(&self) -> Vec<ProcessID> {
        self.local.lock().ring.clone()
    }

    /// Flips liveness to false under the process lock, so that a writer
    /// re-checking `is_alive` while holding the lock never writes into a
    /// crashed process. Returns `true` only for the call that crashed it.
    pub(crate) fn crash(&self) -> bool {
        let _guard = self.local.lock();
        self.alive.swap(false, Ordering::SeqCst)
    }

    /// Overwrites the held value if the process is still alive.
    pub(crate) fn store(&self, data: D) -> bool {
        let mut local = self.local.lock();
        if !self.is_alive() { return false }
        local.data = data;
        true
    }
}

/// Ids following `id` in `ring`, wrapping around and excluding `id` itself.
///
/// If `id` is missing from the ring the whole ring is scanned.
pub(crate) fn successors(ring: &[ProcessID], id: ProcessID) -> impl Iterator<Item = ProcessID> + '_ {
    let start = ring.iter()
        .position(|other| *other == id)
        .map(|index| index + 1)
        .unwrap_or(0);
    ring[start..].iter()
        .chain(ring[..start].iter())
        .cloned()
        .filter(move |other| *other != id)
}
