//! # Summary
//!
//! This module implements the cluster-wide state shared by every process
//! thread: the membership directory, the coordinator reference, the election
//! gate and the event sink. We wrap it in an `Arc` so that cloning a handle
//! is cheap; each mutable piece carries its own lock.

use std::sync::Arc;
use std::time;

use parking_lot::{Condvar, Mutex, RwLock};

use crate::directory::Directory;
use crate::gate::Gate;
use crate::message::Event;
use crate::sink::Sink;
use crate::state::{Process, ProcessID, Value};

/// Thread-safe handle to the cluster state.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct Shared<D: Value>(Arc<State<D>>);

struct State<D: Value> {
    directory: Directory<D>,
    coordinator: RwLock<ProcessID>,
    gate: Gate,
    sink: Box<dyn Sink<D>>,
    interval: time::Duration,
    chaos: f64,
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl<D: Value> Shared<D> {

    pub(crate) fn new(
        directory: Directory<D>,
        coordinator: ProcessID,
        gate: Gate,
        sink: Box<dyn Sink<D>>,
        interval: time::Duration,
        chaos: f64,
    ) -> Self {
        Shared(Arc::new(State {
            directory,
            coordinator: RwLock::new(coordinator),
            gate,
            sink,
            interval,
            chaos,
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        }))
    }

    pub fn directory(&self) -> &Directory<D> {
        &self.0.directory
    }

    pub fn process(&self, id: ProcessID) -> Option<&Arc<Process<D>>> {
        self.0.directory.get(id)
    }

    pub fn gate(&self) -> &Gate {
        &self.0.gate
    }

    /// Probability of force-crashing a successor during an election scan.
    pub fn chaos(&self) -> f64 {
        self.0.chaos
    }

    /// Current coordinator reference. May be stale by the time it is used.
    pub fn coordinator(&self) -> ProcessID {
        *self.0.coordinator.read()
    }

    pub fn is_alive(&self, id: ProcessID) -> bool {
        self.0.directory.is_alive(id)
    }

    pub fn emit(&self, event: Event<D>) {
        self.0.sink.emit(&event);
    }

    /// Crash signal. Returns `None` for an unknown id, otherwise whether
    /// this call crashed the process.
    pub fn crash(&self, id: ProcessID) -> Option<bool> {
        let process = self.process(id)?;
        let crashed = process.crash();
        if crashed {
            self.emit(Event::Crashed { process: id });
        }
        Some(crashed)
    }

    /// Data-update signal. Returns `None` for an unknown id, otherwise
    /// whether the value was applied.
    pub fn update(&self, id: ProcessID, data: D) -> Option<bool> {
        let process = self.process(id)?;
        let applied = process.store(data.clone());
        if applied {
            self.emit(Event::DataChanged { process: id, data });
        }
        Some(applied)
    }

    /// Makes `winner` the coordinator. Must run while the electing episode
    /// owns the gate; the caller emits `CoordinatorElected` once it is released.
    pub(crate) fn install_coordinator(&self, winner: ProcessID, participants: &[ProcessID]) {
        let mut coordinator = self.0.coordinator.write();
        let deposed = std::mem::replace(&mut *coordinator, winner);
        for id in participants.iter().chain(std::iter::once(&deposed)) {
            if let Some(process) = self.process(*id) {
                process.set_elected(*id == winner);
            }
        }
    }

    /// Sleeps for one interval. Returns `false` if the cluster was stopped.
    pub(crate) fn sleep(&self) -> bool {
        let deadline = time::Instant::now() + self.0.interval;
        let mut stopped = self.0.stopped.lock();
        while !*stopped {
            if self.0.wake.wait_until(&mut stopped, deadline).timed_out() {
                break
            }
        }
        !*stopped
    }

    pub(crate) fn is_stopped(&self) -> bool {
        *self.0.stopped.lock()
    }

    pub(crate) fn stop(&self) {
        *self.0.stopped.lock() = true;
        self.0.wake.notify_all();
    }
}
