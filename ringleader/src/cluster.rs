//! # Summary
//!
//! Owning handle over a running population. External stimuli (crash and
//! data-update signals) enter the core here, and the handle joins every
//! process thread when it is shut down or dropped.

use std::sync::Arc;
use std::thread;

use crate::error::Error;
use crate::shared::Shared;
use crate::state::{Process, ProcessID, Value};
use crate::thread::process::{self, Worker};

pub use crate::thread::process::Tick;

pub struct Cluster<D: Value> {
    shared: Shared<D>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl<D: Value> Cluster<D> {

    pub(crate) fn new(shared: Shared<D>) -> Self {
        Cluster {
            shared,
            workers: Vec::new(),
        }
    }

    /// Spawns the loop of every process. Calling this twice has no effect.
    pub fn start(&mut self) -> Result<(), Error> {
        if !self.workers.is_empty() {
            return Ok(())
        }
        for id in self.shared.directory().ids().to_vec() {
            let worker = Worker::new(id, self.shared.clone());
            self.workers.push(worker.spawn()?);
        }
        info!("started {} processes", self.workers.len());
        Ok(())
    }

    /// Handle to the shared cluster state.
    pub fn shared(&self) -> Shared<D> {
        self.shared.clone()
    }

    /// Crashes process `id`. Returns `false` if it had already crashed.
    pub fn crash(&self, id: ProcessID) -> Result<bool, Error> {
        self.shared.crash(id).ok_or(Error::UnknownProcess(id))
    }

    /// Overwrites the value held by process `id`. Returns `false` if the
    /// process has crashed.
    pub fn update(&self, id: ProcessID, data: D) -> Result<bool, Error> {
        self.shared.update(id, data).ok_or(Error::UnknownProcess(id))
    }

    /// Runs one loop iteration of process `id` on the calling thread.
    pub fn tick(&self, id: ProcessID) -> Result<Tick, Error> {
        if self.shared.process(id).is_none() {
            return Err(Error::UnknownProcess(id))
        }
        Ok(process::tick(&self.shared, id))
    }

    pub fn coordinator(&self) -> ProcessID {
        self.shared.coordinator()
    }

    pub fn process(&self, id: ProcessID) -> Option<Arc<Process<D>>> {
        self.shared.process(id).cloned()
    }

    pub fn live(&self) -> Vec<ProcessID> {
        self.shared.directory().live()
    }

    pub fn all_crashed(&self) -> bool {
        self.live().is_empty()
    }

    pub fn election_in_progress(&self) -> bool {
        self.shared.gate().in_progress()
    }

    /// Stops every process loop and waits for the threads to exit.
    /// Elections already circulating run to completion on their own.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if !self.shared.is_stopped() {
            self.shared.stop();
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("process thread panicked");
            }
        }
    }
}

impl<D: Value> Drop for Cluster<D> {
    fn drop(&mut self) {
        self.stop();
    }
}
