use std::thread;

use crate::error::Error;
use crate::shared::Shared;
use crate::state::{ProcessID, Value};
use crate::thread::election::{Election, Outcome};
use crate::thread::{detector, heartbeat};

/// Result of one loop iteration of a process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tick {
    /// The process has crashed; its loop is over.
    Crashed,

    /// The process broadcast its value as coordinator.
    Heartbeat { delivered: usize },

    /// The coordinator looked alive, or another election was in flight.
    Idle,

    /// The process detected a failure and ran an election inline.
    Election(Outcome),
}

pub(crate) struct Worker<D: Value> {
    id: ProcessID,
    shared: Shared<D>,
}

impl<D: Value> Worker<D> {

    pub fn new(id: ProcessID, shared: Shared<D>) -> Self {
        Worker { id, shared }
    }

    pub fn spawn(self) -> Result<thread::JoinHandle<()>, Error> {
        thread::Builder::new()
            .name(format!("process-{}", self.id))
            .spawn(move || self.run())
            .map_err(Error::from)
    }

    /// Sleeps one interval, then heartbeats or detects, until the process
    /// crashes or the cluster stops.
    fn run(self) {
        debug!("process {} starting", self.id);
        while self.shared.sleep() {
            match step(&self.shared, self.id) {
            | Step::Crashed => break,
            | Step::Heartbeat(_) | Step::Idle => (),
            | Step::Election(election) => {
                let id = election.episode().id;
                if let Err(error) = election.spawn() {
                    error!("process {} failed to spawn election #{}: {}", self.id, id, error);
                }
            }
            }
        }
        debug!("process {} stopping", self.id);
    }
}

pub(crate) enum Step<D: Value> {
    Crashed,
    Heartbeat(usize),
    Idle,
    Election(Election<D>),
}

/// One iteration of the process loop, leaving any election unstarted.
pub(crate) fn step<D: Value>(shared: &Shared<D>, id: ProcessID) -> Step<D> {
    let process = match shared.process(id) {
    | Some(process) if process.is_alive() => process.clone(),
    | _ => return Step::Crashed,
    };
    if shared.coordinator() == id {
        Step::Heartbeat(heartbeat::broadcast(shared, &process))
    } else {
        match detector::check(shared, id) {
        | Some(election) => Step::Election(election),
        | None => Step::Idle,
        }
    }
}

/// One iteration of the process loop with any election run to completion.
pub(crate) fn tick<D: Value>(shared: &Shared<D>, id: ProcessID) -> Tick {
    match step(shared, id) {
    | Step::Crashed => Tick::Crashed,
    | Step::Heartbeat(delivered) => Tick::Heartbeat { delivered },
    | Step::Idle => Tick::Idle,
    | Step::Election(election) => Tick::Election(election.run()),
    }
}
