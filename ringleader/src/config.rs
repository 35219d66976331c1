use std::time;

use crate::cluster::Cluster;
use crate::directory::Directory;
use crate::error::Error;
use crate::gate::Gate;
use crate::message::Event;
use crate::shared::Shared;
use crate::sink::Sink;
use crate::state::{ProcessID, Value};

#[derive(Copy, Clone, Debug)]
pub struct Config {
    /// Total number of processes
    count: usize,

    /// Period of heartbeats and failure detection
    interval: time::Duration,

    /// Age after which an unfinished election may be reclaimed
    timeout: Option<time::Duration>,

    /// Probability of force-crashing a successor once per election
    chaos: f64,
}

impl Config {
    pub fn new(count: usize) -> Self {
        Config {
            count,
            interval: time::Duration::from_secs(4),
            timeout: None,
            chaos: 0.0,
        }
    }

    pub fn with_interval(mut self, interval: time::Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Defaults to twice the interval.
    pub fn with_election_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_election_chaos(mut self, chaos: f64) -> Self {
        self.chaos = chaos;
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn interval(&self) -> time::Duration {
        self.interval
    }

    pub fn election_timeout(&self) -> time::Duration {
        self.timeout.unwrap_or(self.interval * 2)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.count < 2 {
            return Err(Error::InvalidTopology { count: self.count })
        }
        if !(0.0..=1.0).contains(&self.chaos) {
            return Err(Error::InvalidProbability(self.chaos))
        }
        Ok(())
    }

    /// Creates processes `1..=count` with `init(id)` as their initial value
    /// and the highest id as coordinator. No thread is started.
    pub fn build<D, F, S>(self, init: F, sink: S) -> Result<Cluster<D>, Error>
        where D: Value,
              F: FnMut(ProcessID) -> D,
              S: Sink<D>,
    {
        self.validate()?;
        let directory = Directory::new(self.count, init);
        let coordinator = self.count;
        let ring = directory.get(coordinator)
            .map(|process| process.ring())
            .unwrap_or_default();
        if let Some(process) = directory.get(coordinator) {
            process.set_elected(true);
        }
        let shared = Shared::new(
            directory,
            coordinator,
            Gate::new(self.election_timeout()),
            Box::new(sink),
            self.interval,
            self.chaos,
        );
        shared.emit(Event::Initialized { coordinator, ring });
        Ok(Cluster::new(shared))
    }

    /// Builds the cluster and starts one thread per process.
    pub fn run<D, F, S>(self, init: F, sink: S) -> Result<Cluster<D>, Error>
        where D: Value,
              F: FnMut(ProcessID) -> D,
              S: Sink<D>,
    {
        let mut cluster = self.build(init, sink)?;
        cluster.start()?;
        Ok(cluster)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::sink::Logger;

    #[test]
    fn rejects_single_process() {
        match Config::new(1).build(|_| 0u32, Logger) {
        | Err(Error::InvalidTopology { count }) => assert_eq!(count, 1),
        | _ => panic!("single process accepted"),
        }
    }

    #[test]
    fn rejects_bad_probability() {
        match Config::new(3).with_election_chaos(1.5).build(|_| 0u32, Logger) {
        | Err(Error::InvalidProbability(chaos)) => assert_eq!(chaos, 1.5),
        | _ => panic!("probability accepted"),
        }
    }

    #[test]
    fn timeout_defaults_to_two_intervals() {
        let config = Config::new(3).with_interval(time::Duration::from_millis(50));
        assert_eq!(config.election_timeout(), time::Duration::from_millis(100));
    }
}
