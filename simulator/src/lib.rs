//! # Summary
//!
//! External stimuli for a running population: a data mutator that rewrites
//! the value of a random live non-coordinator process, and a crash injector
//! that crashes random processes until none are left.

#[macro_use] extern crate log;

use std::ops::Range;
use std::thread;
use std::time;

use rand::seq::SliceRandom;
use rand::Rng;
use ringleader::Shared;

/// Largest value written by the data mutator, exclusive.
pub const DATA_RANGE: u32 = 100;

pub fn setup_logger(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let level = match verbosity {
    | 0 => log::LevelFilter::Info,
    | 1 => log::LevelFilter::Debug,
    | _ => log::LevelFilter::Trace,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message,
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()
}

/// Periodically overwrites the value of a random live non-coordinator.
pub struct Mutator {
    shared: Shared<u32>,
    delay: Range<u64>,
}

impl Mutator {
    /// `delay` is the range of seconds to wait between mutations.
    pub fn new(shared: Shared<u32>, delay: Range<u64>) -> Self {
        Mutator { shared, delay }
    }

    pub fn spawn(self) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name(String::from("mutator"))
            .spawn(move || self.run())
    }

    fn run(self) {
        let mut rng = rand::thread_rng();
        loop {
            let delay = if self.delay.start < self.delay.end {
                rng.gen_range(self.delay.clone())
            } else {
                self.delay.start
            };
            thread::sleep(time::Duration::from_secs(delay));
            let coordinator = self.shared.coordinator();
            let candidates = self.shared
                .directory()
                .live()
                .into_iter()
                .filter(|id| *id != coordinator)
                .collect::<Vec<_>>();
            if let Some(id) = candidates.choose(&mut rng) {
                let data = rng.gen_range(0..DATA_RANGE);
                info!("changing data for process {} to {}", id, data);
                self.shared.update(*id, data);
            }
        }
    }
}

/// Crashes random processes on a fixed period until none are alive.
pub struct Crasher {
    shared: Shared<u32>,
    period: time::Duration,
    coordinator_first: bool,
}

impl Crasher {
    pub fn new(shared: Shared<u32>, period: time::Duration, coordinator_first: bool) -> Self {
        Crasher { shared, period, coordinator_first }
    }

    /// Blocks until every process has crashed.
    pub fn run(self) {
        let mut rng = rand::thread_rng();
        let count = self.shared.directory().len();
        if self.coordinator_first {
            thread::sleep(self.period);
            let coordinator = self.shared.coordinator();
            info!("crashing coordinator {}", coordinator);
            self.shared.crash(coordinator);
        }
        while !self.shared.directory().live().is_empty() {
            thread::sleep(self.period);
            // Already-crashed picks are no-ops, as in a real failure injector.
            let id = rng.gen_range(1..=count);
            self.shared.crash(id);
        }
    }
}
