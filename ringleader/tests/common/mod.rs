#![allow(dead_code)]

use std::sync::Arc;
use std::time;

use parking_lot::Mutex;
use ringleader::sink::Recorder;
use ringleader::{Cluster, Config, Event, ProcessID, Shared, Sink};

type Trigger = Box<dyn Fn(&Event<u32>) -> bool + Send + Sync>;

struct Wire {
    trigger: Trigger,
    victim: ProcessID,
    shared: Shared<u32>,
}

/// Records every event and crashes a chosen process the first time a
/// matching event is emitted.
#[derive(Default)]
pub struct Tripwire {
    recorder: Recorder<u32>,
    wire: Mutex<Option<Wire>>,
}

impl Tripwire {
    pub fn arm<F>(&self, cluster: &Cluster<u32>, victim: ProcessID, trigger: F)
        where F: Fn(&Event<u32>) -> bool + Send + Sync + 'static
    {
        *self.wire.lock() = Some(Wire {
            trigger: Box::new(trigger),
            victim,
            shared: cluster.shared(),
        });
    }

    pub fn recorder(&self) -> &Recorder<u32> {
        &self.recorder
    }

    pub fn is_armed(&self) -> bool {
        self.wire.lock().is_some()
    }
}

impl Sink<u32> for Tripwire {
    fn emit(&self, event: &Event<u32>) {
        self.recorder.emit(event);
        let fired = {
            let mut wire = self.wire.lock();
            let matched = wire.as_ref()
                .map_or(false, |armed| (armed.trigger)(event));
            if matched { wire.take() } else { None }
        };
        if let Some(wire) = fired {
            wire.shared.crash(wire.victim);
        }
    }
}

pub fn build(count: usize) -> (Cluster<u32>, Arc<Recorder<u32>>) {
    let recorder = Arc::new(Recorder::new());
    let cluster = Config::new(count)
        .with_election_timeout(time::Duration::from_secs(60))
        .build(|id| id as u32 * 10, recorder.clone())
        .expect("valid configuration");
    (cluster, recorder)
}

pub fn build_wired(count: usize, timeout: time::Duration) -> (Cluster<u32>, Arc<Tripwire>) {
    let tripwire = Arc::new(Tripwire::default());
    let cluster = Config::new(count)
        .with_election_timeout(timeout)
        .build(|id| id as u32 * 10, tripwire.clone())
        .expect("valid configuration");
    (cluster, tripwire)
}

pub fn started(events: &[Event<u32>]) -> usize {
    events.iter()
        .filter(|event| match event {
        | Event::ElectionStarted { .. } => true,
        | _ => false,
        })
        .count()
}

/// Polls `condition` until it holds or five seconds pass.
pub fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = time::Instant::now() + time::Duration::from_secs(5);
    while time::Instant::now() < deadline {
        if condition() {
            return true
        }
        std::thread::sleep(time::Duration::from_millis(5));
    }
    condition()
}
