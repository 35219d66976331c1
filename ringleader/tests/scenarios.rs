mod common;

use std::sync::{mpsc, Arc, Barrier};
use std::time;

use parking_lot::Mutex;
use ringleader::{Config, Error, Event, Outcome, Shared, Sink, Tick};

use crate::common::{build, build_wired, started};

fn elected(tick: Tick) -> (usize, Vec<usize>) {
    match tick {
    | Tick::Election(Outcome::Elected { coordinator, token }) => (coordinator, token.ids),
    | other => panic!("expected a completed election, got {:?}", other),
    }
}

#[test]
fn highest_id_starts_as_coordinator() {
    for count in 2..=7 {
        let (cluster, recorder) = build(count);
        assert_eq!(cluster.coordinator(), count);
        for id in 1..=count {
            let process = cluster.process(id).unwrap();
            let expected = (id..=count).chain(1..id).collect::<Vec<_>>();
            assert_eq!(process.ring(), expected);
            assert_eq!(process.is_elected(), id == count);
        }
        assert_eq!(recorder.events(), vec![Event::Initialized {
            coordinator: count,
            ring: (count..=count).chain(1..count).collect(),
        }]);
    }
}

#[test]
fn coordinator_crash_elects_next_highest() {
    let (cluster, _) = build(3);
    cluster.crash(3).unwrap();

    let (coordinator, token) = elected(cluster.tick(2).unwrap());
    assert_eq!(coordinator, 2);
    assert_eq!(token, vec![2, 1]);
    assert_eq!(cluster.coordinator(), 2);
    assert_eq!(cluster.process(1).unwrap().ring(), vec![1, 2]);
    assert_eq!(cluster.process(2).unwrap().ring(), vec![2, 1]);
    assert!(cluster.process(2).unwrap().is_elected());
    assert!(!cluster.process(1).unwrap().is_elected());
    assert!(!cluster.process(3).unwrap().is_elected());
    assert!(!cluster.election_in_progress());
}

#[test]
fn lowest_originator_reaches_same_winner() {
    let (cluster, recorder) = build(3);
    cluster.crash(3).unwrap();

    let (coordinator, token) = elected(cluster.tick(1).unwrap());
    assert_eq!(coordinator, 2);
    assert_eq!(token, vec![1, 2]);
    assert_eq!(cluster.tick(2).unwrap(), Tick::Heartbeat { delivered: 1 });
    assert_eq!(cluster.tick(1).unwrap(), Tick::Idle);
    assert_eq!(started(&recorder.events()), 1);
}

#[test]
fn concurrent_detectors_start_one_election() {
    let (cluster, recorder) = build(5);
    let cluster = Arc::new(cluster);
    cluster.crash(5).unwrap();

    let barrier = Arc::new(Barrier::new(4));
    let handles = (1..=4)
        .map(|id| {
            let cluster = cluster.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                cluster.tick(id).unwrap()
            })
        })
        .collect::<Vec<_>>();

    let elections = handles.into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|tick| match tick {
        | Tick::Election(_) => true,
        | _ => false,
        })
        .count();

    assert_eq!(elections, 1);
    assert_eq!(started(&recorder.events()), 1);
    assert_eq!(cluster.coordinator(), 4);
    assert!(!cluster.election_in_progress());
}

#[test]
fn heartbeat_overwrites_live_peers() {
    let (cluster, recorder) = build(4);
    cluster.crash(2).unwrap();
    assert!(cluster.update(4, 99).unwrap());

    assert_eq!(cluster.tick(4).unwrap(), Tick::Heartbeat { delivered: 2 });
    assert_eq!(cluster.process(1).unwrap().data(), 99);
    assert_eq!(cluster.process(3).unwrap().data(), 99);
    assert_eq!(cluster.process(2).unwrap().data(), 20);

    let applied = recorder.count(|event| match event {
    | Event::HeartbeatApplied { data: 99, .. } => true,
    | _ => false,
    });
    assert_eq!(applied, 2);
}

#[test]
fn successive_coordinator_crashes_converge() {
    let (cluster, recorder) = build(4);
    cluster.crash(4).unwrap();

    let (first, token) = elected(cluster.tick(3).unwrap());
    assert_eq!(first, 3);
    assert_eq!(token, vec![3, 1, 2]);

    cluster.crash(3).unwrap();
    let (second, token) = elected(cluster.tick(2).unwrap());
    assert_eq!(second, 2);
    assert_eq!(token, vec![2, 1]);

    assert_eq!(cluster.coordinator(), 2);
    assert_eq!(cluster.tick(1).unwrap(), Tick::Idle);
    assert_eq!(started(&recorder.events()), 2);
    assert!(!cluster.election_in_progress());
}

#[test]
fn originator_crash_mid_circulation_is_retried() {
    let (cluster, tripwire) = build_wired(4, time::Duration::from_secs(60));
    tripwire.arm(&cluster, 3, |event| match event {
    | Event::TokenForwarded { to: 2, .. } => true,
    | _ => false,
    });
    cluster.crash(4).unwrap();

    // The token closes at 1 without its crashed originator, so the highest
    // collected id is a process that is already gone.
    let (coordinator, token) = elected(cluster.tick(3).unwrap());
    assert!(!tripwire.is_armed());
    assert_eq!(coordinator, 3);
    assert_eq!(token, vec![3, 1, 2]);
    assert_eq!(cluster.process(1).unwrap().ring(), vec![1, 2, 3]);
    assert_eq!(cluster.process(2).unwrap().ring(), vec![2, 3, 1]);

    let (coordinator, token) = elected(cluster.tick(2).unwrap());
    assert_eq!(coordinator, 2);
    assert_eq!(token, vec![2, 1]);
    assert!(cluster.process(2).unwrap().is_alive());
    assert_eq!(started(&tripwire.recorder().events()), 2);
}

#[test]
fn lost_token_is_reclaimed_after_timeout() {
    let (cluster, tripwire) = build_wired(4, time::Duration::from_millis(50));
    tripwire.arm(&cluster, 1, |event| match event {
    | Event::TokenExtended { process: 1, .. } => true,
    | _ => false,
    });
    cluster.crash(4).unwrap();

    match cluster.tick(3).unwrap() {
    | Tick::Election(Outcome::Lost { holder, .. }) => assert_eq!(holder, 1),
    | other => panic!("expected a lost token, got {:?}", other),
    }
    assert!(cluster.election_in_progress());
    assert_eq!(cluster.tick(2).unwrap(), Tick::Idle);

    std::thread::sleep(time::Duration::from_millis(100));
    let (coordinator, token) = elected(cluster.tick(2).unwrap());
    assert_eq!(coordinator, 3);
    assert_eq!(token, vec![2, 3]);

    let reclaimed = tripwire.recorder().count(|event| match event {
    | Event::ElectionReclaimed { .. } => true,
    | _ => false,
    });
    assert_eq!(reclaimed, 1);
    assert!(!cluster.election_in_progress());
}

#[test]
fn lone_survivor_stalls_without_erroring() {
    let (cluster, _) = build(2);
    cluster.crash(2).unwrap();

    match cluster.tick(1).unwrap() {
    | Tick::Election(Outcome::Stalled { holder, token }) => {
        assert_eq!(holder, 1);
        assert_eq!(token.ids, vec![1]);
    }
    | other => panic!("expected a stalled election, got {:?}", other),
    }
    assert_eq!(cluster.coordinator(), 2);
    assert_eq!(cluster.tick(1).unwrap(), Tick::Idle);
}

#[test]
fn external_signals() {
    let (cluster, recorder) = build(3);

    match cluster.crash(9) {
    | Err(Error::UnknownProcess(9)) => (),
    | other => panic!("unexpected result {:?}", other),
    }
    assert!(cluster.crash(1).unwrap());
    assert!(!cluster.crash(1).unwrap());
    assert!(!cluster.update(1, 5).unwrap());
    assert!(cluster.update(2, 5).unwrap());
    assert_eq!(cluster.process(2).unwrap().data(), 5);
    assert_eq!(cluster.tick(1).unwrap(), Tick::Crashed);

    let crashes = recorder.count(|event| match event {
    | Event::Crashed { .. } => true,
    | _ => false,
    });
    assert_eq!(crashes, 1);
    assert_eq!(cluster.live(), vec![2, 3]);
}

/// Reads the election gate back from inside the sink whenever a
/// coordinator is elected.
#[derive(Default)]
struct GateReader {
    shared: Mutex<Option<Shared<u32>>>,
    seen: Mutex<Vec<bool>>,
}

impl Sink<u32> for GateReader {
    fn emit(&self, event: &Event<u32>) {
        let shared = match event {
        | Event::CoordinatorElected { .. } => self.shared.lock().clone(),
        | _ => None,
        };
        if let Some(shared) = shared {
            let busy = shared.gate().in_progress();
            self.seen.lock().push(busy);
        }
    }
}

#[test]
fn sink_can_read_gate_when_coordinator_is_elected() {
    let sink = Arc::new(GateReader::default());
    let cluster = Config::new(3)
        .with_election_timeout(time::Duration::from_secs(60))
        .build(|id| id as u32, sink.clone())
        .expect("valid configuration");
    *sink.shared.lock() = Some(cluster.shared());
    cluster.crash(3).unwrap();

    let (tx, rx) = mpsc::channel();
    let cluster = Arc::new(cluster);
    let ticker = cluster.clone();
    std::thread::spawn(move || {
        let _ = tx.send(ticker.tick(2).unwrap());
    });

    let tick = rx.recv_timeout(time::Duration::from_secs(5))
        .expect("election completes while the sink reads the gate");
    assert_eq!(elected(tick).0, 2);
    assert_eq!(*sink.seen.lock(), vec![false]);
    assert_eq!(cluster.tick(1).unwrap(), Tick::Idle);
}
