//! # Summary
//!
//! Cluster-wide election gate. At most one election episode owns the gate
//! at any time. Ownership is released when the owning episode completes, or
//! reclaimed by a later detector once the owner has held it longer than the
//! election timeout (its token was lost or the ring degenerated).

use std::time;

use parking_lot::Mutex;

use crate::state::ProcessID;

/// Monotonically increasing election episode number.
pub type EpisodeID = u64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Episode {
    pub id: EpisodeID,
    pub originator: ProcessID,
    started: time::Instant,
}

/// Result of asking the gate to start an election.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The caller owns the gate for the new episode.
    Accepted(Episode),

    /// A stale episode was abandoned and the caller owns the gate instead.
    Reclaimed { stale: EpisodeID, episode: Episode },

    /// Another episode is in flight.
    Busy(EpisodeID),

    /// The election is no longer needed.
    Resolved,
}

#[derive(Debug)]
struct State {
    next: EpisodeID,
    current: Option<Episode>,
}

#[derive(Debug)]
pub struct Gate {
    timeout: time::Duration,
    state: Mutex<State>,
}

impl Gate {

    pub fn new(timeout: time::Duration) -> Self {
        Gate {
            timeout,
            state: Mutex::new(State {
                next: 1,
                current: None,
            }),
        }
    }

    /// Attempts to open a new episode for `originator`.
    ///
    /// `needed` is evaluated under the gate lock; since completions also run
    /// under this lock, a caller that observed a dead coordinator before a
    /// concurrent election finished cannot start a redundant one.
    pub fn try_acquire<F>(&self, originator: ProcessID, needed: F) -> Admission
        where F: FnOnce() -> bool
    {
        let mut state = self.state.lock();
        if !needed() {
            return Admission::Resolved
        }
        let stale = match state.current {
        | Some(current) if current.started.elapsed() < self.timeout => {
            return Admission::Busy(current.id)
        }
        | Some(current) => Some(current.id),
        | None => None,
        };
        let episode = Episode {
            id: state.next,
            originator,
            started: time::Instant::now(),
        };
        state.next += 1;
        state.current = Some(episode);
        match stale {
        | Some(stale) => Admission::Reclaimed { stale, episode },
        | None => Admission::Accepted(episode),
        }
    }

    /// Runs `complete` and releases the gate, but only if episode `id`
    /// still owns it. Returns `None` if the episode was reclaimed.
    pub fn complete<F, T>(&self, id: EpisodeID, complete: F) -> Option<T>
        where F: FnOnce() -> T
    {
        let mut state = self.state.lock();
        match state.current {
        | Some(current) if current.id == id => {
            let result = complete();
            state.current = None;
            Some(result)
        }
        | _ => None,
        }
    }

    /// Episode currently owning the gate.
    pub fn current(&self) -> Option<EpisodeID> {
        self.state.lock().current.map(|episode| episode.id)
    }

    pub fn in_progress(&self) -> bool {
        self.current().is_some()
    }
}

#[cfg(test)]
mod tests {

    use std::sync::{Arc, Barrier};

    use super::*;

    fn accepted(admission: Admission) -> Episode {
        match admission {
        | Admission::Accepted(episode) => episode,
        | other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[test]
    fn second_request_is_busy() {
        let gate = Gate::new(time::Duration::from_secs(60));
        let episode = accepted(gate.try_acquire(1, || true));
        assert_eq!(gate.try_acquire(2, || true), Admission::Busy(episode.id));
        assert_eq!(gate.current(), Some(episode.id));
    }

    #[test]
    fn unneeded_request_is_resolved() {
        let gate = Gate::new(time::Duration::from_secs(60));
        assert_eq!(gate.try_acquire(1, || false), Admission::Resolved);
        assert!(!gate.in_progress());
    }

    #[test]
    fn completion_releases_gate() {
        let gate = Gate::new(time::Duration::from_secs(60));
        let episode = accepted(gate.try_acquire(1, || true));
        assert_eq!(gate.complete(episode.id, || 7), Some(7));
        assert!(!gate.in_progress());
        let next = accepted(gate.try_acquire(2, || true));
        assert!(next.id > episode.id);
    }

    #[test]
    fn expired_episode_is_reclaimed_and_cannot_complete() {
        let gate = Gate::new(time::Duration::from_millis(0));
        let stale = accepted(gate.try_acquire(1, || true));
        let episode = match gate.try_acquire(2, || true) {
        | Admission::Reclaimed { stale: id, episode } => {
            assert_eq!(id, stale.id);
            episode
        }
        | other => panic!("expected reclaim, got {:?}", other),
        };
        assert_eq!(gate.complete(stale.id, || ()), None);
        assert_eq!(gate.current(), Some(episode.id));
        assert_eq!(gate.complete(episode.id, || ()), Some(()));
    }

    #[test]
    fn concurrent_requests_admit_one() {
        let gate = Arc::new(Gate::new(time::Duration::from_secs(60)));
        let barrier = Arc::new(Barrier::new(8));
        let handles = (0..8)
            .map(|id| {
                let gate = gate.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    gate.try_acquire(id, || true)
                })
            })
            .collect::<Vec<_>>();
        let accepted = handles.into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|admission| match admission {
            | Admission::Accepted(_) => true,
            | _ => false,
            })
            .count();
        assert_eq!(accepted, 1);
    }
}
