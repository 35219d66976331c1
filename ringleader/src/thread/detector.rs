use crate::gate::Admission;
use crate::message::Event;
use crate::shared::Shared;
use crate::state::{ProcessID, Value};
use crate::thread::election::Election;

/// Checks the referenced coordinator on behalf of `detector`.
///
/// Returns the election this detector is now responsible for running, or
/// `None` when the coordinator is alive, another episode holds the gate, or
/// a concurrent election already replaced the coordinator.
pub(crate) fn check<D: Value>(shared: &Shared<D>, detector: ProcessID) -> Option<Election<D>> {
    let coordinator = shared.coordinator();
    if shared.is_alive(coordinator) {
        return None
    }

    let admission = shared.gate().try_acquire(detector, || {
        !shared.is_alive(shared.coordinator())
    });

    let episode = match admission {
    | Admission::Accepted(episode) => episode,
    | Admission::Reclaimed { stale, episode } => {
        shared.emit(Event::ElectionReclaimed { stale, episode: episode.id });
        episode
    }
    | Admission::Busy(current) => {
        trace!("process {} found election #{} in progress", detector, current);
        return None
    }
    | Admission::Resolved => return None,
    };

    shared.emit(Event::FailureDetected {
        detector,
        coordinator,
        episode: episode.id,
    });
    Some(Election::new(shared.clone(), episode))
}
