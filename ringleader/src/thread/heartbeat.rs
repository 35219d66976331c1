use crate::message::Event;
use crate::shared::Shared;
use crate::state::{Process, Value};

/// Pushes the coordinator's current value to every other live process.
///
/// The value is read once under the coordinator's lock and the lock is
/// released before any target is touched, so two processes that both
/// believe themselves coordinator never wait on each other's locks. Each
/// target is re-checked for liveness under its own lock before the write.
/// Returns the number of processes that applied the value.
pub(crate) fn broadcast<D: Value>(shared: &Shared<D>, coordinator: &Process<D>) -> usize {
    let data = coordinator.data();
    let mut delivered = 0;
    for target in shared.directory().iter() {
        if target.id() == coordinator.id() || !target.is_alive() {
            continue
        }
        shared.emit(Event::HeartbeatSent {
            coordinator: coordinator.id(),
            target: target.id(),
            data: data.clone(),
        });
        if target.store(data.clone()) {
            delivered += 1;
            shared.emit(Event::HeartbeatApplied {
                coordinator: coordinator.id(),
                target: target.id(),
                data: data.clone(),
            });
        } else {
            trace!("process {} crashed before applying heartbeat", target.id());
        }
    }
    delivered
}
