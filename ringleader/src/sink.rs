//! # Summary
//!
//! Destinations for observable state transitions. The core emits each
//! transition exactly once and never while holding a process lock or the
//! election gate, so a sink is free to call back into the cluster.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::message::Event;
use crate::state::Value;

/// Receiver of observable state transitions.
pub trait Sink<D: Value>: Send + Sync + 'static {
    fn emit(&self, event: &Event<D>);
}

impl<D: Value, S: Sink<D> + ?Sized> Sink<D> for Arc<S> {
    fn emit(&self, event: &Event<D>) {
        (**self).emit(event)
    }
}

impl<D: Value, A: Sink<D>, B: Sink<D>> Sink<D> for (A, B) {
    fn emit(&self, event: &Event<D>) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

/// Forwards events to the `log` facade.
#[derive(Copy, Clone, Debug, Default)]
pub struct Logger;

impl<D: Value> Sink<D> for Logger {
    fn emit(&self, event: &Event<D>) {
        match event {
        | Event::Crashed { .. }
        | Event::TokenLost { .. }
        | Event::ElectionReclaimed { .. }
        | Event::ElectionSuperseded { .. } => warn!("{}", event),
        | Event::HeartbeatSent { .. }
        | Event::HeartbeatApplied { .. }
        | Event::TokenForwarded { .. }
        | Event::TokenExtended { .. } => debug!("{}", event),
        | _ => info!("{}", event),
        }
    }
}

/// Keeps every emitted event in memory.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Default(bound = ""))]
pub struct Recorder<D: Value> {
    events: Mutex<Vec<Event<D>>>,
}

impl<D: Value> Recorder<D> {

    pub fn new() -> Self {
        Recorder::default()
    }

    /// Snapshot of all events recorded so far.
    pub fn events(&self) -> Vec<Event<D>> {
        self.events.lock().clone()
    }

    /// Number of recorded events matching `predicate`.
    pub fn count<F>(&self, predicate: F) -> usize
        where F: Fn(&Event<D>) -> bool
    {
        self.events.lock()
            .iter()
            .filter(|event| predicate(event))
            .count()
    }
}

impl<D: Value> Sink<D> for Recorder<D> {
    fn emit(&self, event: &Event<D>) {
        self.events.lock().push(event.clone());
    }
}
