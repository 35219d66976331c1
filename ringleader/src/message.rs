use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::gate::EpisodeID;
use crate::state::{ProcessID, Value};

/// Candidate list circulated during an election.
///
/// Every forwarding step produces a fresh, independently owned token.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub episode: EpisodeID,
    pub ids: Vec<ProcessID>,
}

impl Token {

    /// Initial token containing only the originator.
    pub fn new(episode: EpisodeID, originator: ProcessID) -> Self {
        Token {
            episode,
            ids: vec![originator],
        }
    }

    pub fn contains(&self, id: ProcessID) -> bool {
        self.ids.contains(&id)
    }

    /// Copy of this token with `id` appended.
    pub fn extend(&self, id: ProcessID) -> Self {
        let mut ids = Vec::with_capacity(self.ids.len() + 1);
        ids.extend_from_slice(&self.ids);
        ids.push(id);
        Token {
            episode: self.episode,
            ids,
        }
    }

    /// Highest id collected so far.
    pub fn winner(&self) -> Option<ProcessID> {
        self.ids.iter().max().cloned()
    }

    /// The collected ids rotated to start at `id`, or `None` if `id`
    /// never joined this token.
    pub fn rotation(&self, id: ProcessID) -> Option<Vec<ProcessID>> {
        let index = self.ids.iter().position(|other| *other == id)?;
        Some(self.ids[index..].iter()
            .chain(self.ids[..index].iter())
            .cloned()
            .collect())
    }
}

/// Observable state transition.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(bound(serialize = "", deserialize = ""))]
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""), PartialEq(bound = ""))]
pub enum Event<D: Value> {
    Initialized {
        coordinator: ProcessID,
        ring: Vec<ProcessID>,
    },
    HeartbeatSent {
        coordinator: ProcessID,
        target: ProcessID,
        data: D,
    },
    HeartbeatApplied {
        coordinator: ProcessID,
        target: ProcessID,
        data: D,
    },
    DataChanged {
        process: ProcessID,
        data: D,
    },
    Crashed {
        process: ProcessID,
    },
    FailureDetected {
        detector: ProcessID,
        coordinator: ProcessID,
        episode: EpisodeID,
    },
    ElectionReclaimed {
        stale: EpisodeID,
        episode: EpisodeID,
    },
    ElectionStarted {
        episode: EpisodeID,
        originator: ProcessID,
    },
    TokenForwarded {
        episode: EpisodeID,
        from: ProcessID,
        to: ProcessID,
        token: Vec<ProcessID>,
    },
    TokenExtended {
        episode: EpisodeID,
        process: ProcessID,
        token: Vec<ProcessID>,
    },
    TokenReturned {
        episode: EpisodeID,
        process: ProcessID,
        token: Vec<ProcessID>,
    },
    RingInstalled {
        episode: EpisodeID,
        process: ProcessID,
        ring: Vec<ProcessID>,
    },
    CoordinatorElected {
        episode: EpisodeID,
        coordinator: ProcessID,
    },
    ElectionStalled {
        episode: EpisodeID,
        holder: ProcessID,
        token: Vec<ProcessID>,
    },
    TokenLost {
        episode: EpisodeID,
        holder: ProcessID,
        token: Vec<ProcessID>,
    },
    ElectionSuperseded {
        episode: EpisodeID,
    },
}

impl<D: Value> Event<D> {
    /// Election episode this event belongs to, if any.
    pub fn episode(&self) -> Option<EpisodeID> {
        match self {
        | Event::FailureDetected { episode, .. }
        | Event::ElectionReclaimed { episode, .. }
        | Event::ElectionStarted { episode, .. }
        | Event::TokenForwarded { episode, .. }
        | Event::TokenExtended { episode, .. }
        | Event::TokenReturned { episode, .. }
        | Event::RingInstalled { episode, .. }
        | Event::CoordinatorElected { episode, .. }
        | Event::ElectionStalled { episode, .. }
        | Event::TokenLost { episode, .. }
        | Event::ElectionSuperseded { episode } => Some(*episode),
        | _ => None,
        }
    }
}

impl<D: Value> fmt::Display for Event<D> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
        | Event::Initialized { coordinator, ring } => {
            write!(fmt, "process {} is the initial coordinator with ring {:?}", coordinator, ring)
        }
        | Event::HeartbeatSent { coordinator, target, data } => {
            write!(fmt, "coordinator {} is sending data {:?} to process {}", coordinator, data, target)
        }
        | Event::HeartbeatApplied { coordinator, target, data } => {
            write!(fmt, "process {} updated its data to {:?} (received from coordinator {})", target, data, coordinator)
        }
        | Event::DataChanged { process, data } => {
            write!(fmt, "process {} changed its data to {:?}", process, data)
        }
        | Event::Crashed { process } => {
            write!(fmt, "process {} crashed", process)
        }
        | Event::FailureDetected { detector, coordinator, episode } => {
            write!(fmt, "process {} detects that coordinator {} has crashed, starting election #{}", detector, coordinator, episode)
        }
        | Event::ElectionReclaimed { stale, episode } => {
            write!(fmt, "election #{} timed out, reclaimed by election #{}", stale, episode)
        }
        | Event::ElectionStarted { episode, originator } => {
            write!(fmt, "process {} is starting election #{} with token [{}]", originator, episode, originator)
        }
        | Event::TokenForwarded { episode, from, to, token } => {
            write!(fmt, "election #{}: process {} passing token {:?} to process {}", episode, from, token, to)
        }
        | Event::TokenExtended { episode, process, token } => {
            write!(fmt, "election #{}: process {} added itself, token is now {:?}", episode, process, token)
        }
        | Event::TokenReturned { episode, process, token } => {
            write!(fmt, "election #{}: process {} found itself in token {:?}", episode, process, token)
        }
        | Event::RingInstalled { episode, process, ring } => {
            write!(fmt, "election #{}: process {} installed ring {:?}", episode, process, ring)
        }
        | Event::CoordinatorElected { episode, coordinator } => {
            write!(fmt, "election #{}: process {} is the new coordinator", episode, coordinator)
        }
        | Event::ElectionStalled { episode, holder, token } => {
            write!(fmt, "election #{}: process {} found no live successor for token {:?}", episode, holder, token)
        }
        | Event::TokenLost { episode, holder, token } => {
            write!(fmt, "election #{}: token {:?} lost with crashed process {}", episode, token, holder)
        }
        | Event::ElectionSuperseded { episode } => {
            write!(fmt, "election #{} completed after being reclaimed, result discarded", episode)
        }
        }
    }
}
