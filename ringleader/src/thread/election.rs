//! # Summary
//!
//! Token-circulation election. The originator starts a token holding only
//! its own id and hands it to the first live successor in its ring view.
//! A receiver whose id is not yet in the token appends itself and forwards
//! the token from its own ring view; a receiver that finds itself already
//! present closes the election. The closer installs the token, rotated to
//! start at each member, as the ring of every live member, and makes the
//! highest collected id the coordinator.
//!
//! Every receiver either closes the election or adds a new id to the token,
//! so circulation ends after at most one pass over the directory.

use std::thread;

use rand::Rng;

use crate::gate::Episode;
use crate::message::{Event, Token};
use crate::shared::Shared;
use crate::state::{successors, Process, ProcessID, Value};

/// How an election episode ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The token returned and `coordinator` was installed.
    Elected { coordinator: ProcessID, token: Token },

    /// The holder found no live successor in its ring view.
    Stalled { holder: ProcessID, token: Token },

    /// The holder crashed before forwarding the token.
    Lost { holder: ProcessID, token: Token },

    /// The token returned after the gate had been reclaimed by a newer
    /// episode; nothing was installed.
    Superseded { token: Token },
}

pub struct Election<D: Value> {
    shared: Shared<D>,
    episode: Episode,
    chaos_spent: bool,
}

impl<D: Value> Election<D> {

    pub fn new(shared: Shared<D>, episode: Episode) -> Self {
        Election {
            shared,
            episode,
            chaos_spent: false,
        }
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    /// Runs the election on a thread of its own.
    pub fn spawn(self) -> std::io::Result<thread::JoinHandle<Outcome>> {
        thread::Builder::new()
            .name(format!("election-{}", self.episode.id))
            .spawn(move || self.run())
    }

    /// Circulates the token until the election closes or stalls.
    pub fn run(mut self) -> Outcome {
        let originator = self.episode.originator;
        let mut token = Token::new(self.episode.id, originator);
        let mut holder = originator;

        self.shared.emit(Event::ElectionStarted {
            episode: self.episode.id,
            originator,
        });

        loop {
            let process = match self.shared.process(holder) {
            | Some(process) if process.is_alive() => process.clone(),
            | _ => {
                self.shared.emit(Event::TokenLost {
                    episode: self.episode.id,
                    holder,
                    token: token.ids.clone(),
                });
                return Outcome::Lost { holder, token }
            }
            };

            let next = match self.successor(&process) {
            | Some(next) => next,
            | None => {
                self.shared.emit(Event::ElectionStalled {
                    episode: self.episode.id,
                    holder,
                    token: token.ids.clone(),
                });
                return Outcome::Stalled { holder, token }
            }
            };

            self.shared.emit(Event::TokenForwarded {
                episode: self.episode.id,
                from: holder,
                to: next,
                token: token.ids.clone(),
            });

            if token.contains(next) {
                return self.complete(next, token)
            }

            token = token.extend(next);
            holder = next;
            self.shared.emit(Event::TokenExtended {
                episode: self.episode.id,
                process: holder,
                token: token.ids.clone(),
            });
        }
    }

    /// First live process following `holder` in its own ring view.
    fn successor(&mut self, holder: &Process<D>) -> Option<ProcessID> {
        let ring = holder.ring();
        for id in successors(&ring, holder.id()) {
            if !self.shared.is_alive(id) {
                continue
            }
            if self.force_crash(id) {
                continue
            }
            return Some(id)
        }
        None
    }

    /// Crashes a live non-coordinator candidate at most once per episode,
    /// with the configured probability.
    fn force_crash(&mut self, id: ProcessID) -> bool {
        let chaos = self.shared.chaos();
        if self.chaos_spent
        || chaos <= 0.0
        || id == self.shared.coordinator()
        || !rand::thread_rng().gen_bool(chaos) {
            return false
        }
        self.chaos_spent = true;
        debug!("election #{} force-crashing process {}", self.episode.id, id);
        self.shared.crash(id);
        true
    }

    fn complete(&self, closer: ProcessID, token: Token) -> Outcome {
        let episode = self.episode.id;
        self.shared.emit(Event::TokenReturned {
            episode,
            process: closer,
            token: token.ids.clone(),
        });

        let winner = match token.winner() {
        | Some(winner) => winner,
        | None => return Outcome::Stalled { holder: closer, token },
        };

        let shared = &self.shared;
        let installed = shared.gate().complete(episode, || {
            let mut rings = Vec::with_capacity(token.ids.len());
            for id in &token.ids {
                let process = match shared.process(*id) {
                | Some(process) => process,
                | None => continue,
                };
                let ring = match token.rotation(*id) {
                | Some(ring) => ring,
                | None => continue,
                };
                {
                    let mut local = process.lock();
                    if !process.is_alive() { continue }
                    local.ring = ring.clone();
                }
                rings.push((*id, ring));
            }
            shared.install_coordinator(winner, &token.ids);
            rings
        });

        // Sinks may call back into the gate, so nothing is emitted until
        // `complete` has released it.
        match installed {
        | Some(rings) => {
            for (process, ring) in rings {
                shared.emit(Event::RingInstalled { episode, process, ring });
            }
            shared.emit(Event::CoordinatorElected { episode, coordinator: winner });
            Outcome::Elected { coordinator: winner, token }
        }
        | None => {
            shared.emit(Event::ElectionSuperseded { episode });
            Outcome::Superseded { token }
        }
        }
    }
}
