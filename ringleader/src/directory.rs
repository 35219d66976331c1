//! # Summary
//!
//! Read-only lookup from process id to process record. Processes are never
//! removed, so a crashed process stays addressable for detection and for
//! skipping during successor scans.

use std::sync::Arc;

use hashbrown::HashMap as Map;

use crate::state::{Process, ProcessID, Value};

pub struct Directory<D: Value> {
    ids: Vec<ProcessID>,
    processes: Map<ProcessID, Arc<Process<D>>>,
}

impl<D: Value> Directory<D> {

    /// Creates processes `1..=count`, each with the ascending ring rotated
    /// to start at itself.
    pub fn new<F>(count: usize, mut init: F) -> Self
        where F: FnMut(ProcessID) -> D
    {
        let ids: Vec<ProcessID> = (1..=count).collect();
        let processes = ids.iter()
            .enumerate()
            .map(|(index, id)| {
                let ring = ids[index..].iter()
                    .chain(ids[..index].iter())
                    .cloned()
                    .collect();
                (*id, Arc::new(Process::new(*id, init(*id), ring)))
            })
            .collect();
        Directory { ids, processes }
    }

    pub fn get(&self, id: ProcessID) -> Option<&Arc<Process<D>>> {
        self.processes.get(&id)
    }

    /// All process ids in ascending order.
    pub fn ids(&self) -> &[ProcessID] {
        &self.ids
    }

    /// All processes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Process<D>>> + '_ {
        self.ids.iter().filter_map(move |id| self.processes.get(id))
    }

    pub fn is_alive(&self, id: ProcessID) -> bool {
        self.get(id).map_or(false, |process| process.is_alive())
    }

    pub fn live(&self) -> Vec<ProcessID> {
        self.iter()
            .filter(|process| process.is_alive())
            .map(|process| process.id())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
