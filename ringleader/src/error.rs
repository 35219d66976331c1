use thiserror::Error;

use crate::state::ProcessID;

#[derive(Error, Debug)]
pub enum Error {
    #[error("a ring needs at least 2 processes, but {count} were requested")]
    InvalidTopology { count: usize },

    #[error("election chaos probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("no process with id {0}")]
    UnknownProcess(ProcessID),

    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}
