use serde_derive::{Serialize, Deserialize};

#[derive(Serialize, Deserialize)]
pub struct Execution(pub Vec<Command>);

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
#[derive(Clone, Debug)]
pub enum Command {
    /// Start a population of `count` processes
    Start {
        count: usize,
        #[serde(default = "default_interval")]
        interval_ms: u64,
        #[serde(default)]
        timeout_ms: Option<u64>,
        #[serde(default)]
        chaos: f64,
    },

    /// Crash the specified process
    Crash {
        id: usize,
    },

    /// Overwrite the data of the specified process
    Update {
        id: usize,
        data: u32,
    },

    /// Sleep the test harness for `ms` milliseconds
    Sleep {
        ms: u64,
    },

    /// Check the current coordinator
    ExpectCoordinator {
        id: usize,
    },

    /// Check that every live process holds `data`
    ExpectData {
        data: u32,
    },

    /// Check that the coordinator is alive and every live process holds
    /// its data
    ExpectConverged,
}

fn default_interval() -> u64 {
    100
}
