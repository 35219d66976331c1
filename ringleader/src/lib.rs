#[macro_use] extern crate derivative;
#[macro_use] extern crate log;

mod cluster;
mod config;
mod directory;
mod error;
mod gate;
mod message;
mod shared;
mod state;
mod thread;

pub mod sink;

pub use crate::cluster::{Cluster, Tick};
pub use crate::config::Config;
pub use crate::directory::Directory;
pub use crate::error::Error;
pub use crate::gate::{Admission, Episode, EpisodeID, Gate};
pub use crate::message::{Event, Token};
pub use crate::shared::Shared;
pub use crate::sink::Sink;
pub use crate::state::{Local, Process, ProcessID, Value};
pub use crate::thread::election::{Election, Outcome};
