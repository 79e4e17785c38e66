pub mod bridge;
pub mod config;
pub mod daemon;
pub mod dispatcher;
pub mod host;
pub mod ipc;
pub mod monitor;
pub mod privacy;
pub mod session_manager;
pub mod tasks;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{get_data_dir, Config, TrackerConfig};
pub use daemon::{Daemon, Services};
pub use session_manager::{Session, StopReason, Tracker, TrackerDeps, Transition};
