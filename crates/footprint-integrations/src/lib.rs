pub mod collector;
pub mod http;
pub mod traits;

pub use collector::{CollectorConfig, HttpCollector};
pub use traits::{ContentSummary, SessionSummary, Uplink};
