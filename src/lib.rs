pub mod analyze;
pub mod concurrent;
pub mod config;
pub mod error;
pub mod http_client;
pub mod output;
pub mod probe;
pub mod progress;
pub mod stats;
pub mod utils;

// re-export the types most callers need
pub use crate::concurrent::Scanner;
pub use crate::config::{FilterRule, ScanConfig};
pub use crate::error::ScanError;
pub use crate::stats::RunSummary;
