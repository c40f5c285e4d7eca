pub mod http_probe;
pub mod throttle;

pub use http_probe::{ProbeOutcome, Prober};
pub use throttle::RateLimiter;
