//! Logging goes through `tracing`; the binary installs the subscriber.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
