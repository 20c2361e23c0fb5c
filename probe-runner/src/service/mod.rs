//! Service layer
//!
//! Services hold the runner's shared state. Virtual users report into them
//! while a run is in progress and the scheduler reads them back at the end.
//!
//! All services are trait-based to enable testing and dependency injection.

mod metrics;

// Re-export traits
pub use metrics::MetricsSink;

// Re-export implementations
pub use metrics::{InMemoryMetrics, POLL_ERROR_LABEL};
