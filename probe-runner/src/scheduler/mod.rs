//! Scheduler layer for the runner
//!
//! This layer keeps the number of running virtual users in line with the
//! load profile. It spawns and retires VU tasks and collects the summary
//! when the run is over.

pub mod vus;

pub use vus::VuScheduler;
