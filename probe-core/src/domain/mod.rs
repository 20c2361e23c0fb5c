//! Core domain types
//!
//! This module contains the domain structures shared by the client, the
//! load runner and the CLI. None of them know anything about HTTP.

pub mod credential;
pub mod load;
pub mod outcome;
pub mod report;
pub mod task;
