//! Probe Core
//!
//! Core types and abstractions for the probe load-testing harness.
//!
//! This crate contains:
//! - Domain types: task handles, credentials, poll outcomes, load profiles and run reports
//! - DTOs: wire shapes of the backend API under test

pub mod domain;
pub mod dto;
