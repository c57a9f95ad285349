//! Unit tests for the fleet encryption migrator
//!
//! This module contains unit tests for:
//! - Deterministic naming and run-date handling
//! - The eligibility filter and environment configuration
//! - Fleet manifest loading
//! - Convergence polling
//! - Call-level retries and backoff
//! - Fleet report aggregation

mod backoff;
mod manifest;
mod naming;
