//! Integration tests: full migration runs against the in-memory control plane

#[path = "../common/mod.rs"]
mod common;
