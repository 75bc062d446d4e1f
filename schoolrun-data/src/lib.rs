//! I/O adapters for the school-run routing engine.
//!
//! Responsibilities:
//! - Implement `schoolrun-core` traits against external services.
//!
//! Boundaries:
//! - Do not encode routing rules (live in `schoolrun-core`).
//! - Keep blocking I/O off async executors; prefer async-capable clients.
//!
//! Invariants:
//! - Thread-safe by default where feasible.
//! - No global mutable state.

#![forbid(unsafe_code)]

pub mod routing;
