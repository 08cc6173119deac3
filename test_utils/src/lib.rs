//! Utility helpers for tests.
//!
//! Mesh fixtures shared by the integration tests and an event handler that
//! records what the driver asked of it.

pub mod handlers;
pub mod meshes;
