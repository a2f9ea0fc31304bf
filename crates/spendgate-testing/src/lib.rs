//! Test support: an isolated on-disk world plus message and session-log
//! fixtures shared by the integration tests.

pub mod fixtures;
pub mod world;

pub use fixtures::*;
pub use world::*;
