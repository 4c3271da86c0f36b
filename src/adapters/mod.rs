//! Adapter implementations of the domain ports.

pub mod memory;
pub mod sqlite;
pub mod stages;
