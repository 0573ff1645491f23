//! CLI command handlers

pub mod complaint;
pub mod identity;
pub mod stats;
