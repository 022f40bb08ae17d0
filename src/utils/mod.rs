//! Shared utilities

pub mod logging;
pub mod path;
pub mod process;
