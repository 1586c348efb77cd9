//! Kothler Common
//!
//! Utilities shared by every Kothler crate and binary.

pub mod logging;
