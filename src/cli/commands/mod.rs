//! Command implementations for SimpleVB
//!
//! Each command is implemented in its own module.

pub mod check;
pub mod config;
pub mod definition;
pub mod diagnostics;
pub mod implementations;
pub mod symbols;
pub mod watch;
