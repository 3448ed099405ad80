//! SimpleVB - structural analysis for Visual Basic .NET sources
//!
//! Builds per-document symbol trees, resolves names across a workspace and
//! validates block structure with a line-oriented classifier. No full parser
//! is involved; every result is rebuilt from the text on each call.

pub mod analysis;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod infra;
pub mod models;
pub mod services;

pub use error::{SimpleVbError, SimpleVbResult};
