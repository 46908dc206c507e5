//! Earshot command-line client
//!
//! Configuration loading, a headless audio engine and a replayable change
//! feed used by the `earshot` binary.

pub mod config;
pub mod engine;
pub mod error;
pub mod replay;

pub use config::EarshotConfig;
pub use engine::HeadlessEngine;
pub use error::{CliError, Result};
pub use replay::ReplayFeed;
