//! doctime CLI library.
//!
//! This crate provides the CLI interface and the host event loop.

mod cli;
pub mod commands;
mod config;
pub mod protocol;
pub mod vault;

pub use cli::{Cli, Commands};
pub use config::Config;
