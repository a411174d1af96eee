//! Timesync CLI library.
//!
//! This crate wires the reconciliation engine to the vendor clients and
//! exposes the `timesync` command-line interface.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
