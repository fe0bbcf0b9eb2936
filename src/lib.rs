//! Common functionality for capexp, a tool for electricity capacity expansion modelling.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod carrier;
pub mod cli;
pub mod generator;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod network;
pub mod optimisation;
pub mod report;
pub mod settings;
pub mod snapshot;
pub mod statistics;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the directory where capexp's program settings are stored.
///
/// Falls back to the current directory if the user's config directory cannot be determined.
pub fn get_capexp_config_dir() -> PathBuf {
    let mut config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config_dir.push("capexp");

    config_dir
}
