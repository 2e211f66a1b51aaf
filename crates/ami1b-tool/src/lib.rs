//! Command-line front end for AMIBIOS 1B modules.
//!
//! Combines the classic splitter and combiner tools:
//!
//! - `ami1b list bios.1b`
//! - `ami1b extract-all bios.1b --output-dir parts`
//! - `ami1b extract bios.1b 1F0`
//! - `ami1b replace bios.1b RUN_CSEG 1F0 --output patched.1b`
//!
//! Offsets are the hexadecimal file offsets printed by `list`.

pub mod commands;
pub mod config;
pub mod listing;

pub use commands::run;
pub use config::{Cli, Command};
