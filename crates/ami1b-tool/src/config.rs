//! Command-line configuration.
//!
//! Arguments can also come from the environment:
//! - `AMI1B_MAX_COMPONENTS` for `--max-components`
//! - `RUST_LOG` for the log filter (see the binary entry point)

use ami1b_format::DEFAULT_MAX_COMPONENTS;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Size of the 1B prologue; component offsets must lie past it.
const MIN_COMPONENT_OFFSET: u64 = 4;

/// Top-level CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ami1b",
    about = "Split, list and patch AMIBIOS 1B firmware modules",
    version
)]
pub struct Cli {
    /// Largest component count accepted in a module header
    #[arg(
        long,
        global = true,
        env = "AMI1B_MAX_COMPONENTS",
        default_value_t = DEFAULT_MAX_COMPONENTS
    )]
    pub max_components: usize,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Action to perform
    #[command(subcommand)]
    pub command: Command,
}

/// Supported actions.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the components of a module
    List {
        /// 1B module file
        module: PathBuf,
    },

    /// Write every present component to its own file
    ExtractAll {
        /// 1B module file
        module: PathBuf,

        /// Directory receiving one file per component
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Write the component starting at a file offset to its own file
    Extract {
        /// 1B module file
        module: PathBuf,

        /// Component file offset, hexadecimal
        #[arg(value_parser = parse_component_offset)]
        offset: u64,

        /// Directory receiving the component file
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Replace the component starting at a file offset and write the module back
    Replace {
        /// 1B module file
        module: PathBuf,

        /// File holding the new component data
        component: PathBuf,

        /// Component file offset, hexadecimal
        #[arg(value_parser = parse_component_offset)]
        offset: u64,

        /// Write the modified module here instead of over the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Default log filter when `RUST_LOG` is unset.
    #[must_use]
    pub const fn default_log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

/// Parse a hexadecimal component offset, with or without a `0x` prefix.
///
/// Offsets inside the prologue can never start a component and are rejected.
pub fn parse_component_offset(value: &str) -> Result<u64, String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    let offset = u64::from_str_radix(digits, 16)
        .map_err(|e| format!("component offset {value:?} is not hexadecimal: {e}"))?;

    if offset <= MIN_COMPONENT_OFFSET {
        return Err(format!(
            "component offset 0x{offset:X} is too small, components start after the header"
        ));
    }
    Ok(offset)
}
