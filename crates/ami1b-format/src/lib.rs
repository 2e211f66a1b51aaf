//! Parser, editor and writer for AMIBIOS 1B firmware modules
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Many BIOS-specific terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
//! A 1B module is a header followed by the payloads of its components. The
//! header holds a small prologue, a table of fixed-size component descriptors
//! and, in most BIOS builds, a table of component names.
//!
//! # Format Overview
//!
//! - Prologue: component count (u16) + header length (u16), little-endian
//! - Table: one 8-byte entry per component (physical address + length);
//!   bit 31 of the length marks the payload as present in the file
//! - Names: optional, NUL-terminated, padded to 4 or 5 bytes, found by
//!   scanning for the `RUN_` signature
//! - Payloads: present components back to back, in table order, starting at
//!   the header length
//!
//! # Usage
//!
//! ```rust,no_run
//! use ami1b_format::Module;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut module = Module::load("bios.1b")?;
//!
//! let offset = module.header().length().into();
//! let replacement = module.replace_component_at_offset(offset, "new_cseg.bin")?;
//! if replacement.size_changed() {
//!     eprintln!("component size changed");
//! }
//!
//! module.write_to_file_atomic("bios.1b")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! - **Byte-Faithful**: the header is kept verbatim and only the edited
//!   table entry is rewritten
//! - **Same-Slot Edits**: payloads can be replaced, never inserted, removed
//!   or moved
//! - **No Partial Modules**: loading either returns a complete module or an
//!   error

#![warn(missing_docs)]

/// Chunk reader used by every parsing step
pub mod chunk;
pub mod component;
pub mod error;
pub mod header;
pub mod loader;
pub mod module;
/// Component name table detection and name decoding
pub mod strings;
/// Component table decoder
pub mod table;

// Test utilities module
#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod test_utils;

// Re-export main types
pub use component::Component;
pub use error::{ModuleError, Result};
pub use header::{Header, LengthField, Prologue, TableEntry};
pub use loader::{DEFAULT_MAX_COMPONENTS, ModuleLoader};
pub use module::{Module, Replacement};
pub use strings::StringTable;
