//! Module loader: prescan, header decode and payload loading
//!
//! ```rust,no_run
//! use ami1b_format::ModuleLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let module = ModuleLoader::new()
//!     .max_components(64)
//!     .load("bios.1b")?;
//!
//! for component in module.components() {
//!     println!("{} {:?}", component.name(), component.file_offset());
//! }
//! # Ok(())
//! # }
//! ```

use crate::chunk;
use crate::error::{ModuleError, Result};
use crate::header::{PROLOGUE_SIZE, Prologue};
use crate::module::Module;
use crate::table;
use std::path::Path;
use tracing::{info, warn};

/// Default ceiling on the number of table entries a module may declare
pub const DEFAULT_MAX_COMPONENTS: usize = 400;

/// Builder-style loader for 1B modules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleLoader {
    max_components: usize,
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleLoader {
    /// Create a loader with default settings
    ///
    /// Defaults: at most [`DEFAULT_MAX_COMPONENTS`] table entries
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_components: DEFAULT_MAX_COMPONENTS,
        }
    }

    /// Set the largest component count accepted
    #[must_use]
    pub const fn max_components(mut self, max: usize) -> Self {
        self.max_components = max;
        self
    }

    /// Configured component ceiling
    pub const fn component_limit(&self) -> usize {
        self.max_components
    }

    /// Load a module from `path`
    ///
    /// Nothing partially loaded is returned: on any failure every buffer read
    /// so far is dropped before the error propagates.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Module> {
        let path = path.as_ref();

        let file_size = std::fs::metadata(path)?.len();
        if file_size < PROLOGUE_SIZE as u64 {
            return Err(ModuleError::MalformedHeader(format!(
                "{} is only {file_size} bytes long",
                path.display()
            )));
        }

        let prologue = Prologue::read_from_file(path)?;
        if usize::from(prologue.component_count) > self.max_components {
            return Err(ModuleError::UnsupportedComponentCount {
                count: prologue.component_count,
                max: self.max_components,
            });
        }

        let raw = chunk::read_chunk(path, 0, usize::from(prologue.header_length))?;
        let mut decoded = table::decode(prologue, raw, self.max_components)?;

        for component in decoded.components.iter_mut() {
            let Some(offset) = component.file_offset() else {
                continue;
            };
            let data = chunk::read_chunk(path, offset, component.length() as usize)?;
            component.set_data(data);
        }

        if decoded.calculated_size != file_size {
            warn!(
                "Calculated size 0x{:X} differs from file size 0x{:X} for {}",
                decoded.calculated_size,
                file_size,
                path.display()
            );
        }

        info!(
            "Loaded {}: {} components, header 0x{:X} bytes",
            path.display(),
            prologue.component_count,
            prologue.header_length
        );

        Ok(Module::new(path.to_path_buf(), file_size, decoded))
    }
}
