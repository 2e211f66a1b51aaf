//! Human-readable module listing.

use ami1b_format::Module;
use std::fmt;

/// Module summary followed by one line per component
pub struct Listing<'a>(pub &'a Module);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let module = self.0;
        let header = module.header();

        writeln!(f, "Name of 1B file: {}", module.source_path().display())?;
        writeln!(f, "Length of 1B header: 0x{:X} bytes", header.length())?;
        writeln!(
            f,
            "Number of components (including the non-present): 0x{:X}",
            header.component_count()
        )?;
        writeln!(f, "Calculated 1B file size: 0x{:X}", module.calculated_size())?;
        writeln!(f, "1B file size (from filesystem): 0x{:X}", module.file_size())?;
        writeln!(
            f,
            "Component names {}",
            if header.has_string_table() { "present" } else { "absent" }
        )?;

        for component in module.components() {
            write!(
                f,
                "[{:02X}h] Target physical address: 0x{:X}, Name: {}, ",
                component.position(),
                component.physical_address(),
                component.name()
            )?;
            match component.file_offset() {
                Some(offset) => write!(f, "Present, File offset: 0x{offset:X}, ")?,
                None => f.write_str("Absent, ")?,
            }
            writeln!(f, "Size: 0x{:X}", component.length())?;
        }

        Ok(())
    }
}

/// Render the module listing.
pub fn render(module: &Module) -> String {
    Listing(module).to_string()
}
