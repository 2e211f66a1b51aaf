//! Header/table decoder
//!
//! Walks the component table of a fully read header, naming each component
//! and assigning file offsets. Payloads of present components follow the
//! header back to back in table order, so offsets come from a running cursor
//! starting at the header length; absent components neither get an offset nor
//! advance the cursor.

use crate::component::Component;
use crate::error::{ModuleError, Result};
use crate::header::{Header, Prologue, TableEntry};
use crate::strings::{self, StringTable};
use tracing::debug;

/// Result of decoding a header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTable {
    /// Decoded header owning the raw bytes
    pub header: Header,
    /// One component per table entry, in table order, without payloads
    pub components: Vec<Component>,
    /// Header length plus the lengths of all present payloads
    pub calculated_size: u64,
}

/// Decode the component table from a header buffer of `prologue.header_length` bytes
pub fn decode(prologue: Prologue, raw: Vec<u8>, max_components: usize) -> Result<DecodedTable> {
    prologue.validate()?;

    let count = prologue.component_count;
    if usize::from(count) > max_components {
        return Err(ModuleError::UnsupportedComponentCount {
            count,
            max: max_components,
        });
    }

    let header_len = usize::from(prologue.header_length);
    if raw.len() != header_len {
        return Err(ModuleError::MalformedHeader(format!(
            "header buffer is {} bytes, prologue declares {header_len}",
            raw.len()
        )));
    }
    if prologue.table_end() > header_len {
        return Err(ModuleError::MalformedHeader(format!(
            "{count} table entries need 0x{:X} bytes, header is only 0x{header_len:X}",
            prologue.table_end()
        )));
    }

    let string_table = strings::locate(&raw, header_len, count);
    let mut name_cursor = string_table.map(|table| table.start);

    let mut components = Vec::with_capacity(usize::from(count));
    let mut file_offset = header_len as u64;

    for position in 0..usize::from(count) {
        let entry = TableEntry::read_at(&raw, position)?;
        let name = next_name(&raw, header_len, string_table, &mut name_cursor, position);

        let length = entry.length.length();
        let offset = if entry.length.is_present() {
            let offset = file_offset;
            file_offset += u64::from(length);
            Some(offset)
        } else {
            None
        };

        debug!(
            "Component [{:02X}h] {}: address 0x{:X}, length 0x{:X}, offset {:?}",
            position, name, entry.physical_address, length, offset
        );

        components.push(Component::new(
            position,
            name,
            entry.physical_address,
            length,
            offset,
        ));
    }

    Ok(DecodedTable {
        header: Header::new(prologue, string_table, raw),
        components,
        calculated_size: file_offset,
    })
}

fn next_name(
    raw: &[u8],
    header_len: usize,
    string_table: Option<StringTable>,
    cursor: &mut Option<usize>,
    position: usize,
) -> String {
    let (Some(table), Some(at)) = (string_table, *cursor) else {
        return strings::synthesized_name(position);
    };

    match strings::read_name(raw, at, header_len) {
        Some((name, len)) => {
            *cursor = Some(at + len + usize::from(table.pad_width));
            name
        }
        // Fewer names than components
        None => {
            *cursor = None;
            strings::synthesized_name(position)
        }
    }
}
