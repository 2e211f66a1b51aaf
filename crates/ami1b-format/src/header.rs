//! 1B header prologue, component table entries and the raw header buffer
//!
//! Layout (all integers little-endian):
//!
//! | Offset      | Field                | Width |
//! |-------------|----------------------|-------|
//! | 0           | component_info_count | u16   |
//! | 2           | header_length        | u16   |
//! | 4 + 8·i     | physical_address[i]  | u32   |
//! | 4 + 8·i + 4 | length_and_flag[i]   | u32   |
//!
//! Bit 31 of `length_and_flag` marks the payload as present in the file; the
//! remaining 31 bits are the payload length.

use crate::chunk;
use crate::error::{ModuleError, Result};
use crate::strings::StringTable;
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use std::path::Path;

/// Size of the prologue (component count + header length)
pub const PROLOGUE_SIZE: usize = 4;

/// Size of one component table entry
pub const TABLE_ENTRY_SIZE: usize = 8;

/// Presence bit inside the length field
pub const PRESENCE_BIT: u32 = 0x8000_0000;

/// Fixed 4-byte prologue read before the header can be sized
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(little)]
pub struct Prologue {
    /// Number of table entries, including components absent from the file
    pub component_count: u16,
    /// Total header size in bytes
    pub header_length: u16,
}

impl Prologue {
    /// Decode the prologue from the first bytes of a module
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < PROLOGUE_SIZE {
            return Err(ModuleError::MalformedHeader(format!(
                "need {PROLOGUE_SIZE} prologue bytes, got {}",
                data.len()
            )));
        }

        let prologue = Self::read(&mut Cursor::new(&data[..PROLOGUE_SIZE]))?;
        prologue.validate()?;
        Ok(prologue)
    }

    /// Header prescan: read and decode the prologue of a module file
    pub fn read_from_file(path: &Path) -> Result<Self> {
        let file_size = std::fs::metadata(path)?.len();
        if file_size < PROLOGUE_SIZE as u64 {
            return Err(ModuleError::MalformedHeader(format!(
                "{} is only {file_size} bytes long",
                path.display()
            )));
        }

        let data = chunk::read_chunk(path, 0, PROLOGUE_SIZE)?;
        Self::parse(&data)
    }

    /// Reject zero counts and lengths
    pub fn validate(&self) -> Result<()> {
        if self.component_count == 0 {
            return Err(ModuleError::MalformedHeader(
                "component count is zero".to_string(),
            ));
        }
        if self.header_length == 0 {
            return Err(ModuleError::MalformedHeader(
                "header length is zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Offset of the first byte after the component table
    pub fn table_end(&self) -> usize {
        PROLOGUE_SIZE + usize::from(self.component_count) * TABLE_ENTRY_SIZE
    }
}

/// Raw 32-bit length field with the presence flag packed into bit 31
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[brw(little)]
pub struct LengthField(pub u32);

impl LengthField {
    /// Largest length that can be encoded next to the presence bit
    pub const MAX_LENGTH: u32 = !PRESENCE_BIT;

    /// Pack a length and presence flag
    ///
    /// Bit 31 of `length` is discarded.
    pub const fn new(length: u32, present: bool) -> Self {
        let masked = length & Self::MAX_LENGTH;
        if present {
            Self(masked | PRESENCE_BIT)
        } else {
            Self(masked)
        }
    }

    /// Raw value as stored in the table
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Payload length with the presence bit masked off
    pub const fn length(&self) -> u32 {
        self.0 & Self::MAX_LENGTH
    }

    /// Whether the payload bytes exist in the file
    pub const fn is_present(&self) -> bool {
        self.0 & PRESENCE_BIT != 0
    }
}

/// One 8-byte component descriptor
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(little)]
pub struct TableEntry {
    /// Target physical address, copied through unchanged
    pub physical_address: u32,
    /// Length and presence flag
    pub length: LengthField,
}

impl TableEntry {
    /// Byte offset of the entry for `position` inside the header
    pub const fn offset(position: usize) -> usize {
        PROLOGUE_SIZE + position * TABLE_ENTRY_SIZE
    }

    /// Decode the entry for `position` from a header buffer
    pub fn read_at(raw: &[u8], position: usize) -> Result<Self> {
        let start = Self::offset(position);
        let bytes = raw
            .get(start..start + TABLE_ENTRY_SIZE)
            .ok_or_else(|| {
                ModuleError::MalformedHeader(format!(
                    "table entry {position} at 0x{start:X} lies outside the {}-byte header",
                    raw.len()
                ))
            })?;
        Ok(Self::read(&mut Cursor::new(bytes))?)
    }

    /// Encode this entry in place for `position`, leaving all other bytes intact
    pub fn write_at(&self, raw: &mut [u8], position: usize) -> Result<()> {
        let start = Self::offset(position);
        let len = raw.len();
        let bytes = raw
            .get_mut(start..start + TABLE_ENTRY_SIZE)
            .ok_or_else(|| {
                ModuleError::MalformedHeader(format!(
                    "table entry {position} at 0x{start:X} lies outside the {len}-byte header"
                ))
            })?;
        self.write(&mut Cursor::new(bytes))?;
        Ok(())
    }
}

/// Decoded header plus the raw bytes written back verbatim on serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    component_count: u16,
    length: u16,
    string_table: Option<StringTable>,
    raw: Vec<u8>,
}

impl Header {
    pub(crate) fn new(prologue: Prologue, string_table: Option<StringTable>, raw: Vec<u8>) -> Self {
        Self {
            component_count: prologue.component_count,
            length: prologue.header_length,
            string_table,
            raw,
        }
    }

    /// Number of table entries, including absent components
    pub const fn component_count(&self) -> u16 {
        self.component_count
    }

    /// Header length in bytes
    pub const fn length(&self) -> u16 {
        self.length
    }

    /// Whether component names are embedded in the header
    pub const fn has_string_table(&self) -> bool {
        self.string_table.is_some()
    }

    /// Location of the embedded name table, if any
    pub const fn string_table(&self) -> Option<StringTable> {
        self.string_table
    }

    /// Padding between consecutive names (4 or 5), or 0 without a name table
    pub fn string_pad_width(&self) -> u8 {
        self.string_table.map_or(0, |table| table.pad_width)
    }

    /// Raw header bytes
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Decode the table entry for `position`
    pub fn entry(&self, position: usize) -> Result<TableEntry> {
        if position >= usize::from(self.component_count) {
            return Err(ModuleError::ComponentNotFound(format!(
                "position {position} (module has {} components)",
                self.component_count
            )));
        }
        TableEntry::read_at(&self.raw, position)
    }

    /// Overwrite the table entry for `position` in the raw buffer
    pub(crate) fn set_entry(&mut self, position: usize, entry: TableEntry) -> Result<()> {
        if position >= usize::from(self.component_count) {
            return Err(ModuleError::ComponentNotFound(format!(
                "position {position} (module has {} components)",
                self.component_count
            )));
        }
        entry.write_at(&mut self.raw, position)
    }
}
