//! Component name table embedded in the header
//!
//! There is no field announcing the name table. It is found heuristically:
//! if the header extends past the component table, two bytes at
//! `table_end + 2` select the pad width (`"00"` marks the 4.00 header family,
//! which pads names to 5 bytes; everything newer pads to 4), and the table
//! itself starts at the first `"RUN_"` found at or after `table_end + 4`.
//! `RUN_` is the prefix of the first component's conventional name
//! (`RUN_CSEG`). The byte comparisons are exact on purpose; real modules rely
//! on them.

use crate::header::{PROLOGUE_SIZE, TABLE_ENTRY_SIZE};
use tracing::{debug, warn};

/// Signature of the first component name
pub const NAME_SIGNATURE: &[u8; 4] = b"RUN_";

/// Version marker of the header family using 5-byte name padding
pub const LEGACY_VERSION_MARKER: &[u8; 2] = b"00";

/// Name padding used by the 4.00 header family
pub const LEGACY_PAD_WIDTH: u8 = 5;

/// Name padding used by all newer header families
pub const PAD_WIDTH: u8 = 4;

/// Longest component name kept, in bytes
pub const MAX_NAME_LEN: usize = 200;

/// Location of the name table inside the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringTable {
    /// Offset of the first name
    pub start: usize,
    /// Bytes between the end of one name and the start of the next
    pub pad_width: u8,
}

/// Locate the name table in a header buffer
///
/// Returns `None` when the header ends at the component table, and also when
/// the header extends past it but no signature is found. The scan decides.
pub fn locate(raw: &[u8], header_len: usize, component_count: u16) -> Option<StringTable> {
    let header_len = header_len.min(raw.len());
    let table_end = PROLOGUE_SIZE + usize::from(component_count) * TABLE_ENTRY_SIZE;

    if table_end >= header_len {
        return None;
    }

    let pad_width = match raw.get(table_end + 2..table_end + 4) {
        Some(marker) if marker == LEGACY_VERSION_MARKER => LEGACY_PAD_WIDTH,
        _ => PAD_WIDTH,
    };

    let search_from = table_end + 4;
    let found = raw[..header_len]
        .get(search_from..)
        .and_then(|region| {
            region
                .windows(NAME_SIGNATURE.len())
                .position(|window| window == NAME_SIGNATURE)
        })
        .map(|pos| search_from + pos);

    if let Some(start) = found {
        debug!("Name table at 0x{:X}, pad width {}", start, pad_width);
        Some(StringTable { start, pad_width })
    } else {
        warn!(
            "Header extends past the component table (0x{:X} < 0x{:X}) but has no {:?} signature, treating names as absent",
            table_end,
            header_len,
            String::from_utf8_lossy(NAME_SIGNATURE)
        );
        None
    }
}

/// Read the NUL-terminated name at `cursor`
///
/// Returns the name (at most [`MAX_NAME_LEN`] bytes, invalid UTF-8 replaced)
/// and the full string length, which is what the cursor advances by. A name
/// missing its terminator ends at `header_len`. Returns `None` if `cursor` is
/// already past the header.
pub fn read_name(raw: &[u8], cursor: usize, header_len: usize) -> Option<(String, usize)> {
    let header_len = header_len.min(raw.len());
    let region = raw[..header_len].get(cursor..).filter(|r| !r.is_empty())?;

    let len = region.iter().position(|&b| b == 0).unwrap_or(region.len());
    let mut name = String::from_utf8_lossy(&region[..len.min(MAX_NAME_LEN)]).into_owned();

    // Replacement characters are wider than the bytes they stand for
    if name.len() > MAX_NAME_LEN {
        let mut end = MAX_NAME_LEN;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    Some((name, len))
}

/// Name given to a component when the header has no name table
pub fn synthesized_name(position: usize) -> String {
    format!("_1B_component_{position:02X}h")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Header with `count` zeroed table entries followed by `tail`
    fn header_with_tail(count: u16, tail: &[u8]) -> Vec<u8> {
        let mut raw = vec![0u8; 4 + usize::from(count) * 8];
        raw.extend_from_slice(tail);
        let len = raw.len() as u16;
        raw[0..2].copy_from_slice(&count.to_le_bytes());
        raw[2..4].copy_from_slice(&len.to_le_bytes());
        raw
    }

    #[test]
    fn test_no_room_for_names() {
        let raw = header_with_tail(2, &[]);
        assert_eq!(locate(&raw, raw.len(), 2), None);
    }

    #[test]
    fn test_newer_header_uses_four_byte_pad() {
        let raw = header_with_tail(1, b"\0\x0010RUN_CSEG\0\0\0\0");
        let table = locate(&raw, raw.len(), 1).expect("Should find names");
        assert_eq!(table.start, 12 + 4);
        assert_eq!(table.pad_width, PAD_WIDTH);
    }

    #[test]
    fn test_legacy_header_uses_five_byte_pad() {
        let raw = header_with_tail(1, b"\0\x0000RUN_CSEG\0\0\0\0\0");
        let table = locate(&raw, raw.len(), 1).expect("Should find names");
        assert_eq!(table.pad_width, LEGACY_PAD_WIDTH);
    }

    #[test]
    fn test_signature_found_after_junk() {
        let raw = header_with_tail(1, b"\0\x0010\xFF\xFE\x01RUN_CSEG\0");
        let table = locate(&raw, raw.len(), 1).expect("Should find names");
        assert_eq!(table.start, 12 + 7);
    }

    #[test]
    fn test_missing_signature_reports_absent() {
        let raw = header_with_tail(1, b"\0\x0000NOT_A_NAME\0");
        assert_eq!(locate(&raw, raw.len(), 1), None);
    }

    #[test]
    fn test_signature_straddling_header_end_is_ignored() {
        let raw = header_with_tail(1, b"\0\x0010RUN_");
        // Header length cuts the signature short
        assert_eq!(locate(&raw, raw.len() - 1, 1), None);
        assert!(locate(&raw, raw.len(), 1).is_some());
    }

    #[test]
    fn test_signature_before_scan_start_is_ignored() {
        // "RUN_" overlapping the version marker does not count
        let raw = header_with_tail(1, b"RUN_\0\0");
        assert_eq!(locate(&raw, raw.len(), 1), None);
    }

    #[test]
    fn test_read_name() {
        let raw = b"RUN_CSEG\0\0\0\0SLAB\0";
        let (name, len) = read_name(raw, 0, raw.len()).expect("Should read name");
        assert_eq!(name, "RUN_CSEG");
        assert_eq!(len, 8);

        let (name, len) = read_name(raw, 12, raw.len()).expect("Should read name");
        assert_eq!(name, "SLAB");
        assert_eq!(len, 4);

        assert_eq!(read_name(raw, raw.len(), raw.len()), None);
    }

    #[test]
    fn test_read_name_truncates_long_names() {
        let mut raw = vec![b'A'; 250];
        raw.push(0);
        let (name, len) = read_name(&raw, 0, raw.len()).expect("Should read name");
        assert_eq!(name.len(), MAX_NAME_LEN);
        assert_eq!(len, 250);
    }

    #[test]
    fn test_read_name_non_utf8_stays_within_cap() {
        let mut raw = b"RUN_".to_vec();
        raw.extend_from_slice(&[0xFF; 196]);
        raw.push(0);

        let (name, len) = read_name(&raw, 0, raw.len()).expect("Should read name");
        assert_eq!(len, 200);
        assert!(name.len() <= MAX_NAME_LEN);
        assert!(name.starts_with("RUN_"));
        assert!(name[4..].chars().all(|c| c == char::REPLACEMENT_CHARACTER));
        assert_eq!(name.chars().count(), 4 + 65);
    }

    #[test]
    fn test_read_name_unterminated() {
        let raw = b"TAIL";
        let (name, len) = read_name(raw, 0, raw.len()).expect("Should read name");
        assert_eq!(name, "TAIL");
        assert_eq!(len, 4);
    }

    #[test]
    fn test_synthesized_names() {
        assert_eq!(synthesized_name(0), "_1B_component_00h");
        assert_eq!(synthesized_name(1), "_1B_component_01h");
        assert_eq!(synthesized_name(0x2A), "_1B_component_2Ah");
    }
}
