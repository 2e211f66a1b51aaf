//! Component: one table slot and its optional payload

/// One component table entry plus its payload, if present in the file
///
/// The position is the component's identity: components are never removed
/// or reordered, only their payload can be replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    position: usize,
    name: String,
    physical_address: u32,
    length: u32,
    present: bool,
    file_offset: Option<u64>,
    data: Option<Vec<u8>>,
}

impl Component {
    pub(crate) fn new(
        position: usize,
        name: String,
        physical_address: u32,
        length: u32,
        file_offset: Option<u64>,
    ) -> Self {
        Self {
            position,
            name,
            physical_address,
            length,
            present: file_offset.is_some(),
            file_offset,
            data: None,
        }
    }

    /// Table index, starting at 0
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Name from the header's name table, or a synthesized one
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target physical address after relocation by the BIOS
    pub const fn physical_address(&self) -> u32 {
        self.physical_address
    }

    /// Payload length in bytes, without the presence bit
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Whether the payload bytes exist in the module file
    pub const fn is_present(&self) -> bool {
        self.present
    }

    /// Payload offset in the source file (present components only)
    pub const fn file_offset(&self) -> Option<u64> {
        self.file_offset
    }

    /// Payload bytes, once loaded
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub(crate) fn set_data(&mut self, data: Vec<u8>) {
        self.data = Some(data);
    }

    /// Swap in a new payload and return the previous length
    ///
    /// `length` must already fit the 31-bit length field.
    pub(crate) fn replace_data(&mut self, data: Vec<u8>, length: u32) -> u32 {
        let old_length = self.length;
        self.data = Some(data);
        self.length = length;
        self.present = true;
        old_length
    }
}
