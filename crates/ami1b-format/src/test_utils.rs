//! Test utilities for building synthetic 1B module images

use crate::header::PRESENCE_BIT;
use crate::strings::{LEGACY_PAD_WIDTH, PAD_WIDTH};
use std::path::{Path, PathBuf};

struct TestComponent {
    physical_address: u32,
    length: u32,
    payload: Option<Vec<u8>>,
}

/// Builds the bytes of a 1B module: header, optional name table, payloads
#[derive(Default)]
pub struct ImageBuilder {
    components: Vec<TestComponent>,
    names: Option<Vec<String>>,
    legacy: bool,
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component whose payload is stored in the file
    pub fn present(mut self, physical_address: u32, payload: Vec<u8>) -> Self {
        self.components.push(TestComponent {
            physical_address,
            length: payload.len() as u32,
            payload: Some(payload),
        });
        self
    }

    /// Add a table slot without payload bytes
    pub fn absent(mut self, physical_address: u32, length: u32) -> Self {
        self.components.push(TestComponent {
            physical_address,
            length,
            payload: None,
        });
        self
    }

    /// Embed a name table
    pub fn names(mut self, names: &[&str]) -> Self {
        self.names = Some(names.iter().map(|n| (*n).to_string()).collect());
        self
    }

    /// Use the 4.00 header family marker and 5-byte name padding
    pub fn legacy_padding(mut self) -> Self {
        self.legacy = true;
        self
    }

    pub fn build_header(&self) -> Vec<u8> {
        let mut raw = vec![0u8; 4];
        for component in &self.components {
            let mut length = component.length;
            if component.payload.is_some() {
                length |= PRESENCE_BIT;
            }
            raw.extend_from_slice(&component.physical_address.to_le_bytes());
            raw.extend_from_slice(&length.to_le_bytes());
        }

        if let Some(names) = &self.names {
            let (marker, pad) = if self.legacy {
                (b"00", LEGACY_PAD_WIDTH)
            } else {
                (b"10", PAD_WIDTH)
            };
            raw.extend_from_slice(&[0, 0]);
            raw.extend_from_slice(marker);
            for name in names {
                raw.extend_from_slice(name.as_bytes());
                raw.extend(std::iter::repeat_n(0u8, usize::from(pad)));
            }
        }

        let count = self.components.len() as u16;
        let len = raw.len() as u16;
        raw[0..2].copy_from_slice(&count.to_le_bytes());
        raw[2..4].copy_from_slice(&len.to_le_bytes());
        raw
    }

    pub fn build(&self) -> Vec<u8> {
        let mut image = self.build_header();
        for component in &self.components {
            if let Some(payload) = &component.payload {
                image.extend_from_slice(payload);
            }
        }
        image
    }

    /// Write the image to `dir/file_name`
    pub fn write(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, self.build()).expect("Should write module image");
        path
    }
}
