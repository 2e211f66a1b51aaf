//! In-memory 1B module: header, components and the operations on them

use crate::chunk;
use crate::component::Component;
use crate::error::{ModuleError, Result};
use crate::header::{Header, LengthField};
use crate::loader::ModuleLoader;
use crate::table::DecodedTable;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A parsed 1B module
///
/// Owns the header buffer and every component payload. Built only by
/// [`ModuleLoader`], so an instance always describes a fully loaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    source_path: PathBuf,
    file_size: u64,
    calculated_size: u64,
    header: Header,
    components: Vec<Component>,
}

/// Outcome of a payload replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replacement {
    /// Table position of the replaced component
    pub position: usize,
    /// Payload length before the replacement
    pub old_length: u32,
    /// Payload length after the replacement
    pub new_length: u32,
}

impl Replacement {
    /// Whether the new payload differs in size from the old one
    ///
    /// Offsets of the following components are not shifted, so a module
    /// written after a size-changing replacement no longer matches its own
    /// computed offsets.
    pub const fn size_changed(&self) -> bool {
        self.old_length != self.new_length
    }
}

impl Module {
    pub(crate) fn new(source_path: PathBuf, file_size: u64, decoded: DecodedTable) -> Self {
        Self {
            source_path,
            file_size,
            calculated_size: decoded.calculated_size,
            header: decoded.header,
            components: decoded.components,
        }
    }

    /// Load a module with default [`ModuleLoader`] settings
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        ModuleLoader::new().load(path)
    }

    /// Path the module was loaded from
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Size of the source file from filesystem metadata
    pub const fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Header length plus the lengths of all present payloads
    pub const fn calculated_size(&self) -> u64 {
        self.calculated_size
    }

    /// Whether the calculated size matches the source file size
    pub const fn size_matches(&self) -> bool {
        self.calculated_size == self.file_size
    }

    /// Decoded header
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Number of table entries, including absent components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// All components in table order
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Component at table position `position`
    pub fn component(&self, position: usize) -> Option<&Component> {
        self.components.get(position)
    }

    /// Present component whose payload starts at `offset` in the source file
    pub fn find_by_file_offset(&self, offset: u64) -> Option<&Component> {
        self.components
            .iter()
            .find(|component| component.file_offset() == Some(offset))
    }

    /// Replace a component's payload with the contents of `replacement`
    ///
    /// See [`Module::replace_component_payload`].
    pub fn replace_component_data(
        &mut self,
        position: usize,
        replacement: impl AsRef<Path>,
    ) -> Result<Replacement> {
        let replacement = replacement.as_ref();
        self.ensure_replaceable(position)?;

        let data = chunk::read_whole_file(replacement)?;
        debug!(
            "Read 0x{:X} replacement bytes from {}",
            data.len(),
            replacement.display()
        );
        self.replace_component_payload(position, data)
    }

    /// Replace the payload of the component starting at file offset `offset`
    pub fn replace_component_at_offset(
        &mut self,
        offset: u64,
        replacement: impl AsRef<Path>,
    ) -> Result<Replacement> {
        let position = self
            .find_by_file_offset(offset)
            .map(Component::position)
            .ok_or_else(|| ModuleError::ComponentNotFound(format!("file offset 0x{offset:X}")))?;
        self.replace_component_data(position, replacement)
    }

    /// Replace a component's payload with `data`
    ///
    /// The component must be present. Its table entry in the header buffer is
    /// rewritten with the new length and the presence bit set; no other byte of
    /// the header changes, and no other component moves. On error the module is
    /// left untouched.
    pub fn replace_component_payload(&mut self, position: usize, data: Vec<u8>) -> Result<Replacement> {
        self.ensure_replaceable(position)?;

        let new_length = u32::try_from(data.len())
            .ok()
            .filter(|&len| len <= LengthField::MAX_LENGTH)
            .ok_or(ModuleError::PayloadTooLarge {
                position,
                length: data.len() as u64,
            })?;

        let mut entry = self.header.entry(position)?;
        entry.length = LengthField::new(new_length, true);
        self.header.set_entry(position, entry)?;

        let old_length = self.components[position].replace_data(data, new_length);
        self.calculated_size = self.recalculate_size();

        let replacement = Replacement {
            position,
            old_length,
            new_length,
        };
        if replacement.size_changed() {
            warn!(
                "New payload for component [{:02X}h] is 0x{:X} bytes, previous was 0x{:X}",
                position, new_length, old_length
            );
        }
        Ok(replacement)
    }

    /// Serialize the module: header bytes, then each present payload in table order
    ///
    /// Returns the number of bytes written.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<u64> {
        self.ensure_loaded()?;

        writer.write_all(self.header.raw())?;
        let mut written = self.header.raw().len() as u64;

        for component in self.components.iter().filter(|c| c.is_present()) {
            let data = component.data().ok_or_else(|| {
                ModuleError::InvalidModule(format!(
                    "component [{:02X}h] is present but has no payload",
                    component.position()
                ))
            })?;
            writer.write_all(data)?;
            written += data.len() as u64;
            debug!(
                "Wrote component [{:02X}h] of length 0x{:X}",
                component.position(),
                data.len()
            );
        }

        Ok(written)
    }

    /// Serialize into a new buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(self.calculated_size as usize);
        self.write_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Write the module to `path`, truncating any existing file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.ensure_loaded()?;

        let mut writer = BufWriter::new(File::create(path)?);
        let written = self.write_to(&mut writer)?;
        writer.flush()?;

        info!("Wrote 0x{:X} bytes of 1B data to {}", written, path.display());
        Ok(())
    }

    /// Write the module to `path` through a temporary file renamed on success
    ///
    /// An existing destination is only replaced once the whole module has been
    /// written, so a failure never leaves a half-written file at `path`. The
    /// destination keeps its permissions.
    pub fn write_to_file_atomic(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.ensure_loaded()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        let written = {
            let mut writer = BufWriter::new(temp.as_file_mut());
            let written = self.write_to(&mut writer)?;
            writer.flush()?;
            written
        };
        temp.as_file().sync_all()?;

        // Keep the mode of the file being replaced
        match std::fs::metadata(path) {
            Ok(existing) => temp.as_file().set_permissions(existing.permissions())?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        temp.persist(path).map_err(|e| ModuleError::Io(e.error))?;

        info!("Wrote 0x{:X} bytes of 1B data to {}", written, path.display());
        Ok(())
    }

    /// Write a present component's payload to `dir/<component name>`
    ///
    /// Present components with an empty payload have nothing to extract and
    /// fail with [`ModuleError::InvalidModule`].
    pub fn extract_component(&self, position: usize, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let component = self
            .component(position)
            .ok_or_else(|| ModuleError::ComponentNotFound(format!("position {position}")))?;
        let data = component
            .data()
            .filter(|_| component.is_present())
            .ok_or(ModuleError::ComponentNotPresent { position })?;
        if data.is_empty() {
            return Err(ModuleError::InvalidModule(format!(
                "component [{position:02X}h] has an empty payload"
            )));
        }

        let name = component.name();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ModuleError::InvalidModule(format!(
                "component [{position:02X}h] name {name:?} is not usable as a file name"
            )));
        }

        let path = dir.as_ref().join(name);
        std::fs::write(&path, data)?;
        info!("Wrote component [{:02X}h] to {}", position, path.display());
        Ok(path)
    }

    /// Extract every present, non-empty component into `dir`
    pub fn extract_all(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        self.components
            .iter()
            .filter(|c| c.is_present() && c.length() > 0)
            .map(|c| self.extract_component(c.position(), dir))
            .collect()
    }

    fn ensure_replaceable(&self, position: usize) -> Result<()> {
        let component = self
            .component(position)
            .ok_or_else(|| ModuleError::ComponentNotFound(format!("position {position}")))?;
        if !component.is_present() || component.data().is_none() {
            return Err(ModuleError::ComponentNotPresent { position });
        }
        Ok(())
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.calculated_size == 0 || self.file_size == 0 {
            return Err(ModuleError::InvalidModule(
                "module contents are empty".to_string(),
            ));
        }
        Ok(())
    }

    fn recalculate_size(&self) -> u64 {
        let payloads: u64 = self
            .components
            .iter()
            .filter(|c| c.is_present())
            .map(|c| u64::from(c.length()))
            .sum();
        u64::from(self.header.length()) + payloads
    }
}
