//! Chunk reader: byte ranges of a file into owned buffers
//!
//! Every parsing step reads through [`read_chunk`], which checks the requested
//! range against the file's metadata before touching the file so a truncated
//! module fails cleanly instead of returning a short buffer.

use crate::error::Result;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Read `size` bytes starting at `offset` into a new buffer
///
/// Fails with an [`io::ErrorKind::UnexpectedEof`] IO error if the range runs
/// past the end of the file.
pub fn read_chunk(path: &Path, offset: u64, size: usize) -> Result<Vec<u8>> {
    let file_size = std::fs::metadata(path)?.len();
    let end = offset.checked_add(size as u64);

    if end.is_none_or(|end| end > file_size) {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "requested chunk 0x{offset:X}+0x{size:X} is out of range for {} (0x{file_size:X} bytes)",
                path.display()
            ),
        )
        .into());
    }

    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;

    debug!("Reading chunk 0x{:X}+0x{:X} from {}", offset, size, path.display());

    let mut buffer = vec![0u8; size];
    file.read_exact(&mut buffer)?;
    Ok(buffer)
}

/// Read a whole file into a new buffer
pub fn read_whole_file(path: &Path) -> Result<Vec<u8>> {
    let len = std::fs::metadata(path)?.len();
    let size = usize::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is too large to load ({len} bytes)", path.display()),
        )
    })?;
    read_chunk(path, 0, size)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::ModuleError;
    use std::io::Write;

    fn temp_file_with(data: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("Should create temp file");
        file.write_all(data).expect("Should write temp file");
        file.flush().expect("Should flush temp file");
        file
    }

    #[test]
    fn test_read_chunk_middle_of_file() {
        let file = temp_file_with(&[0, 1, 2, 3, 4, 5, 6, 7]);
        let chunk = read_chunk(file.path(), 2, 4).expect("Should read chunk");
        assert_eq!(chunk, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_read_chunk_up_to_eof() {
        let file = temp_file_with(&[9; 16]);
        let chunk = read_chunk(file.path(), 8, 8).expect("Should read tail");
        assert_eq!(chunk.len(), 8);
    }

    #[test]
    fn test_read_chunk_past_eof_fails() {
        let file = temp_file_with(&[0; 10]);
        let err = read_chunk(file.path(), 8, 4).unwrap_err();
        match err {
            ModuleError::Io(io) => assert_eq!(io.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_read_chunk_offset_overflow_fails() {
        let file = temp_file_with(&[0; 4]);
        assert!(read_chunk(file.path(), u64::MAX, 2).is_err());
    }

    #[test]
    fn test_read_chunk_missing_file() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let err = read_chunk(&dir.path().join("missing.bin"), 0, 1).unwrap_err();
        assert!(matches!(err, ModuleError::Io(_)));
    }

    #[test]
    fn test_read_whole_file() {
        let file = temp_file_with(b"replacement payload");
        let data = read_whole_file(file.path()).expect("Should read file");
        assert_eq!(data, b"replacement payload");
    }
}
