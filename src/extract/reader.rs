//! Bounded file access for extractors.
//!
//! Large files are memory-mapped; small and empty files are read into memory
//! (mapping a zero-length file is an error on some platforms). All slicing
//! goes through [`Artifact::slice`], which checks header-claimed ranges
//! against the real length before handing out bytes.

use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use super::types::{ExtractError, ExtractErrorKind, ExtractResult};

/// Files at or below this size are read instead of mapped.
const MMAP_THRESHOLD: u64 = 64 * 1024;

/// Number of bytes read for magic probing.
pub const PROBE_LEN: usize = 4096;

enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(m) => m,
            Self::Owned(v) => v,
        }
    }
}

/// A binary file opened for extraction.
pub struct Artifact {
    path: PathBuf,
    data: Backing,
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("path", &self.path)
            .field("len", &self.data.len())
            .finish()
    }
}

impl Artifact {
    /// Open `path`, refusing files larger than `max_size` bytes.
    pub fn open(path: &Path, max_size: u64) -> ExtractResult<Self> {
        let file = File::open(path).map_err(|e| ExtractError::new(path, e.into()))?;
        let size = file
            .metadata()
            .map_err(|e| ExtractError::new(path, e.into()))?
            .len();
        if size > max_size {
            return Err(ExtractError::new(
                path,
                ExtractErrorKind::TooLarge {
                    size,
                    limit: max_size,
                },
            ));
        }

        let data = if size <= MMAP_THRESHOLD {
            let mut buf = Vec::with_capacity(size as usize);
            file.take(max_size)
                .read_to_end(&mut buf)
                .map_err(|e| ExtractError::new(path, e.into()))?;
            Backing::Owned(buf)
        } else {
            // SAFETY: the mapping is read-only and dropped with the Artifact.
            // A concurrent writer truncating the file could fault; extraction
            // runs on build outputs that are no longer being written.
            let map = unsafe { Mmap::map(&file) }.map_err(|e| ExtractError::new(path, e.into()))?;
            Backing::Mapped(map)
        };

        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Wrap bytes already in memory (archive members, tests).
    #[must_use]
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            data: Backing::Owned(bytes),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes `[offset, offset + len)`, or `Truncated` if that range leaves the file.
    pub fn slice(&self, offset: u64, len: u64) -> ExtractResult<&[u8]> {
        checked_range(self.bytes(), offset, len).ok_or_else(|| ExtractError::truncated(&self.path))
    }

    /// Leading bytes used for magic probing.
    #[must_use]
    pub fn header(&self) -> &[u8] {
        let data = self.bytes();
        &data[..data.len().min(PROBE_LEN)]
    }
}

/// Bounds-checked sub-slice. Returns `None` when the claimed range overflows
/// or runs past the end of `data`.
#[must_use]
pub fn checked_range(data: &[u8], offset: u64, len: u64) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let len = usize::try_from(len).ok()?;
    let end = start.checked_add(len)?;
    data.get(start..end)
}

/// Read up to [`PROBE_LEN`] bytes from the start of a file.
pub fn read_prefix(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(PROBE_LEN);
    file.take(PROBE_LEN as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

pub(crate) fn read_u16(data: &[u8], offset: usize, little: bool) -> Option<u16> {
    let bytes: [u8; 2] = data.get(offset..offset.checked_add(2)?)?.try_into().ok()?;
    Some(if little {
        u16::from_le_bytes(bytes)
    } else {
        u16::from_be_bytes(bytes)
    })
}

pub(crate) fn read_u32(data: &[u8], offset: usize, little: bool) -> Option<u32> {
    let bytes: [u8; 4] = data.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
    Some(if little {
        u32::from_le_bytes(bytes)
    } else {
        u32::from_be_bytes(bytes)
    })
}
