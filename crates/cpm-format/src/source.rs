//! Module byte sources
//!
//! Parsers only ever see `&[u8]`; this type owns the bytes behind that slice.

use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::ops::Deref;
use std::path::Path;

/// Bytes of a module, either mapped from a file or held on the heap
#[derive(Debug)]
pub enum ModuleSource {
    /// Read-only mapping of a module file
    Mapped(Mmap),
    /// Heap buffer
    Owned(Vec<u8>),
}

impl ModuleSource {
    /// Map the file at `path` read-only
    ///
    /// Empty files are read into an empty heap buffer instead, since
    /// zero-length mappings are refused on most platforms.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            log::debug!("{} is empty", path.display());
            return Ok(ModuleSource::Owned(Vec::new()));
        }
        // SAFETY: the mapping is read-only. Modifying the file while it is
        // mapped is outside what this type guards against.
        let map = unsafe { Mmap::map(&file)? };
        log::debug!("mapped {} ({} bytes)", path.display(), map.len());
        Ok(ModuleSource::Mapped(map))
    }

    /// Wrap a heap buffer
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        ModuleSource::Owned(bytes)
    }

    /// Module bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ModuleSource::Mapped(map) => map,
            ModuleSource::Owned(bytes) => bytes,
        }
    }

    /// Whether the bytes come from a file mapping
    pub fn is_mapped(&self) -> bool {
        matches!(self, ModuleSource::Mapped(_))
    }
}

impl Deref for ModuleSource {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for ModuleSource {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Vec<u8>> for ModuleSource {
    fn from(bytes: Vec<u8>) -> Self {
        ModuleSource::from_vec(bytes)
    }
}
