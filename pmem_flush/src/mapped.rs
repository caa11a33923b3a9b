use std::{fs::OpenOptions, io, path::Path};

use memmap::MmapMut;

#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("arena cannot be empty")]
    ZeroSize,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// File backed region playing the persistence domain.
///
/// In emulated mode this is ordinary volatile memory behind a mapping,
/// real media would be mapped the same way with the flushes actually
/// reaching it.
#[derive(Debug)]
pub struct MappedArena {
    mmap: MmapMut,
}

impl MappedArena {
    /// Creates (or resizes) the backing file and maps it read-write.
    pub fn create(path: impl AsRef<Path>, size: usize) -> Result<Self, ArenaError> {
        if size == 0 {
            return Err(ArenaError::ZeroSize);
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        file.set_len(size as u64)?;

        // SAFETY: the file was just sized and nobody else maps it
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self { mmap })
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.len() == 0
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.mmap.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mmap.as_mut_ptr()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mmap
    }
}
