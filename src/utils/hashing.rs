use crate::utils::{MusubiError, Result};
use memmap2::MmapOptions;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Content hash used for change detection and cache keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of_bytes(data: &[u8]) -> Self {
        ContentHash(*blake3::hash(data).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

/// Hash a file's contents without loading it through a heap buffer.
pub fn hash_file(path: &Path) -> Result<ContentHash> {
    let file = File::open(path).map_err(MusubiError::Io)?;
    let len = file.metadata().map_err(MusubiError::Io)?.len();

    // Mapping a zero-length file fails on some platforms
    if len == 0 {
        return Ok(ContentHash::of_bytes(&[]));
    }

    let mmap = unsafe {
        MmapOptions::new()
            .map(&file)
            .map_err(|e| MusubiError::build(format!("Memory mapping failed: {}", e)))?
    };

    Ok(ContentHash::of_bytes(&mmap))
}

/// Compare two files by size, then by content hash.
pub fn files_identical(a: &Path, b: &Path) -> Result<bool> {
    let meta_a = std::fs::metadata(a).map_err(MusubiError::Io)?;
    let meta_b = std::fs::metadata(b).map_err(MusubiError::Io)?;
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }
    Ok(hash_file(a)? == hash_file(b)?)
}
