//! Change detection for files pkginfo writes.
//!
//! A file is only rewritten when its content differs. The length is compared
//! first; only files of exactly the desired length are hashed.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use blake3::Hasher;

/// BLAKE3 digest of some content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ContentHash([u8; 32]);

/// State of a target file relative to its desired content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Missing,
    Diverged,
    UpToDate,
}

/// Hash a byte slice.
fn hash_bytes(bytes: &[u8]) -> ContentHash {
    ContentHash(*blake3::hash(bytes).as_bytes())
}

/// Hash a file's contents.
fn hash_file(path: &Path) -> std::io::Result<ContentHash> {
    let mut file = File::open(path)?;
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; 16 * 1024];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(ContentHash(*hasher.finalize().as_bytes()))
}

/// Compare `path` on disk against `desired`.
pub fn file_state(path: &Path, desired: &[u8]) -> std::io::Result<FileState> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FileState::Missing),
        Err(e) => return Err(e),
    };

    if !metadata.is_file() || metadata.len() != desired.len() as u64 {
        return Ok(FileState::Diverged);
    }

    if hash_file(path)? == hash_bytes(desired) {
        Ok(FileState::UpToDate)
    } else {
        Ok(FileState::Diverged)
    }
}
