//! BLAKE3 file signatures.
//!
//! # Overview
//!
//! Two signatures are computed per file:
//!
//! - [`partial_signature`] hashes the first and last 256 KiB of a file
//!   (or the whole file when it is no larger than 512 KiB). It is cheap and
//!   only used to decide which files deserve a full hash.
//! - [`full_signature`] streams the whole file through BLAKE3 and is the
//!   only proof of duplication.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::HashError;

/// A 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// Bytes read from each end of a file for the partial signature.
pub const PARTIAL_CHUNK_SIZE: u64 = 256 * 1024;

/// Read buffer for streaming full hashes.
const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// Compute the partial signature of a file.
///
/// Reads at most `2 * PARTIAL_CHUNK_SIZE` bytes: the head and the tail of the
/// file, or the whole file when `size <= 2 * PARTIAL_CHUNK_SIZE`. `size` is
/// the size observed during traversal; if the file has shrunk since, only
/// the bytes that could be read are hashed.
///
/// # Errors
///
/// Returns a [`HashError`] if the file cannot be opened or read.
pub fn partial_signature(path: &Path, size: u64) -> Result<Hash, HashError> {
    let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
    let mut hasher = blake3::Hasher::new();

    if size <= PARTIAL_CHUNK_SIZE * 2 {
        let mut buf = Vec::with_capacity(size as usize);
        file.by_ref()
            .take(size)
            .read_to_end(&mut buf)
            .map_err(|e| HashError::from_io(path, e))?;
        hasher.update(&buf);
    } else {
        let mut chunk = Vec::with_capacity(PARTIAL_CHUNK_SIZE as usize);
        file.by_ref()
            .take(PARTIAL_CHUNK_SIZE)
            .read_to_end(&mut chunk)
            .map_err(|e| HashError::from_io(path, e))?;
        hasher.update(&chunk);

        chunk.clear();
        file.seek(SeekFrom::Start(size - PARTIAL_CHUNK_SIZE))
            .map_err(|e| HashError::from_io(path, e))?;
        file.take(PARTIAL_CHUNK_SIZE)
            .read_to_end(&mut chunk)
            .map_err(|e| HashError::from_io(path, e))?;
        hasher.update(&chunk);
    }

    log::trace!("Partial signature computed: {}", path.display());
    Ok(*hasher.finalize().as_bytes())
}

/// Compute the full content signature of a file.
///
/// # Errors
///
/// Returns a [`HashError`] if the file cannot be opened or read.
pub fn full_signature(path: &Path) -> Result<Hash, HashError> {
    let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; STREAM_BUFFER_SIZE];

    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(HashError::from_io(path, e)),
        };
        hasher.update(&buf[..n]);
    }

    log::trace!("Full signature computed: {}", path.display());
    Ok(*hasher.finalize().as_bytes())
}

/// Render a hash as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse a 64-character hexadecimal string back into a hash.
///
/// Returns `None` for strings of the wrong length or with non-hex digits.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Hash> {
    if hex.len() != 64 || !hex.is_ascii() {
        return None;
    }
    let mut hash = [0u8; 32];
    for (i, byte) in hash.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(hash)
}
