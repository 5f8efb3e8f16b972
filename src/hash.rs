//! SHA-256 hashing utilities for manifest checksums and local fingerprints

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Result, SkilletError};

/// Hash prefix for SHA-256 digests
pub const HASH_PREFIX: &str = "sha256:";

/// Calculate the SHA-256 digest of a file, returned as lowercase hex
pub fn digest_hex(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| SkilletError::IoError {
        message: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| SkilletError::IoError {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Calculate the prefixed SHA-256 hash of a file
pub fn hash_file(path: &Path) -> Result<String> {
    Ok(format!("{}{}", HASH_PREFIX, digest_hex(path)?))
}

/// Verify a hash matches the expected value
///
/// Both sides are normalized to carry the prefix before comparison.
pub fn verify_hash(expected: &str, actual: &str) -> bool {
    let normalize = |h: &str| {
        if h.starts_with(HASH_PREFIX) {
            h.to_string()
        } else {
            format!("{}{}", HASH_PREFIX, h)
        }
    };

    normalize(expected) == normalize(actual)
}
