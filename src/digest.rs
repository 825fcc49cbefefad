use std::fs;
use std::io::{self, Read};
use std::path::Path;

use log::debug;

use crate::error::{DupError, Result};

/// Size of each block streamed into the hasher.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Computes the BLAKE3 content digest of a file as a lowercase hex string.
///
/// The file is streamed in [`DEFAULT_BLOCK_SIZE`] blocks so memory use does not
/// grow with file size.
pub fn calculate_file_hash(file_path: &Path) -> Result<String> {
    calculate_file_hash_with_block_size(file_path, DEFAULT_BLOCK_SIZE)
}

pub fn calculate_file_hash_with_block_size(file_path: &Path, block_size: usize) -> Result<String> {
    let access_error = |source: io::Error| DupError::FileAccess {
        path: file_path.to_path_buf(),
        source,
    };

    let mut file = fs::File::open(file_path).map_err(access_error)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0; block_size.max(1)];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(access_error(e)),
        };
        hasher.update(&buffer[..bytes_read]);
        total_bytes += bytes_read as u64;
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!("Hash calculated for '{}': {} ({} bytes)", file_path.display(), hash, total_bytes);

    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn identical_content_identical_digest() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "Hello, World!").unwrap();
        fs::write(&b, "Hello, World!").unwrap();

        assert_eq!(calculate_file_hash(&a).unwrap(), calculate_file_hash(&b).unwrap());
    }

    #[test]
    fn digest_is_deterministic_and_tracks_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.txt");
        fs::write(&path, "Hello, World!").unwrap();

        let first = calculate_file_hash(&path).unwrap();
        let second = calculate_file_hash(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);

        fs::write(&path, "Hello, World!!").unwrap();
        assert_ne!(first, calculate_file_hash(&path).unwrap());
    }

    #[test]
    fn single_byte_mutation_changes_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");
        let mut data = vec![7u8; 200_000];
        fs::write(&path, &data).unwrap();
        let before = calculate_file_hash(&path).unwrap();

        data[150_000] ^= 1;
        fs::write(&path, &data).unwrap();
        assert_ne!(before, calculate_file_hash(&path).unwrap());
    }

    #[test]
    fn block_size_does_not_change_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("multi_block.bin");
        let data: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        let streamed = calculate_file_hash_with_block_size(&path, 1000).unwrap();
        assert_eq!(streamed, calculate_file_hash(&path).unwrap());
        assert_eq!(streamed, blake3::hash(&data).to_hex().to_string());
    }

    #[test]
    fn empty_file_has_a_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, b"").unwrap();

        assert_eq!(
            calculate_file_hash(&path).unwrap(),
            blake3::hash(b"").to_hex().to_string()
        );
    }

    #[test]
    fn missing_file_is_an_access_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");

        match calculate_file_hash(&missing) {
            Err(DupError::FileAccess { path, .. }) => assert_eq!(path, missing),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
