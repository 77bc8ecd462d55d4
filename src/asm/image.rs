//! Raw binary program images.
//!
//! An image is just the instruction bytes in execution order: no header,
//! no metadata. `Cpu::load` packs them two per memory word.

use std::path::Path;
use thiserror::Error;

/// Load a program image from disk.
///
/// An empty file is an error: it would otherwise run as a program that
/// halts before its first instruction.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ImageError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| ImageError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    if bytes.is_empty() {
        return Err(ImageError::Empty(path.display().to_string()));
    }

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "image read");
    Ok(bytes)
}

/// Save a program image to disk.
pub fn save_image<P: AsRef<Path>>(path: P, program: &[u8]) -> Result<(), ImageError> {
    let path = path.as_ref();
    std::fs::write(path, program).map_err(|e| ImageError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Errors that can occur while reading or writing images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("cannot access image {path}: {message}")]
    Io { path: String, message: String },

    #[error("image {0} is empty")]
    Empty(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("acc8-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip.bin");
        save_image(&path, &[0xC2, 0xA2, 0xA9]).unwrap();

        assert_eq!(load_image(&path).unwrap(), vec![0xC2, 0xA2, 0xA9]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_image() {
        let path = temp_path("does-not-exist.bin");
        assert!(matches!(load_image(&path), Err(ImageError::Io { .. })));
    }

    #[test]
    fn test_empty_image() {
        let path = temp_path("empty.bin");
        save_image(&path, &[]).unwrap();

        assert!(matches!(load_image(&path), Err(ImageError::Empty(_))));
        std::fs::remove_file(&path).unwrap();
    }
}
