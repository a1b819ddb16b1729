use log::{debug, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::catalog::{LocalizationDocument, CATALOG_EXTENSION};
use crate::errors::{AppError, DocumentError};

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<(), AppError> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .map_err(|e| AppError::File(format!("Failed to create directory {:?}: {}", path, e)))?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String, AppError> {
        fs::read_to_string(&path)
            .map_err(|e| AppError::File(format!("Failed to read file {:?}: {}", path.as_ref(), e)))
    }

    /// Replace `path` with `content` without ever leaving a half-written file
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<(), AppError> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::ensure_dir(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)?;
        temp.write_all(content)?;
        temp.flush()?;
        temp.persist(path)
            .map_err(|e| AppError::File(format!("Failed to write {:?}: {}", path, e.error)))?;
        Ok(())
    }

    /// Give `path` the string catalog extension if it has none
    pub fn with_catalog_extension<P: AsRef<Path>>(path: P) -> PathBuf {
        let path = path.as_ref();
        if path.extension().is_some() {
            path.to_path_buf()
        } else {
            path.with_extension(CATALOG_EXTENSION)
        }
    }
}

/// Load a catalog for editing.
///
/// A missing or empty file gives the default document. A file that cannot
/// be parsed is logged and replaced by the default document as well; only
/// I/O failures are returned as errors.
pub fn load_catalog_or_default<P: AsRef<Path>>(path: P) -> Result<LocalizationDocument, AppError> {
    let path = path.as_ref();
    if !FileManager::file_exists(path) {
        debug!("No catalog at {:?}, starting from an empty one", path);
        return Ok(LocalizationDocument::default());
    }

    let bytes = fs::read(path)
        .map_err(|e| AppError::File(format!("Failed to read catalog {:?}: {}", path, e)))?;

    match LocalizationDocument::from_bytes(&bytes) {
        Ok(document) => Ok(document),
        Err(DocumentError::Malformed(reason)) => {
            warn!("Ignoring malformed catalog {:?}: {}", path, reason);
            Ok(LocalizationDocument::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Encode and write a catalog
pub fn write_catalog<P: AsRef<Path>>(path: P, document: &LocalizationDocument) -> Result<(), AppError> {
    let bytes = document.to_bytes()?;
    FileManager::write_atomic(&path, &bytes)?;
    debug!("Wrote {} bytes to {:?}", bytes.len(), path.as_ref());
    Ok(())
}
