//! Upload folder for intake documents and captured plate frames

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use truckgate_types::{Error, Result};

use crate::filename::secure_filename;

/// Kind of document attached to an intake submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    License,
    Challan,
}

impl DocumentKind {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::License => "license",
            DocumentKind::Challan => "challan",
        }
    }
}

/// Upload directory owning the files referenced by truck records
pub struct DocumentStore {
    uploads_dir: PathBuf,
}

impl DocumentStore {
    /// Open the upload directory, creating it if needed
    pub fn open(uploads_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&uploads_dir)?;
        Ok(Self { uploads_dir })
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Copy a document into the upload directory.
    ///
    /// The stored name is `{kind}_{token}_{sanitized original}`, so two trucks
    /// uploading `scan.jpg` never share a file.
    pub fn store_document(&self, kind: DocumentKind, source: &Path) -> Result<PathBuf> {
        if !source.is_file() {
            return Err(Error::FileNotFound(source.display().to_string()));
        }

        let original = source
            .file_name()
            .map(|n| secure_filename(&n.to_string_lossy()))
            .unwrap_or_default();
        let token = uuid::Uuid::new_v4().simple().to_string();
        let name = if original.is_empty() {
            format!("{}_{}", kind.label(), &token[..12])
        } else {
            format!("{}_{}_{}", kind.label(), &token[..12], original)
        };

        let dest = self.uploads_dir.join(name);
        fs::copy(source, &dest)?;
        tracing::debug!(kind = kind.label(), path = %dest.display(), "stored document");
        Ok(dest)
    }

    /// Save a captured frame as `plate_%Y%m%d_%H%M%S.jpg`.
    ///
    /// A second capture within the same second, from this or another
    /// process, gets a numeric suffix instead of overwriting the first.
    pub fn save_frame(&self, frame: &[u8]) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        self.save_frame_stamped(&stamp, frame)
    }

    fn save_frame_stamped(&self, stamp: &str, frame: &[u8]) -> Result<PathBuf> {
        let mut n = 0u32;
        loop {
            let name = match n {
                0 => format!("plate_{}.jpg", stamp),
                _ => format!("plate_{}_{}.jpg", stamp, n),
            };
            let dest = self.uploads_dir.join(name);

            // create_new claims the name atomically; losing the race means try the next one.
            match OpenOptions::new().write(true).create_new(true).open(&dest) {
                Ok(mut file) => {
                    if let Err(e) = file.write_all(frame) {
                        drop(file);
                        let _ = fs::remove_file(&dest);
                        return Err(e.into());
                    }
                    return Ok(dest);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Resolve a plate image reference: an existing path, or a file name
    /// inside the upload directory (as returned by `save_frame`).
    pub fn resolve(&self, reference: &Path) -> Result<PathBuf> {
        if reference.is_file() {
            return Ok(reference.to_path_buf());
        }

        let name = reference
            .file_name()
            .map(|n| secure_filename(&n.to_string_lossy()))
            .unwrap_or_default();
        let candidate = self.uploads_dir.join(&name);
        if !name.is_empty() && candidate.is_file() {
            Ok(candidate)
        } else {
            Err(Error::FileNotFound(reference.display().to_string()))
        }
    }

    /// Remove a stored document; used to undo an intake that failed later on.
    pub fn discard(&self, path: &Path) {
        if path.starts_with(&self.uploads_dir) {
            if let Err(e) = fs::remove_file(path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to discard document");
            }
        }
    }
}
