//! Cache for plate readings, keyed by image content

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use truckgate_types::{CacheError, PlateReading, Result};

/// On-disk cache of recognized plates.
///
/// Entries are `<sha256 of image>.json` files holding a `PlateReading`.
/// Only recognized plates are written: the vision service may read the same
/// frame on a retry, so an unreadable result is never remembered.
pub struct Cache {
    cache_dir: PathBuf,
}

impl Cache {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    /// SHA-256 of the image bytes, hex encoded
    pub fn cache_key(image: &[u8]) -> String {
        let hash = Sha256::digest(image);
        format!("{:x}", hash)
    }

    fn entry_path(&self, image: &[u8]) -> PathBuf {
        self.cache_dir.join(format!("{}.json", Self::cache_key(image)))
    }

    /// Cached plate for an image. Entries left by older builds that stored
    /// unreadable results count as a miss.
    pub fn get(&self, image: &[u8]) -> Result<Option<PlateReading>> {
        let cache_path = self.entry_path(image);
        if !cache_path.exists() {
            return Ok(None);
        }

        match read_entry(&cache_path)? {
            reading @ PlateReading::Recognized { .. } => Ok(Some(reading)),
            PlateReading::Unrecognized { .. } => Ok(None),
        }
    }

    /// Remember the plate read from an image
    pub fn set_plate(&self, image: &[u8], plate: &str) -> Result<()> {
        let cache_path = self.entry_path(image);
        let reading = PlateReading::Recognized {
            plate: plate.to_string(),
        };
        let content = serde_json::to_string_pretty(&reading)?;
        fs::write(&cache_path, content)
            .map_err(|e| CacheError::IoError(format!("{}: {}", cache_path.display(), e)))?;
        Ok(())
    }

    /// Entry files only; anything else dropped into the directory is left alone
    fn entry_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if is_entry_file(&path) {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Remove every entry, returning how many were removed
    pub fn clear(&self) -> Result<usize> {
        let paths = self.entry_paths()?;
        for path in &paths {
            fs::remove_file(path)
                .map_err(|e| CacheError::IoError(format!("{}: {}", path.display(), e)))?;
        }
        tracing::info!(removed = paths.len(), dir = %self.cache_dir.display(), "plate cache cleared");
        Ok(paths.len())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats {
            location: self.cache_dir.clone(),
            ..CacheStats::default()
        };

        for path in self.entry_paths()? {
            stats.bytes += fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            match read_entry(&path) {
                Ok(PlateReading::Recognized { .. }) => stats.plates += 1,
                _ => stats.stale += 1,
            }
        }
        Ok(stats)
    }
}

fn read_entry(path: &Path) -> Result<PlateReading> {
    let content = fs::read_to_string(path)?;
    let reading = serde_json::from_str(&content)
        .map_err(|e| CacheError::Corrupted(format!("{}: {}", path.display(), e)))?;
    Ok(reading)
}

fn is_entry_file(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "json")
        && path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem.len() == 64 && stem.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Counts over the cache directory
#[derive(Debug, Default, PartialEq)]
pub struct CacheStats {
    /// Entries holding a recognized plate
    pub plates: usize,
    /// Unreadable entries and leftovers that `get` ignores
    pub stale: usize,
    pub bytes: u64,
    pub location: PathBuf,
}

impl CacheStats {
    pub fn entries(&self) -> usize {
        self.plates + self.stale
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plate cache: {}", self.location.display())?;
        write!(
            f,
            "  {} plates, {} stale, {:.1} KB",
            self.plates,
            self.stale,
            self.bytes as f64 / 1024.0
        )
    }
}
