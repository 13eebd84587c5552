//! Announcement audio artifacts

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use truckgate_types::{AudioArtifactRef, Result, UNKNOWN_PLATE};

use crate::filename::secure_filename;

const ARTIFACT_SUFFIX: &str = "_announcement.mp3";

/// Directory of announcement audio, one file per truck number
pub struct AudioStore {
    audio_dir: PathBuf,
}

impl AudioStore {
    /// Open the audio directory, creating it if needed
    pub fn open(audio_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&audio_dir)?;
        Ok(Self { audio_dir })
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// `{truck_number}_announcement.mp3`; depends on nothing but the number
    pub fn artifact_name(truck_number: &str) -> String {
        let stem = secure_filename(truck_number);
        let stem = if stem.is_empty() { UNKNOWN_PLATE.to_string() } else { stem };
        format!("{}{}", stem, ARTIFACT_SUFFIX)
    }

    /// Write the artifact for a truck, replacing any earlier one.
    ///
    /// The bytes land in a temp file first and are renamed into place, so a
    /// reader never sees a half-written announcement.
    pub fn save(&self, truck_number: &str, audio: &[u8]) -> Result<AudioArtifactRef> {
        let name = Self::artifact_name(truck_number);
        let path = self.audio_dir.join(&name);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.audio_dir)?;
        tmp.write_all(audio)?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        Ok(AudioArtifactRef { name, path })
    }

    /// Look up the latest artifact for a truck number
    pub fn find(&self, truck_number: &str) -> Option<AudioArtifactRef> {
        let name = Self::artifact_name(truck_number);
        let path = self.audio_dir.join(&name);
        path.is_file().then_some(AudioArtifactRef { name, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_name_is_derived_from_truck_number() {
        assert_eq!(AudioStore::artifact_name("AB12CD3456"), "AB12CD3456_announcement.mp3");
        assert_eq!(AudioStore::artifact_name("../x"), "x_announcement.mp3");
        assert_eq!(AudioStore::artifact_name(""), "UNKNOWN_announcement.mp3");
    }

    #[test]
    fn test_save_overwrites_previous_artifact() {
        let dir = tempdir().unwrap();
        let store = AudioStore::open(dir.path().to_path_buf()).unwrap();

        let first = store.save("AB12CD3456", b"first").unwrap();
        let second = store.save("AB12CD3456", b"second").unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read(&second.path).unwrap(), b"second");
        assert_eq!(store.find("AB12CD3456"), Some(second));
        assert_eq!(store.find("ZZ00ZZ0000"), None);
    }
}
