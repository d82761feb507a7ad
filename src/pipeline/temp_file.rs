use log::{debug, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

/// Encoded audio written to a scoped temp file.
///
/// The file is unlinked when the guard drops. A failed removal is logged and
/// otherwise ignored so it never masks the analysis result.
#[derive(Debug)]
pub struct TempAudioFile {
    path: PathBuf,
}

impl TempAudioFile {
    /// Write `bytes` to a fresh file in `dir`, keeping the extension of
    /// `file_name` so the decoder gets a format hint.
    pub fn create(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let suffix = Path::new(file_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix("moodtune-")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        let (_, path) = file.keep().map_err(|e| AnalysisError::Io(e.error))?;
        debug!("Wrote {} bytes to temp file {}", bytes.len(), path.display());

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAudioFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed temp file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove temp file {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let temp = TempAudioFile::create(dir.path(), "upload.flac", b"data").unwrap();
        let path = temp.path().to_path_buf();

        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "flac");
        assert_eq!(std::fs::read(&path).unwrap(), b"data");

        drop(temp);
        assert!(!path.exists());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let temp = TempAudioFile::create(&nested, "noext", b"x").unwrap();
        assert!(temp.path().starts_with(&nested));
        assert!(temp.path().extension().is_none());
    }

    #[test]
    fn test_already_removed_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let temp = TempAudioFile::create(dir.path(), "clip.mp3", b"x").unwrap();
        std::fs::remove_file(temp.path()).unwrap();
        drop(temp);
    }
}
