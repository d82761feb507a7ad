use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Where the encoded bytes of one clip come from.
///
/// Downloads live outside this crate; anything that can hand over the bytes
/// of a single bounded clip can implement this.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Advisory file name. Only its extension is used, to suffix temp files.
    fn file_name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<u8>>;
}

/// Bytes already in memory, e.g. an uploaded file
pub struct InMemoryAudio {
    file_name: String,
    bytes: Vec<u8>,
}

impl InMemoryAudio {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

#[async_trait]
impl AudioSource for InMemoryAudio {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// An audio file on local disk.
pub struct LocalFileAudio {
    path: PathBuf,
    file_name: String,
}

impl LocalFileAudio {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, file_name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AudioSource for LocalFileAudio {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        let bytes = tokio::fs::read(&self.path).await?;
        debug!("Read {} bytes from {}", bytes.len(), self.path.display());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    #[tokio::test]
    async fn test_in_memory_source() {
        let source = InMemoryAudio::new("clip.mp3", vec![1, 2, 3]);
        assert_eq!(source.file_name(), "clip.mp3");
        assert_eq!(source.fetch().await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_local_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let source = LocalFileAudio::new(&path);
        assert_eq!(source.file_name(), "song.wav");
        assert_eq!(source.fetch().await.unwrap(), b"RIFF".to_vec());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = LocalFileAudio::new("/nonexistent/moodtune/clip.wav");
        assert!(matches!(source.fetch().await, Err(AnalysisError::Io(_))));
    }
}
