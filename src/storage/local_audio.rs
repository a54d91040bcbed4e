use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A downloaded recording in a private temporary directory.
///
/// The directory, along with any working files written next to the recording,
/// is removed when the handle is dropped.
#[derive(Debug)]
pub struct LocalAudio {
    path: PathBuf,
    _dir: TempDir,
}

impl LocalAudio {
    /// Write `bytes` to a temp file named after `key`, keeping its extension
    pub async fn from_bytes(key: &str, bytes: &[u8]) -> Result<Self> {
        let dir = TempDir::new().context("Failed to create download directory")?;
        let path = dir.path().join(local_file_name(key));

        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write download: {:?}", path))?;

        Ok(Self { path, _dir: dir })
    }

    /// Copy an existing file into a private temp directory
    pub async fn copy_from(key: &str, source: &Path) -> Result<Self> {
        let dir = TempDir::new().context("Failed to create download directory")?;
        let path = dir.path().join(local_file_name(key));

        tokio::fs::copy(source, &path)
            .await
            .with_context(|| format!("Failed to copy {:?} to {:?}", source, path))?;

        Ok(Self { path, _dir: dir })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling path with `suffix` appended to the full file name
    pub fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }
}

fn local_file_name(key: &str) -> String {
    let ext = Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("dat");
    format!("recording.{}", ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keeps_extension_and_cleans_up() -> Result<()> {
        let audio = LocalAudio::from_bytes("recordings/visit.m4a", b"abc").await?;
        let path = audio.path().to_path_buf();

        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("m4a"));
        assert_eq!(std::fs::read(&path)?, b"abc");
        assert!(audio.sibling(".txt").to_string_lossy().ends_with("recording.m4a.txt"));

        drop(audio);
        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_extension_defaults_to_dat() -> Result<()> {
        let audio = LocalAudio::from_bytes("recordings/raw", b"").await?;
        assert!(audio.path().to_string_lossy().ends_with("recording.dat"));
        Ok(())
    }
}
