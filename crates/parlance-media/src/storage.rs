//! Persisting uploaded audio under the storage root.

use anyhow::Context;
use tracing::{info, warn};

use crate::{AudioResource, GatewayError, MediaGateway, Result};

/// Filenames that would resolve outside the storage root.
fn escapes_root(filename: &str) -> bool {
    filename.contains('/') || filename.contains('\\') || filename.contains("..")
}

impl MediaGateway {
    /// Write `audio` verbatim to `<storage root>/<filename>` and return that path.
    ///
    /// An existing file with the same name is overwritten. The filename is not
    /// sanitised.
    pub async fn store_audio(&self, audio: &AudioResource) -> Result<String> {
        self.store(audio)
            .await
            .map_err(|e| GatewayError::Storage(format!("{e:#}")))
    }

    async fn store(&self, audio: &AudioResource) -> anyhow::Result<String> {
        if escapes_root(&audio.filename) {
            warn!(
                file = audio.filename,
                "Audio filename contains path components; writing as given"
            );
        }

        let root = self.config.storage_root();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create storage root {}", root.display()))?;

        let audio_path = root.join(&audio.filename);
        tokio::fs::write(&audio_path, &audio.data)
            .await
            .with_context(|| format!("Failed to write {}", audio_path.display()))?;

        let audio_path = audio_path.to_string_lossy().to_string();
        info!(path = %audio_path, bytes = audio.data.len(), "Audio stored");
        Ok(audio_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::gateway_for;

    #[tokio::test]
    async fn test_store_writes_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway_for("http://127.0.0.1:9", dir.path());

        let path = gateway
            .store_audio(&AudioResource::new("a.wav", b"XYZ".to_vec()))
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("a.wav").to_string_lossy());
        assert_eq!(std::fs::read(dir.path().join("a.wav")).unwrap(), b"XYZ");
    }

    #[tokio::test]
    async fn test_same_name_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway_for("http://127.0.0.1:9", dir.path());

        gateway
            .store_audio(&AudioResource::new("a.wav", b"XYZ".to_vec()))
            .await
            .unwrap();
        gateway
            .store_audio(&AudioResource::new("a.wav", b"second".to_vec()))
            .await
            .unwrap();

        assert_eq!(std::fs::read(dir.path().join("a.wav")).unwrap(), b"second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("database").join("audios");
        let gateway = gateway_for("http://127.0.0.1:9", &root);

        gateway
            .store_audio(&AudioResource::new("b.wav", b"1".to_vec()))
            .await
            .unwrap();
        assert!(root.join("b.wav").exists());
    }

    #[tokio::test]
    async fn test_unwritable_target_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway_for("http://127.0.0.1:9", dir.path());

        // A directory already occupies the target path.
        std::fs::create_dir(dir.path().join("taken.wav")).unwrap();
        let err = gateway
            .store_audio(&AudioResource::new("taken.wav", b"1".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Storage(ref msg) if msg.contains("taken.wav")));
    }

    #[tokio::test]
    async fn test_path_like_filename_written_as_given() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("audios");
        let gateway = gateway_for("http://127.0.0.1:9", &root);

        let path = gateway
            .store_audio(&AudioResource::new("../x.wav", b"XYZ".to_vec()))
            .await
            .unwrap();

        assert_eq!(path, root.join("../x.wav").to_string_lossy());
        assert_eq!(std::fs::read(dir.path().join("x.wav")).unwrap(), b"XYZ");
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn test_escapes_root_detection() {
        assert!(escapes_root("../etc/passwd"));
        assert!(escapes_root("nested/a.wav"));
        assert!(!escapes_root("a.wav"));
    }
}
