//! Uploaded picture storage on the local filesystem

use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

/// Writes uploads under a media root; stored paths are relative to it
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a stored path, refusing anything that escapes the root
    fn resolve(&self, relative: &str) -> io::Result<PathBuf> {
        let path = Path::new(relative);
        let safe = path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsafe media path: {}", relative),
            ));
        }
        Ok(self.root.join(path))
    }

    pub async fn save(&self, relative: &str, data: &[u8]) -> io::Result<()> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        debug!(path = %path.display(), bytes = data.len(), "Stored upload");
        Ok(())
    }

    /// Removes stored files; failures are logged and skipped
    pub async fn remove_all(&self, relatives: &[String]) {
        for relative in relatives {
            let result = match self.resolve(relative) {
                Ok(path) => fs::remove_file(&path).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => debug!(path = %relative, "Removed upload"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %relative, error = %e, "Failed to remove upload"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("nestmate-media-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let root = temp_root();
        let storage = MediaStorage::new(&root);

        storage.save("listing_pictures/a/front.jpg", b"jpeg").await.unwrap();
        let stored = root.join("listing_pictures/a/front.jpg");
        assert_eq!(fs::read(&stored).await.unwrap(), b"jpeg");

        storage
            .remove_all(&["listing_pictures/a/front.jpg".to_string(), "missing.jpg".to_string()])
            .await;
        assert!(fs::metadata(&stored).await.is_err());

        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let storage = MediaStorage::new(temp_root());
        let err = storage.save("../outside.jpg", b"x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(storage.save("/etc/passwd", b"x").await.is_err());
    }
}
