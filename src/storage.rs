//! Persistence step: writing generated image bytes to local files.
//!
//! Directory existence is a precondition established once per batch by the
//! orchestrator; it is not re-checked per file. Writes overwrite silently
//! when a filename collides with an existing file (last write wins).

use crate::error::Error;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Create the output directory and all missing ancestors.
pub async fn ensure_dir(path: &str) -> Result<(), Error> {
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

/// Write image bytes to the given path.
pub async fn save(bytes: &[u8], path: &Path) -> Result<(), Error> {
    tokio::fs::write(path, bytes).await?;
    debug!(path = %path.display(), bytes = bytes.len(), "Saved image");
    Ok(())
}

/// Build the output path for a request: `{output_folder}/{filename}.png`.
pub fn image_path(output_folder: &str, filename: &str) -> PathBuf {
    Path::new(output_folder).join(format!("{}.png", filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_dir_creates_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        ensure_dir(nested.to_str().unwrap()).await.unwrap();
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_ensure_dir_fails_on_file_collision() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, b"not a directory").unwrap();

        let result = ensure_dir(file.to_str().unwrap()).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");

        save(b"first", &path).await.unwrap();
        save(b"second", &path).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_image_path_appends_png_extension() {
        let path = image_path("/tmp/out", "logo");
        assert_eq!(path, Path::new("/tmp/out/logo.png"));
    }
}
