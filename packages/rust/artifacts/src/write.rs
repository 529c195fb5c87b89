//! Atomic artifact writes.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use modelcharts_shared::{ModelChartsError, Result};

/// Metadata for a single written artifact file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ArtifactMeta {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Write `content` to `path` atomically: write `.<filename>.tmp` next to the
/// target, then rename it into place. Parent directories are created.
///
/// A failed write never leaves a partial file at `path`.
pub fn write_atomic(path: &Path, content: &str) -> Result<ArtifactMeta> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ModelChartsError::validation(format!(
            "artifact path has no file name: {}",
            path.display()
        )))?
        .to_string();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| ModelChartsError::io(&dir, e))?;

    let temp = dir.join(format!(".{filename}.tmp"));

    if let Err(e) = std::fs::write(&temp, content) {
        let _ = std::fs::remove_file(&temp);
        return Err(ModelChartsError::io(&temp, e));
    }

    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(ModelChartsError::io(path, e));
    }

    debug!(file = %path.display(), size = content.len(), "wrote artifact");

    Ok(ArtifactMeta {
        filename,
        sha256: sha256_hex(content.as_bytes()),
        size_bytes: content.len(),
    })
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "mc-write-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn writes_content_and_checksum() {
        let tmp = temp_dir();
        let path = tmp.join("nested").join("data.json");

        let meta = write_atomic(&path, "{\"total_models\": 0}").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"total_models\": 0}");
        assert_eq!(meta.filename, "data.json");
        assert_eq!(meta.size_bytes, 19);
        assert_eq!(meta.sha256.len(), 64);
        assert!(!tmp.join("nested").join(".data.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn overwrites_existing_file() {
        let tmp = temp_dir();
        let path = tmp.join("stat.json");
        write_atomic(&path, "old").unwrap();
        write_atomic(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn failed_rename_leaves_target_untouched() {
        let tmp = temp_dir();
        // A directory at the target path makes the rename fail.
        let path = tmp.join("data.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let err = write_atomic(&path, "content").unwrap_err();
        assert_eq!(err.kind(), "IOFailure");
        assert!(path.is_dir());
        assert!(!tmp.join(".data.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn known_digest() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
