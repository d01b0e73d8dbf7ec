//! JSON file helpers shared by every pipeline step.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::review::ReviewSet;
use crate::signal::Signal;
use crate::CoreError;

/// Read and deserialize a JSON file.
///
/// # Errors
///
/// Returns [`CoreError::Io`] if the file cannot be read and
/// [`CoreError::Json`] if its content does not match `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| CoreError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

/// Write `value` as pretty-printed UTF-8 JSON with a trailing newline.
///
/// Goes through [`write_atomic`].
///
/// # Errors
///
/// Returns [`CoreError::Json`] if serialization fails and [`CoreError::Io`]
/// if any file-system step fails.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CoreError> {
    let mut body = serde_json::to_string_pretty(value).map_err(|e| CoreError::Json {
        path: path.display().to_string(),
        source: e,
    })?;
    body.push('\n');
    write_atomic(path, &body)?;
    tracing::debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

/// Write `content` to `path` without ever exposing a half-written file.
///
/// Parent directories are created. The content goes to a sibling temp file
/// first and is renamed over `path`.
///
/// # Errors
///
/// Returns [`CoreError::Io`] if any file-system step fails.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), CoreError> {
    let io_err = |source: std::io::Error| CoreError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp = temp_sibling(path);
    std::fs::write(&tmp, content).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "out".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.tmp"))
}

/// # Errors
///
/// See [`read_json`].
pub fn read_signals(path: &Path) -> Result<Vec<Signal>, CoreError> {
    read_json(path)
}

/// # Errors
///
/// See [`write_json`].
pub fn write_signals(path: &Path, signals: &[Signal]) -> Result<(), CoreError> {
    write_json(path, signals)
}

/// # Errors
///
/// See [`read_json`].
pub fn read_reviews(path: &Path) -> Result<ReviewSet, CoreError> {
    read_json(path)
}

/// # Errors
///
/// See [`write_json`].
pub fn write_reviews(path: &Path, reviews: &ReviewSet) -> Result<(), CoreError> {
    write_json(path, reviews)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::Review;
    use crate::signal::SignalType;

    #[test]
    fn write_then_read_signals_preserves_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("signals.json");
        let signals = vec![Signal::new("v1", "삼성전자", SignalType::Buy).with_content("강력 매수")];

        write_signals(&path, &signals).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("삼성전자"), "non-ASCII should not be escaped");
        assert!(raw.ends_with('\n'));

        let back = read_signals(&path).unwrap();
        assert_eq!(back, signals);
        assert!(!dir.path().join("nested").join(".signals.json.tmp").exists());
    }

    #[test]
    fn read_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = read_reviews(&path).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn read_malformed_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[{\"video_id\": ").unwrap();
        let err = read_signals(&path).unwrap_err();
        assert!(matches!(err, CoreError::Json { .. }));
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.html");
        std::fs::write(&path, "<html>old</html>").unwrap();

        write_atomic(&path, "<html>new</html>").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html>new</html>");
        assert!(!dir.path().join(".review.html.tmp").exists());
    }

    #[test]
    fn reviews_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.json");
        let mut reviews = ReviewSet::new();
        reviews.insert("v1_BTC".into(), Review::rejected("price target only"));
        write_reviews(&path, &reviews).unwrap();
        assert_eq!(read_reviews(&path).unwrap(), reviews);
    }
}
