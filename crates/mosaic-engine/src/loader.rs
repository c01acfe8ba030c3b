//! Fragment loading
//!
//! The resolver never fetches by itself. It asks a [`FragmentLoader`] for
//! the raw text behind an include's `src`.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use mosaic_core::errors::{MosaicError, Result};

/// External fetch seam
#[async_trait]
pub trait FragmentLoader: Send + Sync {
    /// Raw text of `src`.
    ///
    /// # Errors
    ///
    /// Returns `FetchFailure` when the text cannot be produced.
    async fn load(&self, src: &str) -> Result<String>;
}

/// In-memory loader that records every request
#[derive(Debug, Default)]
pub struct StaticLoader {
    files: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, src: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(src, text);
        self
    }

    pub fn insert(&mut self, src: impl Into<String>, text: impl Into<String>) {
        self.files.insert(src.into(), text.into());
    }

    /// Every `src` asked for, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl FragmentLoader for StaticLoader {
    async fn load(&self, src: &str) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(src.to_string());
        }
        self.files
            .get(src)
            .cloned()
            .ok_or_else(|| MosaicError::FetchFailure {
                src: src.to_string(),
                reason: "not found".to_string(),
            })
    }
}

/// Reads fragments from a directory
#[derive(Debug, Clone)]
pub struct FsLoader {
    base: PathBuf,
}

impl FsLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `src` resolved under the base directory; absolute paths and `..`
    /// components are refused.
    fn resolve(&self, src: &str) -> Result<PathBuf> {
        let relative = Path::new(src.trim_start_matches("./"));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(MosaicError::FetchFailure {
                src: src.to_string(),
                reason: "path escapes the fragment directory".to_string(),
            });
        }
        Ok(self.base.join(relative))
    }
}

#[async_trait]
impl FragmentLoader for FsLoader {
    async fn load(&self, src: &str) -> Result<String> {
        let path = self.resolve(src)?;
        tracing::debug!(src, path = %path.display(), "loading fragment from disk");
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| MosaicError::FetchFailure {
                src: src.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_loader_records_requests() {
        let loader = StaticLoader::new().with("a.html", "<p>a</p>");

        assert_eq!(loader.load("a.html").await.unwrap(), "<p>a</p>");
        let missing = loader.load("b.html").await;

        assert!(matches!(missing, Err(MosaicError::FetchFailure { .. })));
        assert_eq!(loader.requests(), vec!["a.html", "b.html"]);
    }

    #[tokio::test]
    async fn test_fs_loader_reads_relative_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("parts")).unwrap();
        std::fs::write(dir.path().join("parts/nav.html"), "<nav></nav>").unwrap();
        let loader = FsLoader::new(dir.path());

        assert_eq!(loader.load("parts/nav.html").await.unwrap(), "<nav></nav>");
        assert_eq!(loader.load("./parts/nav.html").await.unwrap(), "<nav></nav>");
    }

    #[tokio::test]
    async fn test_fs_loader_refuses_escapes_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FsLoader::new(dir.path());

        assert!(matches!(
            loader.load("../secret.html").await,
            Err(MosaicError::FetchFailure { .. })
        ));
        assert!(matches!(
            loader.load("absent.html").await,
            Err(MosaicError::FetchFailure { .. })
        ));
    }
}
