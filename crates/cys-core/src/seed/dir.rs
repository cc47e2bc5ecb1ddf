//! Seed documents read from a local directory tree.

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::SeedSource;

/// Resolves candidate locations relative to a site root on disk, so
/// `/public/data/events.json` becomes `<root>/public/data/events.json`.
#[derive(Debug, Clone)]
pub struct DirSeedSource {
    root: PathBuf,
}

impl DirSeedSource {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn path_for(&self, location: &str) -> PathBuf {
        self.root.join(location.trim_start_matches('/'))
    }
}

impl SeedSource for DirSeedSource {
    async fn fetch_document(&self, location: &str) -> Result<Option<String>> {
        let path = self.path_for(location);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read seed file {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/events.json"), "[]").unwrap();

        let source = DirSeedSource::new(dir.path().to_path_buf());
        assert_eq!(
            source.fetch_document("/data/events.json").await.unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(source.fetch_document("/events.json").await.unwrap(), None);
    }
}
