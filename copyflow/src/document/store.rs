//! Filesystem persistence for briefs and final documents.

use super::{DocumentOrder, FinalDocument};
use crate::config::StorageConfig;
use crate::core::{slugify, Brief};
use crate::errors::CopyflowError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Reads and writes run files under two directories.
///
/// Writes overwrite: two runs for the same client on the same day race on
/// last-write-wins.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    briefs_dir: PathBuf,
    output_dir: PathBuf,
}

impl DocumentStore {
    /// Creates a store.
    #[must_use]
    pub fn new(briefs_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            briefs_dir: briefs_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Creates a store from configuration.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.briefs_dir, &config.output_dir)
    }

    /// Returns the brief path for a slug.
    #[must_use]
    pub fn brief_path(&self, slug: &str) -> PathBuf {
        self.briefs_dir.join(format!("{slug}.md"))
    }

    /// Returns where a document will be written.
    #[must_use]
    pub fn document_path(&self, document: &FinalDocument) -> PathBuf {
        self.output_dir.join(document.file_name())
    }

    /// Writes the brief text under its slug.
    pub async fn write_brief(&self, brief: &Brief) -> Result<PathBuf, CopyflowError> {
        let path = self.brief_path(brief.slug());
        write_file(&self.briefs_dir, &path, brief.text()).await?;
        debug!(path = %path.display(), "Brief written");
        Ok(path)
    }

    /// Loads the brief stored for a client name.
    pub async fn read_brief(&self, client_name: &str) -> Result<Brief, CopyflowError> {
        let path = self.brief_path(&slugify(client_name));
        let text = fs::read_to_string(&path)
            .await
            .map_err(|e| CopyflowError::persistence(&path, e))?;
        Ok(Brief::new(client_name, text))
    }

    /// Renders and writes the final document, returning its path.
    pub async fn write_document(
        &self,
        document: &FinalDocument,
        order: DocumentOrder,
    ) -> Result<PathBuf, CopyflowError> {
        let path = self.document_path(document);
        write_file(&self.output_dir, &path, &document.render(order)).await?;
        debug!(path = %path.display(), "Document written");
        Ok(path)
    }
}

async fn write_file(dir: &Path, path: &Path, contents: &str) -> Result<(), CopyflowError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| CopyflowError::persistence(dir, e))?;
    fs::write(path, contents)
        .await
        .map_err(|e| CopyflowError::persistence(path, e))
}
