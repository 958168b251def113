//! Local draft for documents edited before they have a backend id.
//!
//! There is at most one draft. Reading it leaves the file in place; it is
//! cleared only once the document it holds has been saved.

use crate::config::EditorConfig;
use crate::document::Document;
use crate::error::Result;
use crate::persist::{CanvasPayload, parse_document};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const DRAFT_FILE: &str = "canvas-draft.json";

#[derive(Debug, Clone)]
pub struct LocalDraft {
    path: PathBuf,
}

impl LocalDraft {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The draft file inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DRAFT_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write `doc` as the draft, replacing any previous one. The backend id
    /// is not stored.
    pub fn store(&self, doc: &Document) -> Result<()> {
        let mut payload = CanvasPayload::from_document(doc);
        payload.id = None;
        let json = serde_json::to_string(&payload)?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        log::debug!("draft stored at {}", self.path.display());
        Ok(())
    }

    /// Read the draft without clearing it.
    pub fn load(&self, config: &EditorConfig) -> Result<Option<Document>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        parse_document(&json, config).map(Some)
    }

    /// Remove the draft. Clearing a missing draft is fine.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("draft cleared");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
