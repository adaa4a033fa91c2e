//! Directory layout under the storage root.
//!
//! Sessions (one per ingested archive) live under `sessions/`; uploaded
//! bytes are spooled under `staging/` while the extractor runs.

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
    sessions: PathBuf,
    staging: PathBuf,
}

impl StoreLayout {
    pub fn builder() -> StoreLayoutBuilder {
        StoreLayoutBuilder::new()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sessions(&self) -> &Path {
        &self.sessions
    }

    pub fn staging(&self) -> &Path {
        &self.staging
    }

    pub fn session(&self, id: &str) -> PathBuf {
        self.sessions.join(id)
    }
}

#[derive(Debug, Default)]
pub struct StoreLayoutBuilder {
    root: Option<PathBuf>,
}

impl StoreLayoutBuilder {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    pub fn build(self) -> StoreLayout {
        let root = self.root.unwrap_or_else(|| PathBuf::from(".backdrop"));

        StoreLayout {
            root: root.clone(),
            sessions: root.join("sessions"),
            staging: root.join("staging"),
        }
    }
}

pub fn ensure_layout(layout: &StoreLayout) -> io::Result<()> {
    std::fs::create_dir_all(layout.sessions())?;
    std::fs::create_dir_all(layout.staging())?;
    Ok(())
}
