//! Upload orchestration: validate, spool, extract, bound, address.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};
use uuid::Uuid;

use crate::address::encode_address;
use crate::error::{Error, Result};
use crate::layout::{StoreLayout, ensure_layout};

/// Upper bound on images per upload.
pub const DEFAULT_MAX_IMAGES: usize = 100;

/// Result of one successful ingestion: the ordered, unique public
/// addresses and the opaque session identifier.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub addresses: Vec<String>,
    pub session_id: String,
}

/// Coordinates one upload at a time against a storage layout.
pub struct Ingestor {
    layout: StoreLayout,
    max_images: usize,
}

impl Ingestor {
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            layout,
            max_images: DEFAULT_MAX_IMAGES,
        }
    }

    pub fn max_images(mut self, max: usize) -> Self {
        self.max_images = max;
        self
    }

    /// Ingest an uploaded archive.
    ///
    /// The bytes are spooled to a staging file (the extractor needs
    /// seekable input), extracted into a fresh session directory, bounded
    /// to `max_images`, and mapped to public addresses sorted by their
    /// location relative to the storage root. On any fatal error the
    /// session directory is removed best-effort before the error is
    /// returned; the staging file is always cleaned up on drop.
    pub async fn ingest(&self, bytes: &[u8], original_filename: &str) -> Result<IngestOutcome> {
        if !has_zip_suffix(original_filename) {
            return Err(Error::InvalidContainerType {
                filename: original_filename.to_string(),
            });
        }

        ensure_layout(&self.layout).map_err(|source| Error::IngestionFailed { source })?;

        let mut staging = NamedTempFile::new_in(self.layout.staging())
            .map_err(|source| Error::IngestionFailed { source })?;
        staging
            .write_all(bytes)
            .and_then(|_| staging.flush())
            .map_err(|source| Error::IngestionFailed { source })?;

        let session_id = Uuid::new_v4().to_string();
        let session_dir = self.layout.session(&session_id);
        std::fs::create_dir_all(&session_dir)
            .map_err(|source| Error::IngestionFailed { source })?;

        let extracted = match backdrop_archive::extract(staging.path(), &session_dir).await {
            Ok(locations) => locations,
            Err(err) => {
                discard_session(&session_dir);
                return Err(err.into());
            }
        };

        if extracted.is_empty() {
            discard_session(&session_dir);
            return Err(Error::EmptyContainer);
        }
        if extracted.len() > self.max_images {
            discard_session(&session_dir);
            return Err(Error::TooManyImages {
                count: extracted.len(),
                max: self.max_images,
            });
        }

        // Deterministic output order regardless of container iteration
        // order: all locations share the session prefix, so sorting full
        // paths sorts the root-relative paths.
        let mut locations = extracted;
        locations.sort();
        let locations = dedup_locations(locations);

        let addresses = match map_addresses(&self.layout, &locations) {
            Ok(addresses) => addresses,
            Err(err) => {
                discard_session(&session_dir);
                return Err(err);
            }
        };

        info!(
            session = %session_id,
            images = addresses.len(),
            "archive ingested"
        );

        Ok(IngestOutcome {
            addresses,
            session_id,
        })
    }
}

fn has_zip_suffix(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Map sorted locations to their public addresses, deduplicating the
/// result. An encoding failure propagates so the caller can discard the
/// session before surfacing it.
fn map_addresses(layout: &StoreLayout, locations: &[PathBuf]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut addresses = Vec::with_capacity(locations.len());
    for location in locations {
        let address = encode_address(layout, location)?;
        if seen.insert(address.clone()) {
            addresses.push(address);
        }
    }
    debug_assert_eq!(
        addresses.len(),
        locations.len(),
        "unique locations must encode to unique addresses"
    );
    Ok(addresses)
}

/// Boundary re-check of the extractor's no-duplicates invariant.
fn dedup_locations(locations: Vec<PathBuf>) -> Vec<PathBuf> {
    let before = locations.len();
    let mut seen = HashSet::new();
    let deduped: Vec<PathBuf> = locations
        .into_iter()
        .filter(|location| seen.insert(location.clone()))
        .collect();
    debug_assert_eq!(
        before,
        deduped.len(),
        "extractor must hand over unique locations"
    );
    deduped
}

fn discard_session(session_dir: &Path) {
    if let Err(err) = std::fs::remove_dir_all(session_dir) {
        warn!(
            path = %session_dir.display(),
            %err,
            "failed to remove session directory after ingestion error"
        );
    }
}
