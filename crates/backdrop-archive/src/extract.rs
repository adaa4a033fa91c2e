use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::filter::{keep_entry, leaf_name};

/// Extract every qualifying image entry of the zip at `archive_path` into
/// `dest_dir`, flattening directory structure.
///
/// Local entries are read sequentially off the stream, one at a time, in
/// the order the container lists them. Duplicate entry names are legal in
/// zip; only the first occurrence of a name is processed. Leaf-name
/// collisions between distinct entries are resolved with numeric suffixes
/// (`a.jpg`, `a_1.jpg`, ...). A failed write drops that entry from the
/// result instead of aborting the batch.
///
/// Returns the extracted locations in processing order, guaranteed free of
/// duplicates. Fails with [`Error::Corrupted`] if the container cannot be
/// parsed and [`Error::Io`] if the destination cannot be prepared.
pub async fn extract(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut reader = BufReader::new(File::open(archive_path)?);

    std::fs::create_dir_all(dest_dir)?;

    // Both sets are scoped to this call: collision bookkeeping must not
    // leak across concurrent extractions into other destinations.
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut claimed_paths: HashSet<PathBuf> = HashSet::new();
    let mut writes = Vec::new();

    // Local headers are walked directly instead of going through the
    // central directory: the directory is keyed by name and collapses
    // duplicate entries, hiding every occurrence but the last.
    loop {
        let mut entry = match zip::read::read_zipfile_from_stream(&mut reader) {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(_) => return Err(Error::Corrupted),
        };
        let name = entry.name().to_string();

        if !seen_names.insert(name.clone()) {
            debug!(entry = %name, "duplicate entry name, keeping first occurrence only");
            continue;
        }
        if !keep_entry(&name, entry.is_dir()) {
            debug!(entry = %name, "entry filtered out");
            continue;
        }

        let target = claim_target(dest_dir, leaf_name(&name), &mut claimed_paths);

        // The zip reader hands out entries one at a time, so the bytes are
        // drained here; the disk write itself is free to overlap with the
        // next entry's metadata read.
        let mut content = Vec::with_capacity(initial_capacity(entry.size()));
        if let Err(err) = entry.read_to_end(&mut content) {
            // The stream offset is unreliable after a partial entry read.
            warn!(entry = %name, %err, "failed to read entry, stopping the walk");
            break;
        }

        writes.push(tokio::spawn(write_entry(target, content)));
    }

    // Fan-in barrier: every outstanding copy must settle before the result
    // list is computed.
    let mut extracted = Vec::new();
    for outcome in join_all(writes).await {
        match outcome {
            Ok(Some(path)) => extracted.push(path),
            Ok(None) => {}
            Err(err) => warn!(%err, "entry write task panicked"),
        }
    }

    Ok(dedup_paths(extracted))
}

/// Preallocation for one entry's bytes. The declared size comes straight
/// from an attacker-controlled header field, so it only seeds the buffer
/// up to a fixed bound; larger entries grow the buffer as real bytes
/// arrive.
fn initial_capacity(declared_size: u64) -> usize {
    const MAX_PREALLOC_BYTES: u64 = 1 << 20;
    declared_size.min(MAX_PREALLOC_BYTES) as usize
}

/// Write one entry's bytes and confirm the file landed. Returns `None` on
/// failure; per-entry write errors never abort the extraction.
async fn write_entry(target: PathBuf, content: Vec<u8>) -> Option<PathBuf> {
    if let Err(err) = tokio::fs::write(&target, &content).await {
        warn!(path = %target.display(), %err, "entry write failed, omitting");
        return None;
    }
    match tokio::fs::try_exists(&target).await {
        Ok(true) => Some(target),
        Ok(false) => {
            warn!(path = %target.display(), "written file not present, omitting");
            None
        }
        Err(err) => {
            warn!(path = %target.display(), %err, "could not verify written file, omitting");
            None
        }
    }
}

/// Pick a free destination for `leaf`, suffixing `name_1.ext`, `name_2.ext`
/// and so on until the candidate is neither claimed by an earlier entry of
/// this call nor already on disk. The chosen path is recorded as claimed.
fn claim_target(dest_dir: &Path, leaf: &str, claimed: &mut HashSet<PathBuf>) -> PathBuf {
    let (stem, ext) = match leaf.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (leaf, None),
    };

    let mut candidate = dest_dir.join(leaf);
    let mut counter = 1usize;
    while claimed.contains(&candidate) || candidate.exists() {
        let renamed = match ext {
            Some(ext) => format!("{stem}_{counter}.{ext}"),
            None => format!("{stem}_{counter}"),
        };
        candidate = dest_dir.join(renamed);
        counter += 1;
    }

    claimed.insert(candidate.clone());
    candidate
}

/// Order-preserving dedup over the successful locations. Collision handling
/// already guarantees uniqueness, so any removal here is a logic error.
fn dedup_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let before = paths.len();
    let mut seen = HashSet::new();
    let deduped: Vec<PathBuf> = paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect();
    debug_assert_eq!(
        before,
        deduped.len(),
        "collision handling must already yield unique locations"
    );
    deduped
}
