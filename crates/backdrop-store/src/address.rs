//! Public addresses for extracted images.
//!
//! An address is the file's location relative to the storage root,
//! separator-normalized, percent-encoded segment by segment, and exposed
//! under the `images/` routing prefix. Resolution re-checks containment on
//! the canonicalized path so that no encoding trick can reach outside the
//! storage root.

use std::path::{Component, Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::error::{Error, Result};
use crate::layout::StoreLayout;
use crate::mime::mime_for;

/// Routing prefix understood by the serving collaborator.
pub const ADDRESS_PREFIX: &str = "images/";

/// Characters escaped inside one path segment. `/` never appears here
/// because segments are encoded individually and joined with `/`.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Encode a location under the storage root as a public address.
pub fn encode_address(layout: &StoreLayout, location: &Path) -> Result<String> {
    let relative = location
        .strip_prefix(layout.root())
        .map_err(|_| traversal(&location.display().to_string()))?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_string_lossy();
                segments.push(utf8_percent_encode(&part, SEGMENT).to_string());
            }
            _ => return Err(traversal(&location.display().to_string())),
        }
    }

    Ok(format!("{ADDRESS_PREFIX}{}", segments.join("/")))
}

/// Resolve a public address back to a concrete location.
///
/// Fails with [`Error::PathTraversal`] if the decoded address contains
/// parent-dir segments, absolute escapes, or canonicalizes outside the
/// storage root, and with [`Error::NotFound`] if no file backs it.
pub fn resolve_address(layout: &StoreLayout, address: &str) -> Result<PathBuf> {
    let trimmed = address.strip_prefix(ADDRESS_PREFIX).unwrap_or(address);

    let decoded = percent_decode_str(trimmed)
        .decode_utf8()
        .map_err(|_| traversal(address))?;
    let normalized = decoded.replace('\\', "/");

    if normalized.starts_with('/') {
        return Err(traversal(address));
    }

    let mut relative = PathBuf::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(traversal(address)),
            part => relative.push(part),
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(traversal(address));
    }
    // Windows drive/UNC prefixes smuggled into a segment.
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(traversal(address));
    }

    let candidate = layout.root().join(&relative);
    if !candidate.is_file() {
        return Err(Error::NotFound {
            address: address.to_string(),
        });
    }

    // The containment check runs on canonicalized paths: symlinks or
    // lexical tricks that survived decoding must still land under the root.
    let root = layout
        .root()
        .canonicalize()
        .map_err(|_| not_found(address))?;
    let resolved = candidate.canonicalize().map_err(|_| not_found(address))?;
    if !resolved.starts_with(&root) {
        return Err(traversal(address));
    }

    Ok(resolved)
}

/// Resolve an address and read its bytes, paired with the MIME type
/// derived from the file extension.
pub async fn serve_image(layout: &StoreLayout, address: &str) -> Result<(Vec<u8>, &'static str)> {
    let location = resolve_address(layout, address)?;
    let bytes = tokio::fs::read(&location)
        .await
        .map_err(|source| Error::ServeFailed {
            address: address.to_string(),
            source,
        })?;
    Ok((bytes, mime_for(&location)))
}

fn traversal(address: &str) -> Error {
    Error::PathTraversal {
        address: address.to_string(),
    }
}

fn not_found(address: &str) -> Error {
    Error::NotFound {
        address: address.to_string(),
    }
}
