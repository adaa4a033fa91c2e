use std::path::Path;

/// MIME type derived purely from the file extension. Unknown or missing
/// extensions fall back to `image/jpeg`; the filter upstream only admits
/// image extensions in the first place.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}
