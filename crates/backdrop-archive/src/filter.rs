/// Extensions admitted into a gallery session.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// macOS zips carry AppleDouble resource-fork shadows (`._name`) next to
/// the real files. They are not images and must never be surfaced.
const RESOURCE_FORK_PREFIX: &str = "._";

/// Decide whether a raw archive entry should be materialized.
///
/// Pure function of the entry's name and directory flag; rejected entries
/// are skipped silently by the extractor.
pub fn keep_entry(name: &str, is_dir: bool) -> bool {
    if is_dir || name.ends_with('/') || name.ends_with('\\') {
        return false;
    }
    let leaf = leaf_name(name);
    if !has_image_extension(leaf) {
        return false;
    }
    !leaf.starts_with(RESOURCE_FORK_PREFIX)
}

/// Last path segment of an entry name, accepting both separator styles.
pub(crate) fn leaf_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

fn has_image_extension(leaf: &str) -> bool {
    match leaf.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e))
        }
        _ => false,
    }
}
