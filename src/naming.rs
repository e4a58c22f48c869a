//! Centralized file naming for derived image variants.
//!
//! Every derived file lives in a reserved subdirectory next to its source and
//! is named from the variant key alone:
//!
//! ```text
//! blog/featured/2024/05/cover.png
//! blog/featured/2024/05/_variants/cover__card_800x450.jpg            // centered focus
//! blog/featured/2024/05/_variants/cover__hero_1600x900_fx30_fy50.jpg  // custom focus
//! ```
//!
//! The name is a pure function of (source path, variant name, width, height,
//! focus). A centered focus keeps the short form; any other focus appends
//! its token, so moving the focus point produces a new file instead of
//! serving a crop of the old one.

use crate::imaging::CropFocus;

/// Directory and stem of a storage name like `blog/featured/cover.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceParts<'a> {
    /// Everything before the last `/`, empty for top-level files.
    pub parent: &'a str,
    /// File name without its final extension.
    pub stem: &'a str,
}

/// Split a `/`-separated storage name into parent directory and stem.
///
/// - `"blog/featured/cover.png"` → parent=`"blog/featured"`, stem=`"cover"`
/// - `"cover.tar.gz"` → parent=`""`, stem=`"cover.tar"`
/// - `"blog/.hidden"` → parent=`"blog"`, stem=`".hidden"`
/// - `"blog/README"` → parent=`"blog"`, stem=`"README"`
pub fn split_source_name(name: &str) -> SourceParts<'_> {
    let (parent, file) = name.rsplit_once('/').unwrap_or(("", name));
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    SourceParts { parent, stem }
}

/// Whether `name` may be used as a variant name.
///
/// Variant names sit between `__` and `_{w}x{h}` in derived file names. With
/// only `a-z`, `0-9` and `-` allowed, the stem/variant boundary is always the
/// last `__` before the size, so distinct keys cannot produce the same name.
pub fn is_variant_slug(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Derived file name for one variant of a source image.
///
/// `variant` must satisfy [`is_variant_slug`]; the resolver checks this
/// before building a name.
pub fn variant_file_name(
    source_name: &str,
    variants_dir: &str,
    variant: &str,
    size: (u32, u32),
    focus: CropFocus,
) -> String {
    let SourceParts { parent, stem } = split_source_name(source_name);
    let mut file = format!("{}__{}_{}x{}", stem, variant, size.0, size.1);
    if !focus.is_center() {
        file.push('_');
        file.push_str(&focus.token());
    }
    file.push_str(".jpg");

    if parent.is_empty() {
        format!("{}/{}", variants_dir, file)
    } else {
        format!("{}/{}/{}", parent, variants_dir, file)
    }
}

/// Whether a storage name sits inside a reserved variants directory.
pub fn is_variant_name(name: &str, variants_dir: &str) -> bool {
    name.split('/')
        .rev()
        .skip(1)
        .any(|segment| segment == variants_dir)
}
