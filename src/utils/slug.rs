//! URL slug derivation.
//!
//! File-backed records that carry no explicit `slug` in their frontmatter
//! get one derived from the file stem. Slugs are lowercase ASCII with
//! hyphen-separated words, suitable as URL path segments.

use deunicode::deunicode;

/// Convert arbitrary text to a URL-safe slug.
///
/// Non-ASCII input is transliterated first, so "Déjà Vu.md" and "deja-vu.md"
/// produce the same slug.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode(text);

    let mut slug = String::with_capacity(ascii.len());
    let mut pending_separator = false;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}
