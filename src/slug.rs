use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Longest name the hosting provider accepts as a subdomain label.
pub const MAX_SLUG_LEN: usize = 55;

/// Fallback when sanitization leaves nothing usable.
pub const DEFAULT_SLUG: &str = "our-wedding";

/// Normalize a free-text site name into a hosting slug: lowercase ASCII
/// alphanumerics and single hyphens, no leading/trailing hyphen, at most
/// 55 characters. Diacritics are transliterated rather than dropped, so
/// "Café" becomes "cafe".
///
/// Sanitizing an already-sanitized slug returns it unchanged.
pub fn sanitize(input: &str) -> String {
    let lowered = input.to_lowercase();
    // NFD pulls combining marks out of precomposed characters so they can be
    // filtered away, leaving the base letter.
    let stripped: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();

    let mut slug = String::with_capacity(stripped.len());
    let mut pending_hyphen = false;
    for c in stripped.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            // Runs of disallowed characters collapse to a single hyphen.
            pending_hyphen = true;
        }
    }

    // Safe: everything kept above is single-byte ASCII.
    slug.truncate(MAX_SLUG_LEN);
    // Truncation can expose a trailing hyphen.
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug
    }
}
