//! Safe Markdown filenames from page names.

/// Stem used when a page has no usable name.
pub const DEFAULT_STEM: &str = "coda-export";

const MAX_STEM_CHARS: usize = 200;

/// Sanitize a page name into a filesystem-safe stem.
///
/// Truncates to 200 characters, maps everything outside `[A-Za-z0-9._-]`
/// to `_`, collapses runs of `_`, and strips leading/trailing `.` and `_`.
/// Falls back to [`DEFAULT_STEM`] when nothing is left.
pub fn sanitize_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len().min(MAX_STEM_CHARS));
    for c in name.chars().take(MAX_STEM_CHARS) {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
            c
        } else {
            '_'
        };
        if c == '_' && stem.ends_with('_') {
            continue;
        }
        stem.push(c);
    }

    let trimmed = stem.trim_matches(['.', '_']);
    if trimmed.is_empty() {
        DEFAULT_STEM.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Markdown filename for an optional page name.
pub fn markdown_filename(page_name: Option<&str>) -> String {
    format!("{}.md", sanitize_stem(page_name.unwrap_or_default()))
}
