//! Output text normalization
//!
//! Emitters leave rendering artifacts behind: trailing spaces, runs of
//! blank lines where a disabled branch produced nothing, and bare `//`
//! section markers. [`clean`] turns all of that into tidy source text.

/// Normalize generated source text
///
/// Strips trailing whitespace per line, rewrites bare `//` marker lines to
/// empty separators, collapses consecutive blank lines, drops leading and
/// trailing blank lines and ends the text with exactly one newline.
/// Idempotent: a second pass returns its input unchanged.
pub fn clean(text: &str) -> String {
    let mut cleaned: Vec<String> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_end();
        let normalized = if trimmed == "//" { "" } else { trimmed };
        if normalized.is_empty() {
            if cleaned.last().is_some_and(|last| last.is_empty()) {
                continue;
            }
            cleaned.push(String::new());
        } else {
            cleaned.push(normalized.to_string());
        }
    }

    while cleaned.first().is_some_and(|first| first.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|last| last.is_empty()) {
        cleaned.pop();
    }

    let mut result = cleaned.join("\n");
    result.push('\n');
    result
}
