use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static TRAILING_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+$").unwrap());

/// True when the line holds nothing but its terminator.
pub fn is_blank(line: &[u8]) -> bool {
    line_body(line).is_empty()
}

/// The line without its trailing `\n` or `\r\n`.
pub fn line_body(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// `out` followed by the canonical extension, e.g. `out.rb`.
pub fn default_output_name(extension: &str) -> PathBuf {
    PathBuf::from(format!("out{extension}"))
}

/// Returns `path` if free, otherwise the first `<stem><n><ext>` sibling
/// that does not exist. Trailing digits already in the stem are replaced.
pub fn unique_output_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = TRAILING_DIGITS.replace(&stem, "").into_owned();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut n: u32 = 1;
    loop {
        let candidate = path.with_file_name(format!("{stem}{n}{extension}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
