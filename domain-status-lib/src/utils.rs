//! Utility functions for domain list handling and logging.

use crate::error::DomainApiError;
use std::path::Path;

/// Longest response body written to trace logs.
const MAX_LOG_BODY: usize = 2048;

/// Trim inputs and drop blank entries, keeping order and duplicates.
///
/// No syntax validation happens here; the server rejects malformed names.
pub fn normalize_domains<I, S>(inputs: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    inputs
        .into_iter()
        .map(|d| d.as_ref().trim().to_string())
        .filter(|d| !d.is_empty())
        .collect()
}

/// Parse a domain list: one per line, `#` starts a comment, blank lines skipped.
pub fn parse_domain_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| line.split('#').next())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Read a domain list file (see [`parse_domain_lines`]).
///
/// # Errors
///
/// Returns `DomainApiError::File` if the file cannot be read or lists no domains.
pub fn read_domains_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, DomainApiError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        DomainApiError::file_error(path.to_string_lossy(), format!("failed to read: {}", e))
    })?;

    let domains = parse_domain_lines(&content);
    if domains.is_empty() {
        return Err(DomainApiError::file_error(
            path.to_string_lossy(),
            "no domains found in file",
        ));
    }

    Ok(domains)
}

/// Cut long bodies down for logging, on a char boundary.
pub(crate) fn truncate_for_log(text: &str) -> String {
    if text.len() <= MAX_LOG_BODY {
        return text.to_string();
    }

    let mut end = MAX_LOG_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes total)", &text[..end], text.len())
}
