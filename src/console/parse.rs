//! Extraction of the project file path from raw console output.
//!
//! The console echoes command results behind an `out():` marker, surrounded
//! by arbitrary banner noise. Rather than a full grammar for the reply
//! format, a two-tier scan is used: locate the marker, then look for the
//! project file extension as a value terminator, falling back to trimming
//! the whole remainder when the terminator is absent.

/// Marker token that prefixes command results in console replies.
const OUTPUT_MARKER: &str = "out():";

/// The project file's required extension, used as the value terminator.
const PROJECT_EXTENSION: &str = ".fspro";

/// Extracts the project file path from an unstructured console reply.
///
/// Returns `None` when the reply is empty or the output marker is missing.
/// When the marker is present but the `.fspro` terminator is not, the
/// remainder after the marker is trimmed and returned as a lower-confidence
/// result.
pub fn extract_project_path(raw_response: &str) -> Option<String> {
    if raw_response.is_empty() {
        return None;
    }

    let marker_index = find_ignore_ascii_case(raw_response, OUTPUT_MARKER)?;
    let remainder = &raw_response[marker_index + OUTPUT_MARKER.len()..];

    let candidate = match find_ignore_ascii_case(remainder, PROJECT_EXTENSION) {
        Some(ext_index) => &remainder[..ext_index + PROJECT_EXTENSION.len()],
        None => {
            log::warn!(
                "Found '{}' but no '{}' terminator; falling back to trimmed remainder",
                OUTPUT_MARKER,
                PROJECT_EXTENSION
            );
            remainder
        }
    };

    let path = candidate
        .trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .to_string();

    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

/// ASCII-case-insensitive substring search. Both tokens searched for are
/// pure ASCII, so a byte-wise scan cannot split a UTF-8 sequence.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    h.windows(n.len()).position(|w| w.eq_ignore_ascii_case(n))
}
