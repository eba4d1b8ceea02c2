//! Locate a JSON value embedded in free-form model output
//!
//! Models wrap JSON in code fences, introduce it with prose, or append
//! commentary after it. Extraction only finds the substring; it never parses.

const FENCE: &str = "```";

/// Which container to look for during balanced scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Object,
    Array,
}

impl Container {
    fn open(self) -> u8 {
        match self {
            Container::Object => b'{',
            Container::Array => b'[',
        }
    }

    fn close(self) -> u8 {
        match self {
            Container::Object => b'}',
            Container::Array => b']',
        }
    }
}

/// Best-guess JSON substring of `text`, or `None` if nothing balanced exists
///
/// Priority: fenced code block whose content starts with `{` or `[`, then the
/// first balanced object, then the first balanced array.
pub fn extract_json(text: &str) -> Option<&str> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    find_fenced_block(text)
        .or_else(|| find_balanced(text, Container::Object))
        .or_else(|| find_balanced(text, Container::Array))
}

/// Inner content of the first fenced block, if it looks like JSON
///
/// The fence may carry a `json` annotation in any case. The content is
/// returned trimmed and only when it starts with `{` or `[`.
pub fn find_fenced_block(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let mut body_start = open + FENCE.len();

    if text
        .get(body_start..body_start + 4)
        .is_some_and(|tag| tag.eq_ignore_ascii_case("json"))
    {
        body_start += 4;
    }

    let body_len = text[body_start..].find(FENCE)?;
    let inner = text[body_start..body_start + body_len].trim();

    if inner.starts_with('{') || inner.starts_with('[') {
        Some(inner)
    } else {
        None
    }
}

/// Substring from the first balanced opener of `container` to its matching closer
///
/// Braces inside string literals are ignored; quote state and backslash
/// escapes are tracked so `{"note": "use a } here"}` is returned whole.
/// An opener that never closes (prose like `Replace {city`) is skipped and
/// the scan restarts at the next opener of the same kind.
/// Scanning is byte-wise, which is safe because every delimiter is ASCII and
/// never appears inside a multi-byte UTF-8 sequence.
pub fn find_balanced(text: &str, container: Container) -> Option<&str> {
    let open = container.open();
    let mut from = 0;

    while let Some(found) = text.bytes().skip(from).position(|b| b == open) {
        let start = from + found;
        if let Some(end) = balanced_end(text.as_bytes(), start, container) {
            return Some(&text[start..=end]);
        }
        from = start + 1;
    }

    None
}

/// Index of the closer matching the opener at `start`, if it closes
fn balanced_end(bytes: &[u8], start: usize, container: Container) -> Option<usize> {
    let (open, close) = (container.open(), container.close());
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        if byte == b'"' {
            in_string = true;
        } else if byte == open {
            depth += 1;
        } else if byte == close {
            depth -= 1;
            if depth == 0 {
                return Some(offset);
            }
        }
    }

    None
}
