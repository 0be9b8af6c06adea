use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_OPEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(`{3,}|~{3,})[ \t]*[A-Za-z0-9_+.#\-]*[ \t]*$").expect("valid fence regex")
});

/// Remove code-fence wrappers around the whole output.
///
/// A wrapper is removed only when the first line opens a fence and the last
/// line closes it with the same marker, ignoring surrounding whitespace.
/// Nested wrappers are removed until none is left and the unwrapped body is
/// trimmed. Input without a wrapper is returned unchanged, so applying this
/// twice changes nothing.
pub fn normalize(raw: &str) -> String {
    let Some(mut text) = unwrap_fence(raw.trim()) else {
        return raw.to_string();
    };
    text = text.trim();
    while let Some(inner) = unwrap_fence(text) {
        text = inner.trim();
    }
    text.to_string()
}

fn unwrap_fence(text: &str) -> Option<&str> {
    let (first, rest) = text.split_once('\n')?;
    let (body, last) = match rest.rsplit_once('\n') {
        Some((body, last)) => (body, last),
        None => ("", rest),
    };

    let marker = FENCE_OPEN_RE.captures(first.trim_end())?.get(1)?.as_str();
    if last.trim() != marker {
        return None;
    }
    Some(body)
}
