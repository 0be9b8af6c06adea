//! Individual output heuristics

use super::Hint;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

const MAX_HEADLINE_CHARS: usize = 90;
const MIN_SHADE_DISTANCE: i32 = 400;

static IMG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<img\b([^>]*)>").expect("valid img regex"));
static ALT_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|\s)alt\s*=").expect("valid alt regex"));

static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(input|select|textarea)\b([^>]*)>").expect("valid field regex")
});
static LABEL_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<label\b[^>]*>.*?</label>").expect("valid label regex"));
static LABEL_FOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)(?:for|htmlFor)\s*=\s*["']([^"']+)["']"#).expect("valid for regex")
});
static ID_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(?:^|\s)id\s*=\s*["']([^"']+)["']"#).expect("valid id regex"));
static TYPE_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)type\s*=\s*["']?([a-z]+)"#).expect("valid type regex")
});
static ARIA_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\s)(?:aria-label|aria-labelledby|title)\s*=").expect("valid aria regex")
});

static INTERACTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(button|a)\b([^>]*)>(.*?)</(?:button|a)\s*>").expect("valid button regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static NON_EMPTY_ALT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)alt\s*=\s*["'][^"'\s][^"']*["']"#).expect("valid alt text regex")
});

static CLASS_LIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)(?:class|className)\s*=\s*["']([^"']*)["']"#)
        .expect("valid class regex")
});

static MARKUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(?:\s[^>]*)?/?>").expect("valid markup regex"));
static MARKDOWN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s{0,3}(?:#{1,6}\s|[-*+]\s|\d+\.\s|>\s)|\*\*|__|`|\[[^\]]+\]\([^)]+\)")
        .expect("valid markdown regex")
});

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("1 {}", one)
    } else {
        format!("{} {}", count, many)
    }
}

pub(super) fn images_without_alt(text: &str) -> Option<Hint> {
    let missing = IMG_RE
        .captures_iter(text)
        .filter(|caps| !ALT_ATTR_RE.is_match(&caps[1]))
        .count();
    (missing > 0).then(|| {
        format!(
            "{} missing alternative text; add an alt attribute describing the image, or alt=\"\" if decorative",
            plural(missing, "image is", "images are")
        )
    })
}

pub(super) fn unlabeled_inputs(text: &str) -> Option<Hint> {
    let label_spans: Vec<Range<usize>> = LABEL_BLOCK_RE.find_iter(text).map(|m| m.range()).collect();
    let labelled_ids: Vec<&str> = LABEL_FOR_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    let unlabeled = FIELD_RE
        .captures_iter(text)
        .filter(|caps| {
            let (Some(whole), Some(tag), Some(attrs)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                return false;
            };
            let attrs = attrs.as_str();

            if tag.as_str().eq_ignore_ascii_case("input") {
                let kind = TYPE_ATTR_RE
                    .captures(attrs)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_ascii_lowercase());
                if matches!(
                    kind.as_deref(),
                    Some("hidden" | "submit" | "button" | "reset" | "image")
                ) {
                    return false;
                }
            }
            if ARIA_NAME_RE.is_match(attrs) {
                return false;
            }
            if label_spans.iter().any(|span| span.contains(&whole.start())) {
                return false;
            }
            let id = ID_ATTR_RE.captures(attrs).and_then(|c| c.get(1)).map(|m| m.as_str());
            !id.is_some_and(|id| labelled_ids.contains(&id))
        })
        .count();

    (unlabeled > 0).then(|| {
        format!(
            "{} without an associated label; wrap in <label>, point a label's for at its id, or add aria-label",
            plural(unlabeled, "form field", "form fields")
        )
    })
}

pub(super) fn unnamed_interactive_elements(text: &str) -> Option<Hint> {
    let unnamed = INTERACTIVE_RE
        .captures_iter(text)
        .filter(|caps| {
            let attrs = caps.get(2).map_or("", |m| m.as_str());
            let inner = caps.get(3).map_or("", |m| m.as_str());
            if ARIA_NAME_RE.is_match(attrs) || NON_EMPTY_ALT_RE.is_match(inner) {
                return false;
            }
            TAG_RE.replace_all(inner, "").trim().is_empty()
        })
        .count();

    (unnamed > 0).then(|| {
        format!(
            "{} no accessible name; add visible text or aria-label",
            plural(unnamed, "button or link has", "buttons or links have")
        )
    })
}

/// Approximate lightness of a Tailwind colour token on the 50..950 scale
fn shade(token: &str) -> Option<i32> {
    match token {
        "white" => return Some(0),
        "black" => return Some(1000),
        _ => {}
    }
    let (_, number) = token.rsplit_once('-')?;
    number.parse().ok()
}

fn colour_of<'a>(class: &'a str, prefix: &str) -> Option<&'a str> {
    let token = class.strip_prefix(prefix)?;
    let token = token.split('/').next().unwrap_or(token);
    // text-sm, bg-opacity-50 and friends are not colours
    if token.starts_with("opacity") {
        return None;
    }
    shade(token).map(|_| token)
}

pub(super) fn low_contrast_pairs(text: &str) -> Option<Hint> {
    for caps in CLASS_LIST_RE.captures_iter(text) {
        let classes: Vec<&str> = caps[1]
            .split_whitespace()
            .filter(|class| !class.contains(':'))
            .collect();

        let foreground = classes.iter().find_map(|c| colour_of(c, "text-"));
        let background = classes.iter().find_map(|c| colour_of(c, "bg-"));

        if let (Some(fg), Some(bg)) = (foreground, background) {
            let (Some(fg_shade), Some(bg_shade)) = (shade(fg), shade(bg)) else {
                continue;
            };
            if (fg_shade - bg_shade).abs() < MIN_SHADE_DISTANCE {
                return Some(format!(
                    "possible low contrast: text-{} on bg-{}; pick shades further apart",
                    fg, bg
                ));
            }
        }
    }
    None
}

pub(super) fn multiline_headline(text: &str) -> Option<Hint> {
    let lines = text.lines().filter(|line| !line.trim().is_empty()).count();
    (lines > 1).then(|| format!("headline spans {} lines; expected a single line", lines))
}

pub(super) fn long_headline(text: &str) -> Option<Hint> {
    let chars = text.trim().chars().count();
    (chars > MAX_HEADLINE_CHARS).then(|| {
        format!(
            "headline is {} characters; aim for at most {}",
            chars, MAX_HEADLINE_CHARS
        )
    })
}

pub(super) fn markup_in_narration(text: &str) -> Option<Hint> {
    MARKUP_RE
        .is_match(text)
        .then(|| "narration contains markup tags that would be read aloud".to_string())
}

pub(super) fn markdown_in_narration(text: &str) -> Option<Hint> {
    MARKDOWN_RE
        .is_match(text)
        .then(|| "narration contains markdown formatting that would be read aloud".to_string())
}
