//! Post-generation cleanup and analysis
//!
//! [`normalize`] removes wrapping that providers add around the real output.
//! [`analyze`] runs independent heuristics over the finished text and
//! returns zero or more hints. Neither can fail.

mod checks;
mod normalize;


pub use normalize::normalize;

use crate::request::ContentKind;

/// A non-fatal observation about generated output
pub type Hint = String;

type Check = fn(&str) -> Option<Hint>;

const COMPONENT_CHECKS: &[Check] = &[
    checks::images_without_alt,
    checks::unlabeled_inputs,
    checks::unnamed_interactive_elements,
    checks::low_contrast_pairs,
];

const HEADLINE_CHECKS: &[Check] = &[checks::multiline_headline, checks::long_headline];

const NARRATION_CHECKS: &[Check] = &[checks::markup_in_narration, checks::markdown_in_narration];

/// Run every check relevant to `kind`; each contributes at most one hint
pub fn analyze(kind: ContentKind, text: &str) -> Vec<Hint> {
    let checks = match kind {
        ContentKind::Component => COMPONENT_CHECKS,
        ContentKind::Headline => HEADLINE_CHECKS,
        ContentKind::Narration => NARRATION_CHECKS,
    };
    checks.iter().filter_map(|check| check(text)).collect()
}

/// Normalize raw output and analyze the result
pub fn finalize(kind: ContentKind, raw: &str) -> (String, Vec<Hint>) {
    let content = normalize(raw);
    let hints = analyze(kind, &content);
    (content, hints)
}
