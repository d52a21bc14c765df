//! Placeholder substitution
//!
//! A placeholder is the literal text `{{ key }}`: two opening braces, exactly
//! one space, the key, exactly one space, two closing braces. Matching is
//! plain substring comparison; parameter values are copied into the output
//! and never scanned again, so a value containing `{{ other }}` or any regex
//! metacharacter comes out exactly as it went in.

use crate::config::is_key_char;
use crate::params::{ParameterKey, ParameterSet};

const OPEN: &str = "{{ ";
const CLOSE: &str = " }}";

/// Replace every placeholder of a configured key with that key's value
///
/// Placeholders naming keys outside `params` are left byte-for-byte intact.
///
/// # Example
///
/// ```rust
/// use mailsmith::{substitute, GeneratorConfig, ParameterSet};
///
/// let config = GeneratorConfig::default();
/// let params = ParameterSet::from_pairs(&config, [("header", "Team"), ("cta", "Go")]).unwrap();
/// let out = substitute("Hi {{ header }}, click {{ cta }} or ignore. {{ missing }}", &params);
/// assert_eq!(out, "Hi Team, click Go or ignore. {{ missing }}");
/// ```
pub fn substitute(template: &str, params: &ParameterSet) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find(OPEN) {
        let after_open = &rest[open + OPEN.len()..];
        match match_key(after_open, params) {
            Some((value, consumed)) => {
                out.push_str(&rest[..open]);
                out.push_str(value);
                rest = &after_open[consumed..];
            }
            None => {
                // Step past one brace only: "{{{ cta }}" still contains "{{ cta }}".
                out.push_str(&rest[..open + 1]);
                rest = &rest[open + 1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// List the configured keys a template references, in configuration order
pub fn placeholders<'a>(template: &str, params: &'a ParameterSet) -> Vec<&'a ParameterKey> {
    params
        .keys()
        .filter(|key| template.contains(&key.placeholder()))
        .collect()
}

/// If `text` starts with `key }}` for a configured key, return the key's value
/// and the number of bytes making up `key }}`.
///
/// Only key characters are read before the closing marker, so a miss costs
/// at most the length of the key-like run that follows the opening braces.
fn match_key<'p>(text: &str, params: &'p ParameterSet) -> Option<(&'p str, usize)> {
    let end = text
        .find(|c: char| !is_key_char(c))
        .unwrap_or(text.len());
    if !text[end..].starts_with(CLOSE) {
        return None;
    }
    params
        .get(&text[..end])
        .map(|value| (value, end + CLOSE.len()))
}
