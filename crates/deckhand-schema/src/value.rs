//! String rewriting over arbitrarily nested descriptor values.
//!
//! Descriptors are plain [`serde_json::Value`] trees. Every rewrite consumes a
//! tree and returns a new one; object keys are never touched, only string
//! leaves (including strings nested in arrays at any depth).

use serde_json::Value;
use std::collections::BTreeMap;

/// Strings starting with this marker are treated as ARN-like references and
/// may have a token replaced in the middle of the string.
pub const REFERENCE_PREFIX: &str = "arn";

/// A set of literal replacements applied in a single pass.
pub type Substitutions = BTreeMap<String, String>;

/// Apply `f` to every string leaf, keeping the original string when `f`
/// returns `None`.
pub fn map_strings<F>(value: Value, f: &F) -> Value
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => match f(&s) {
            Some(replaced) => Value::String(replaced),
            None => Value::String(s),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(|v| map_strings(v, f)).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, map_strings(v, f)))
                .collect(),
        ),
        other => other,
    }
}

/// Replace one literal token throughout `value`.
pub fn substitute(value: Value, token: &str, replacement: &str) -> Value {
    let mut subs = Substitutions::new();
    subs.insert(token.to_owned(), replacement.to_owned());
    substitute_all(value, &subs)
}

/// Replace every key of `subs` with its value throughout `value` in one pass.
///
/// A string equal to a key is replaced whole. A string starting with
/// [`REFERENCE_PREFIX`] has each embedded key occurrence replaced, scanning
/// left to right and preferring the longest key at each position. Any other
/// string is left alone. Because the scan is single-pass, a replacement is
/// never itself re-substituted.
pub fn substitute_all(value: Value, subs: &Substitutions) -> Value {
    if subs.is_empty() {
        return value;
    }
    map_strings(value, &|s| substitute_str(s, subs))
}

/// The string-leaf rule of [`substitute_all`]; `None` means unchanged.
pub fn substitute_str(s: &str, subs: &Substitutions) -> Option<String> {
    if let Some(replaced) = subs.get(s) {
        return Some(replaced.clone());
    }
    if s.starts_with(REFERENCE_PREFIX) {
        return replace_embedded(s, subs);
    }
    None
}

fn replace_embedded(s: &str, subs: &Substitutions) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    let mut changed = false;

    while !rest.is_empty() {
        let longest = subs
            .iter()
            .filter(|(token, _)| !token.is_empty() && rest.starts_with(token.as_str()))
            .max_by_key(|(token, _)| token.len());
        if let Some((token, replacement)) = longest {
            out.push_str(replacement);
            rest = &rest[token.len()..];
            changed = true;
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }

    changed.then_some(out)
}
