//! Tool name normalization.
//!
//! Canonical tool names are lowercase snake_case. A small closed alias map
//! folds legacy spellings onto canonical ids.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Legacy tool name aliases.
static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("bash", "exec");
    m.insert("apply-patch", "apply_patch");
    m
});

/// Canonicalize a tool name: trim, lowercase, apply aliases.
///
/// May return an empty string for all-whitespace input; callers filter
/// empties rather than treating them as tool references. Idempotent.
pub fn normalize_tool_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    match ALIASES.get(lowered.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => lowered,
    }
}

/// Normalize a list of names, dropping entries that normalize to empty.
pub fn normalize_tool_list<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| normalize_tool_name(name.as_ref()))
        .filter(|name| !name.is_empty())
        .collect()
}
