//! Built-in and named profile resolution.
//!
//! Built-in profiles derive their allow lists from the catalog. Named
//! profiles come from user configuration and may chain via `extends`;
//! resolution is bounded by depth and breaks cycles silently.

use std::collections::{HashMap, HashSet};

use openclaw_types::{NamedProfileConfig, ToolProfile};

use crate::catalog::ToolCatalog;
use crate::normalize::{normalize_tool_list, normalize_tool_name};
use crate::policy::ToolPolicy;

/// Maximum number of profiles visited along an `extends` chain.
pub const MAX_EXTENDS_DEPTH: usize = 5;

/// Resolve a built-in profile to a policy.
///
/// Returns a fresh copy of the catalog-derived allow list. `full` and
/// unknown names yield `None` (no restriction).
pub fn resolve_builtin_profile(catalog: &ToolCatalog, name: &str) -> Option<ToolPolicy> {
    let profile = ToolProfile::from_name(&normalize_tool_name(name))?;
    let allow = catalog.builtin_profile_allow(profile)?;
    Some(ToolPolicy {
        allow: Some(allow),
        deny: None,
    })
}

/// The chain a named profile resolution walked, plus the merged result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionTrace {
    /// Profile names visited, starting with the requested one.
    pub resolved_from: Vec<String>,
    pub effective_allow: Vec<String>,
    pub effective_deny: Vec<String>,
}

/// Resolve a named profile, walking its `extends` chain.
///
/// Allow and deny lists concatenate down the chain and deduplicate; deny
/// wins on overlap. The walk stops at a built-in parent (merging its derived
/// allow list), at a repeated profile, at an unknown parent, or at
/// [`MAX_EXTENDS_DEPTH`]. A profile that merges down to nothing yields
/// `None`.
pub fn resolve_named_profile(
    catalog: &ToolCatalog,
    name: &str,
    profiles: &HashMap<String, NamedProfileConfig>,
) -> Option<(ToolPolicy, ResolutionTrace)> {
    let mut current = profiles.get(name)?;
    let mut chain = vec![name.to_string()];
    let mut visited: HashSet<String> = chain.iter().cloned().collect();
    let mut all_allow: Vec<String> = Vec::new();
    let mut all_deny: Vec<String> = Vec::new();

    loop {
        all_allow.extend(normalize_tool_list(&current.allow));
        all_deny.extend(normalize_tool_list(&current.deny));

        let Some(parent) = current.extends.as_deref() else {
            break;
        };
        if visited.contains(parent) || chain.len() >= MAX_EXTENDS_DEPTH {
            break;
        }
        // A built-in parent terminates the chain, even when a named profile
        // shadows its name.
        if let Some(profile) = ToolProfile::from_name(&normalize_tool_name(parent)) {
            if let Some(allow) = catalog.builtin_profile_allow(profile) {
                all_allow.extend(allow);
            }
            break;
        }
        let Some(next) = profiles.get(parent) else {
            break;
        };
        chain.push(parent.to_string());
        visited.insert(parent.to_string());
        current = next;
    }

    let deny_set: HashSet<&str> = all_deny.iter().map(|s| s.as_str()).collect();
    let effective_allow = dedup(all_allow.iter().filter(|a| !deny_set.contains(a.as_str())));
    let effective_deny = dedup(all_deny.iter());

    if effective_allow.is_empty() && effective_deny.is_empty() {
        return None;
    }

    let policy = ToolPolicy {
        allow: (!effective_allow.is_empty()).then(|| effective_allow.clone()),
        deny: (!effective_deny.is_empty()).then(|| effective_deny.clone()),
    };
    let trace = ResolutionTrace {
        resolved_from: chain,
        effective_allow,
        effective_deny,
    };
    Some((policy, trace))
}

/// The tools a named profile advertises directly: its own allow entries that
/// are plain tool references, group references excluded.
pub fn headline_tools(profile: &NamedProfileConfig) -> Vec<String> {
    normalize_tool_list(&profile.allow)
        .into_iter()
        .filter(|entry| !entry.starts_with("group:"))
        .collect()
}

fn dedup<'a, I: Iterator<Item = &'a String>>(entries: I) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for entry in entries {
        if seen.insert(entry.as_str()) {
            out.push(entry.clone());
        }
    }
    out
}
