//! Allow/deny policies: group expansion, the allowlist safety filter, and
//! the tool filter itself.
//!
//! Deny always takes priority over allow.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::ToolCatalog;
use crate::groups::{classify_entry, PolicyEntry, PolicyTool};
use crate::normalize::normalize_tool_name;

/// A single allow/deny policy.
///
/// An absent `allow` means "no allow restriction". An absent or empty `deny`
/// denies nothing. A policy with neither has no effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny: Option<Vec<String>>,
}

impl ToolPolicy {
    pub fn is_empty(&self) -> bool {
        self.allow.is_none() && self.deny.as_ref().is_none_or(|d| d.is_empty())
    }
}

/// Expand group references in a list of policy entries.
///
/// Known groups (section, openclaw, loaded plugin) are replaced by their
/// members in place; everything else passes through normalized. Order is
/// preserved and duplicates are removed.
pub fn expand_entries(
    catalog: &ToolCatalog,
    plugin_groups: &HashMap<String, Vec<String>>,
    entries: &[String],
) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for raw in entries {
        let entry = normalize_tool_name(raw);
        if entry.is_empty() {
            continue;
        }
        let members = if let Some(group) = catalog.group_expansion(&entry) {
            group
        } else if let Some(group) = plugin_groups.get(&entry) {
            group.clone()
        } else {
            vec![entry]
        };
        for member in members {
            if seen.insert(member.clone()) {
                out.push(member);
            }
        }
    }
    out
}

/// Expand both sides of a policy.
pub fn expand_policy(
    catalog: &ToolCatalog,
    plugin_groups: &HashMap<String, Vec<String>>,
    policy: &ToolPolicy,
) -> ToolPolicy {
    ToolPolicy {
        allow: policy
            .allow
            .as_ref()
            .map(|allow| expand_entries(catalog, plugin_groups, allow)),
        deny: policy
            .deny
            .as_ref()
            .map(|deny| expand_entries(catalog, plugin_groups, deny)),
    }
}

/// The outcome of reviewing an allowlist against the core surface.
#[derive(Debug, Clone)]
pub struct AllowlistReview {
    pub policy: ToolPolicy,
    /// Entries that are neither core tools, core groups, nor loaded plugin
    /// groups, in allowlist order.
    pub unknown_entries: Vec<String>,
    /// Whether the allowlist was dropped entirely.
    pub stripped: bool,
}

/// Guard against allowlists that would silently disarm the agent.
///
/// An allowlist that names no core tool and no core group can only ever
/// narrow the agent down to plugin tools, which may not be loaded yet. Such
/// an allowlist is dropped so all core tools stay available; `deny` is never
/// touched.
pub fn strip_plugin_only_allowlist(
    catalog: &ToolCatalog,
    plugin_groups: &HashMap<String, Vec<String>>,
    core_tool_names: &HashSet<String>,
    policy: &ToolPolicy,
) -> AllowlistReview {
    let Some(allow) = &policy.allow else {
        return AllowlistReview {
            policy: policy.clone(),
            unknown_entries: Vec::new(),
            stripped: false,
        };
    };

    let mut recognized_core_entry = false;
    let mut unknown_entries = Vec::new();
    for raw in allow {
        match classify_entry(catalog, plugin_groups, core_tool_names, raw) {
            PolicyEntry::Tool(_) | PolicyEntry::SectionGroup(_) | PolicyEntry::OpenclawGroup => {
                recognized_core_entry = true;
            }
            PolicyEntry::PluginGroup(_) => {}
            PolicyEntry::Unknown(entry) => unknown_entries.push(entry),
        }
    }

    let stripped = !allow.is_empty() && !recognized_core_entry;
    let policy = if stripped {
        ToolPolicy {
            allow: None,
            deny: policy.deny.clone(),
        }
    } else {
        policy.clone()
    };

    AllowlistReview {
        policy,
        unknown_entries,
        stripped,
    }
}

/// Apply a policy to a tool list.
///
/// A tool is retained iff its normalized name is in `allow` (when present)
/// and not in `deny`. Input order is preserved; the policy entries are
/// expected to be expanded already.
pub fn filter_tools_by_policy<T: PolicyTool>(tools: Vec<T>, policy: &ToolPolicy) -> Vec<T> {
    let allow: Option<HashSet<&str>> = policy
        .allow
        .as_ref()
        .map(|a| a.iter().map(|s| s.as_str()).collect());
    let deny: HashSet<&str> = policy
        .deny
        .as_ref()
        .map(|d| d.iter().map(|s| s.as_str()).collect())
        .unwrap_or_default();

    tools
        .into_iter()
        .filter(|tool| {
            let name = normalize_tool_name(tool.tool_name());
            let allowed = allow.as_ref().is_none_or(|a| a.contains(name.as_str()));
            allowed && !deny.contains(name.as_str())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestTool {
        name: &'static str,
        plugin: Option<&'static str>,
    }

    impl PolicyTool for TestTool {
        fn tool_name(&self) -> &str {
            self.name
        }

        fn plugin_id(&self) -> Option<&str> {
            self.plugin
        }
    }

    fn tool(name: &'static str) -> TestTool {
        TestTool { name, plugin: None }
    }

    fn names(tools: &[TestTool]) -> Vec<&'static str> {
        tools.iter().map(|t| t.name).collect()
    }

    fn core_names() -> HashSet<String> {
        ["read", "write", "exec", "message", "session_status"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_expand_preserves_order_and_dedupes() {
        let catalog = ToolCatalog::builtin();
        let entries = vec![
            "group:fs".to_string(),
            "read".to_string(),
            "bash".to_string(),
            "group:messaging".to_string(),
        ];
        let expanded = expand_entries(&catalog, &HashMap::new(), &entries);
        assert_eq!(
            expanded,
            vec!["read", "write", "edit", "apply_patch", "exec", "message"]
        );
    }

    #[test]
    fn test_expand_leaves_unknown_entries_in_place() {
        let catalog = ToolCatalog::builtin();
        let entries = vec!["group:wat".to_string(), "mystery".to_string()];
        let expanded = expand_entries(&catalog, &HashMap::new(), &entries);
        assert_eq!(expanded, vec!["group:wat", "mystery"]);
    }

    #[test]
    fn test_expand_plugin_group() {
        let catalog = ToolCatalog::builtin();
        let mut plugins = HashMap::new();
        plugins.insert(
            "group:plugin:websearch".to_string(),
            vec!["search_web".to_string(), "fetch_page".to_string()],
        );
        let entries = vec!["exec".to_string(), "group:plugin:websearch".to_string()];
        let expanded = expand_entries(&catalog, &plugins, &entries);
        assert_eq!(expanded, vec!["exec", "search_web", "fetch_page"]);
    }

    #[test]
    fn test_filter_allow_and_deny() {
        let tools = vec![tool("read"), tool("write"), tool("exec"), tool("message")];
        let policy = ToolPolicy {
            allow: Some(vec!["read".into(), "exec".into(), "message".into()]),
            deny: Some(vec!["exec".into()]),
        };
        let filtered = filter_tools_by_policy(tools, &policy);
        assert_eq!(names(&filtered), vec!["read", "message"]);
    }

    #[test]
    fn test_filter_absent_allow_is_unrestricted() {
        let tools = vec![tool("read"), tool("exec")];
        let policy = ToolPolicy {
            allow: None,
            deny: Some(vec!["exec".into()]),
        };
        let filtered = filter_tools_by_policy(tools, &policy);
        assert_eq!(names(&filtered), vec!["read"]);
    }

    #[test]
    fn test_filter_normalizes_tool_names() {
        let tools = vec![tool("Bash")];
        let policy = ToolPolicy {
            allow: Some(vec!["exec".into()]),
            deny: None,
        };
        let filtered = filter_tools_by_policy(tools, &policy);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_strip_keeps_allowlist_with_core_entry() {
        let catalog = ToolCatalog::builtin();
        let policy = ToolPolicy {
            allow: Some(vec!["read".into(), "wat".into()]),
            deny: None,
        };
        let review = strip_plugin_only_allowlist(&catalog, &HashMap::new(), &core_names(), &policy);
        assert!(!review.stripped);
        assert_eq!(review.unknown_entries, vec!["wat"]);
        assert_eq!(review.policy, policy);
    }

    #[test]
    fn test_strip_drops_plugin_only_allowlist() {
        let catalog = ToolCatalog::builtin();
        let mut plugins = HashMap::new();
        plugins.insert(
            "group:plugin:websearch".to_string(),
            vec!["search_web".to_string()],
        );
        let policy = ToolPolicy {
            allow: Some(vec!["group:plugin:websearch".into()]),
            deny: Some(vec!["exec".into()]),
        };
        let review = strip_plugin_only_allowlist(&catalog, &plugins, &core_names(), &policy);
        assert!(review.stripped);
        assert!(review.unknown_entries.is_empty());
        assert!(review.policy.allow.is_none());
        // Deny is never stripped
        assert_eq!(review.policy.deny, Some(vec!["exec".into()]));
    }

    #[test]
    fn test_strip_drops_all_unknown_allowlist() {
        let catalog = ToolCatalog::builtin();
        let policy = ToolPolicy {
            allow: Some(vec!["wat".into()]),
            deny: None,
        };
        let review = strip_plugin_only_allowlist(&catalog, &HashMap::new(), &core_names(), &policy);
        assert!(review.stripped);
        assert_eq!(review.unknown_entries, vec!["wat"]);
        assert!(review.policy.allow.is_none());
    }

    #[test]
    fn test_strip_ignores_absent_allow() {
        let catalog = ToolCatalog::builtin();
        let policy = ToolPolicy {
            allow: None,
            deny: Some(vec!["exec".into()]),
        };
        let review = strip_plugin_only_allowlist(&catalog, &HashMap::new(), &core_names(), &policy);
        assert!(!review.stripped);
        assert!(review.unknown_entries.is_empty());
    }

    #[test]
    fn test_openclaw_group_counts_as_core() {
        let catalog = ToolCatalog::builtin();
        let policy = ToolPolicy {
            allow: Some(vec!["group:openclaw".into()]),
            deny: None,
        };
        let review = strip_plugin_only_allowlist(&catalog, &HashMap::new(), &core_names(), &policy);
        assert!(!review.stripped);
    }
}
