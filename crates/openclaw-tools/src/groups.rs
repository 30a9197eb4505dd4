//! Plugin group computation and policy entry classification.
//!
//! Policy entries are parsed into tagged references once, so the safety
//! filter and the expander never repeat string prefix checks.

use std::collections::{HashMap, HashSet};

use crate::catalog::ToolCatalog;
use crate::normalize::normalize_tool_name;

/// Prefix for plugin tool groups, `group:plugin:<plugin_id>`.
pub const PLUGIN_GROUP_PREFIX: &str = "group:plugin:";

/// A tool as seen by the policy engine.
///
/// Implemented by whatever tool representation the runtime carries; the
/// engine only needs a name and the owning plugin, if any.
pub trait PolicyTool {
    fn tool_name(&self) -> &str;

    /// Plugin id for plugin-provided tools; `None` for core tools.
    fn plugin_id(&self) -> Option<&str> {
        None
    }
}

/// Group the currently loaded plugin tools by plugin id.
///
/// Keys are full `group:plugin:<id>` references; values are normalized tool
/// names. Core tools contribute nothing.
pub fn plugin_groups<T: PolicyTool>(tools: &[T]) -> HashMap<String, Vec<String>> {
    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    for tool in tools {
        if let Some(plugin_id) = tool.plugin_id() {
            groups
                .entry(format!("{PLUGIN_GROUP_PREFIX}{plugin_id}"))
                .or_default()
                .push(normalize_tool_name(tool.tool_name()));
        }
    }
    groups
}

/// A policy entry classified against the core tool set, the catalog groups,
/// and the currently loaded plugin groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyEntry {
    /// A core tool id.
    Tool(String),
    /// A `group:<section>` reference.
    SectionGroup(String),
    /// The curated `group:openclaw` reference.
    OpenclawGroup,
    /// A `group:plugin:<id>` reference with that plugin loaded.
    PluginGroup(String),
    /// Anything else, kept verbatim (normalized).
    Unknown(String),
}

/// Classify a raw policy entry.
///
/// `core_tool_names` is the set of normalized names of the non-plugin tools
/// in the current tool list. Plugin tool names and unloaded plugin groups
/// classify as `Unknown`: they are unknown to the core surface even when the
/// tool itself is present.
pub fn classify_entry(
    catalog: &ToolCatalog,
    plugin_groups: &HashMap<String, Vec<String>>,
    core_tool_names: &HashSet<String>,
    raw: &str,
) -> PolicyEntry {
    let entry = normalize_tool_name(raw);
    if let Some(group_name) = entry.strip_prefix("group:") {
        if group_name == "openclaw" {
            return PolicyEntry::OpenclawGroup;
        }
        if let Some(plugin_id) = entry.strip_prefix(PLUGIN_GROUP_PREFIX) {
            if plugin_groups.contains_key(&entry) {
                return PolicyEntry::PluginGroup(plugin_id.to_string());
            }
            return PolicyEntry::Unknown(entry);
        }
        if catalog.is_section(group_name) {
            return PolicyEntry::SectionGroup(group_name.to_string());
        }
        return PolicyEntry::Unknown(entry);
    }
    if core_tool_names.contains(&entry) {
        return PolicyEntry::Tool(entry);
    }
    PolicyEntry::Unknown(entry)
}
