use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ──────────────────── Tool Policy Types ────────────────────

/// Pre-defined tool profiles.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ToolProfile {
    /// Only `session_status`.
    Minimal,
    /// File system, runtime, sessions, memory, image.
    Coding,
    /// Messaging and limited session tools.
    Messaging,
    /// All tools allowed (default).
    #[default]
    Full,
}

impl ToolProfile {
    /// Look up a built-in profile by its config name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "minimal" => Some(ToolProfile::Minimal),
            "coding" => Some(ToolProfile::Coding),
            "messaging" => Some(ToolProfile::Messaging),
            "full" => Some(ToolProfile::Full),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolProfile::Minimal => "minimal",
            ToolProfile::Coding => "coding",
            ToolProfile::Messaging => "messaging",
            ToolProfile::Full => "full",
        }
    }
}

/// Per-provider tool policy override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderToolsConfig {
    /// Profile override for this provider (built-in or named).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

/// Tool policy configuration, used both globally and per agent.
///
/// Entries in `allow`/`deny` may be tool names or `group:<name>` references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Base profile (built-in or named). Absent means no profile restriction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Allow list. Empty means no allow restriction.
    #[serde(default)]
    pub allow: Vec<String>,
    /// Tools to deny (takes priority over everything).
    #[serde(default)]
    pub deny: Vec<String>,
    /// Per-provider overrides.
    #[serde(default)]
    pub by_provider: HashMap<String, ProviderToolsConfig>,
}

/// A user-defined tool profile.
///
/// Named profiles may extend another named profile or a built-in one;
/// the `extends` chain is bounded during resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedProfileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

// ──────────────────── Session Override Types ────────────────────

/// How the tool listing is rendered into the agent system prompt.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptListingMode {
    /// Section headers with labelled, described tools.
    #[default]
    Full,
    /// Compact per-section name lists.
    Names,
    /// No listing at all.
    Off,
}

/// Per-session tool overrides, persisted as JSON.
///
/// All fields are optional; absent and `null` are equivalent. Fields this
/// version does not know about are preserved on write-through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_profile_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_allow_override: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_deny_override: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_prompt_listing_override: Option<PromptListingMode>,
    /// Unknown fields, carried through serialization untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionOverrides {
    /// Whether any of the four tool override fields is set.
    pub fn has_tool_overrides(&self) -> bool {
        self.tools_profile_override.is_some()
            || self.tools_allow_override.is_some()
            || self.tools_deny_override.is_some()
            || self.tools_prompt_listing_override.is_some()
    }

    /// Clear all four tool override fields. Unknown fields are kept.
    pub fn clear_tool_overrides(&mut self) {
        self.tools_profile_override = None;
        self.tools_allow_override = None;
        self.tools_deny_override = None;
        self.tools_prompt_listing_override = None;
    }
}
