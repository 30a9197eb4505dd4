//! The built-in tool catalog.
//!
//! A static registry of core tool definitions, grouped into a closed ordered
//! set of sections. Built-in profile allow lists are derived from the catalog
//! at construction time. The catalog is an immutable value passed explicitly
//! into resolvers; there is no hidden global.

use std::collections::{HashMap, HashSet};

use openclaw_types::{PromptListingMode, ToolProfile};

use crate::normalize::normalize_tool_name;

/// A catalog section. Sections double as tool groups (`group:<id>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSection {
    pub id: &'static str,
    pub label: &'static str,
}

/// A built-in tool definition.
#[derive(Debug, Clone, Copy)]
pub struct CatalogTool {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub section: &'static str,
    /// Built-in profiles this tool belongs to. `Full` is implicit.
    pub profiles: &'static [ToolProfile],
    /// Whether the tool is part of the curated `group:openclaw` set.
    pub openclaw_group: bool,
}

const SECTIONS: &[ToolSection] = &[
    ToolSection { id: "fs", label: "Files" },
    ToolSection { id: "runtime", label: "Runtime" },
    ToolSection { id: "web", label: "Web" },
    ToolSection { id: "memory", label: "Memory" },
    ToolSection { id: "sessions", label: "Sessions" },
    ToolSection { id: "ui", label: "UI" },
    ToolSection { id: "messaging", label: "Messaging" },
    ToolSection { id: "automation", label: "Automation" },
    ToolSection { id: "nodes", label: "Nodes" },
    ToolSection { id: "agents", label: "Agents" },
    ToolSection { id: "media", label: "Media" },
];

use ToolProfile::{Coding, Messaging, Minimal};

const TOOLS: &[CatalogTool] = &[
    CatalogTool {
        id: "read",
        label: "Read",
        description: "Read a file from the workspace.",
        section: "fs",
        profiles: &[Coding],
        openclaw_group: true,
    },
    CatalogTool {
        id: "write",
        label: "Write",
        description: "Create or overwrite a file in the workspace.",
        section: "fs",
        profiles: &[Coding],
        openclaw_group: true,
    },
    CatalogTool {
        id: "edit",
        label: "Edit",
        description: "Apply a targeted string replacement to a file.",
        section: "fs",
        profiles: &[Coding],
        openclaw_group: true,
    },
    CatalogTool {
        id: "apply_patch",
        label: "Apply Patch",
        description: "Apply a unified diff to the workspace.",
        section: "fs",
        profiles: &[Coding],
        openclaw_group: false,
    },
    CatalogTool {
        id: "exec",
        label: "Exec",
        description: "Run a shell command and capture its output.",
        section: "runtime",
        profiles: &[Coding],
        openclaw_group: true,
    },
    CatalogTool {
        id: "process",
        label: "Process",
        description: "Inspect and manage background processes.",
        section: "runtime",
        profiles: &[Coding],
        openclaw_group: false,
    },
    CatalogTool {
        id: "web_search",
        label: "Web Search",
        description: "Search the web for up-to-date information.",
        section: "web",
        profiles: &[],
        openclaw_group: true,
    },
    CatalogTool {
        id: "web_fetch",
        label: "Web Fetch",
        description: "Fetch a URL and extract its readable content.",
        section: "web",
        profiles: &[],
        openclaw_group: true,
    },
    CatalogTool {
        id: "memory_search",
        label: "Memory Search",
        description: "Search long-term memory for relevant entries.",
        section: "memory",
        profiles: &[Coding],
        openclaw_group: true,
    },
    CatalogTool {
        id: "memory_get",
        label: "Memory Get",
        description: "Read a memory file by path and line range.",
        section: "memory",
        profiles: &[Coding],
        openclaw_group: false,
    },
    CatalogTool {
        id: "sessions_list",
        label: "Sessions List",
        description: "List active sessions on this gateway.",
        section: "sessions",
        profiles: &[Coding, Messaging],
        openclaw_group: true,
    },
    CatalogTool {
        id: "sessions_history",
        label: "Sessions History",
        description: "Fetch message history for a session.",
        section: "sessions",
        profiles: &[Coding, Messaging],
        openclaw_group: false,
    },
    CatalogTool {
        id: "sessions_send",
        label: "Sessions Send",
        description: "Send a message into another session.",
        section: "sessions",
        profiles: &[Coding, Messaging],
        openclaw_group: false,
    },
    CatalogTool {
        id: "sessions_spawn",
        label: "Sessions Spawn",
        description: "Spawn a sub-agent session for a task.",
        section: "sessions",
        profiles: &[Coding],
        openclaw_group: false,
    },
    CatalogTool {
        id: "session_status",
        label: "Session Status",
        description: "Get status information about the current session.",
        section: "sessions",
        profiles: &[Minimal, Coding, Messaging],
        openclaw_group: true,
    },
    CatalogTool {
        id: "browser",
        label: "Browser",
        description: "Drive a headless browser session.",
        section: "ui",
        profiles: &[],
        openclaw_group: false,
    },
    CatalogTool {
        id: "canvas",
        label: "Canvas",
        description: "Render content onto the shared canvas surface.",
        section: "ui",
        profiles: &[],
        openclaw_group: false,
    },
    CatalogTool {
        id: "message",
        label: "Message",
        description: "Send a message to a user or channel.",
        section: "messaging",
        profiles: &[Messaging],
        openclaw_group: true,
    },
    CatalogTool {
        id: "cron",
        label: "Cron",
        description: "Manage scheduled jobs for this agent.",
        section: "automation",
        profiles: &[],
        openclaw_group: false,
    },
    CatalogTool {
        id: "gateway",
        label: "Gateway",
        description: "Inspect and patch the live gateway configuration.",
        section: "automation",
        profiles: &[],
        openclaw_group: false,
    },
    CatalogTool {
        id: "nodes",
        label: "Nodes",
        description: "List and control paired device nodes.",
        section: "nodes",
        profiles: &[],
        openclaw_group: false,
    },
    CatalogTool {
        id: "agents_list",
        label: "Agents List",
        description: "List agents configured on this gateway.",
        section: "agents",
        profiles: &[Messaging],
        openclaw_group: false,
    },
    CatalogTool {
        id: "image",
        label: "Image",
        description: "Generate or analyze an image.",
        section: "media",
        profiles: &[Coding],
        openclaw_group: true,
    },
    CatalogTool {
        id: "tts",
        label: "TTS",
        description: "Synthesize speech from text.",
        section: "media",
        profiles: &[],
        openclaw_group: false,
    },
];

/// A section together with the catalog tools populating it.
#[derive(Debug, Clone)]
pub struct SectionListing {
    pub section: ToolSection,
    pub tools: Vec<&'static CatalogTool>,
}

/// The immutable built-in tool catalog.
pub struct ToolCatalog {
    by_id: HashMap<&'static str, &'static CatalogTool>,
    section_ids: HashSet<&'static str>,
    /// Derived allow lists per built-in profile. `Full` has no entry.
    builtin_allow: HashMap<ToolProfile, Vec<String>>,
}

impl ToolCatalog {
    /// Build the catalog from the static tool table, deriving the built-in
    /// profile allow lists.
    pub fn builtin() -> Self {
        let mut by_id = HashMap::new();
        let mut builtin_allow: HashMap<ToolProfile, Vec<String>> = HashMap::new();
        for tool in TOOLS {
            by_id.insert(tool.id, tool);
            for profile in tool.profiles {
                builtin_allow.entry(*profile).or_default().push(tool.id.to_string());
            }
        }
        Self {
            by_id,
            section_ids: SECTIONS.iter().map(|s| s.id).collect(),
            builtin_allow,
        }
    }

    pub fn tools(&self) -> &'static [CatalogTool] {
        TOOLS
    }

    pub fn tool(&self, tool_id: &str) -> Option<&'static CatalogTool> {
        self.by_id.get(tool_id).copied()
    }

    pub fn is_known(&self, tool_id: &str) -> bool {
        self.by_id.contains_key(tool_id)
    }

    pub fn is_section(&self, section_id: &str) -> bool {
        self.section_ids.contains(section_id)
    }

    /// All catalog tool ids, in catalog order.
    pub fn core_tool_ids(&self) -> Vec<String> {
        TOOLS.iter().map(|t| t.id.to_string()).collect()
    }

    /// Built-in profile ids a tool belongs to. Empty for unknown tools.
    pub fn profiles_for(&self, tool_id: &str) -> HashSet<ToolProfile> {
        self.tool(tool_id)
            .map(|t| t.profiles.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The derived allow list for a built-in profile.
    ///
    /// Returns a fresh copy; `Full` yields `None` (no restriction).
    pub fn builtin_profile_allow(&self, profile: ToolProfile) -> Option<Vec<String>> {
        if profile == ToolProfile::Full {
            return None;
        }
        Some(self.builtin_allow.get(&profile).cloned().unwrap_or_default())
    }

    /// Member tool ids for a section group.
    pub fn section_group(&self, section_id: &str) -> Option<Vec<String>> {
        if !self.is_section(section_id) {
            return None;
        }
        Some(
            TOOLS
                .iter()
                .filter(|t| t.section == section_id)
                .map(|t| t.id.to_string())
                .collect(),
        )
    }

    /// Member tool ids for the curated `group:openclaw` set.
    pub fn openclaw_group(&self) -> Vec<String> {
        TOOLS
            .iter()
            .filter(|t| t.openclaw_group)
            .map(|t| t.id.to_string())
            .collect()
    }

    /// Expand a `group:<section>` or `group:openclaw` reference.
    pub fn group_expansion(&self, group_ref: &str) -> Option<Vec<String>> {
        let name = group_ref.strip_prefix("group:")?;
        if name == "openclaw" {
            return Some(self.openclaw_group());
        }
        self.section_group(name)
    }

    /// Ordered sections with their catalog tools. Empty sections are elided.
    pub fn list_sections(&self) -> Vec<SectionListing> {
        self.sections_with(&self.core_tool_ids())
    }

    /// Ordered sections restricted to the given tool ids, empty sections
    /// elided. Ids not in the catalog (plugin tools) are skipped.
    pub fn sections_with(&self, tool_ids: &[String]) -> Vec<SectionListing> {
        let wanted: HashSet<&str> = tool_ids.iter().map(|s| s.as_str()).collect();
        SECTIONS
            .iter()
            .filter_map(|section| {
                let tools: Vec<&'static CatalogTool> = TOOLS
                    .iter()
                    .filter(|t| t.section == section.id && wanted.contains(t.id))
                    .collect();
                if tools.is_empty() {
                    None
                } else {
                    Some(SectionListing { section: *section, tools })
                }
            })
            .collect()
    }

    /// Render the tool listing block for the agent system prompt.
    ///
    /// `Off` yields `None`; `Names` yields compact per-section name lists;
    /// `Full` yields labelled tools with descriptions.
    pub fn prompt_listing(&self, tool_names: &[String], mode: PromptListingMode) -> Option<String> {
        if mode == PromptListingMode::Off {
            return None;
        }
        let ids: Vec<String> = tool_names.iter().map(|n| normalize_tool_name(n)).collect();
        let sections = self.sections_with(&ids);
        if sections.is_empty() {
            return None;
        }

        let mut out = String::new();
        for listing in sections {
            match mode {
                PromptListingMode::Names => {
                    let names: Vec<&str> = listing.tools.iter().map(|t| t.id).collect();
                    out.push_str(&format!("{}: {}\n", listing.section.label, names.join(", ")));
                }
                PromptListingMode::Full => {
                    out.push_str(&format!("## {}\n", listing.section.label));
                    for tool in listing.tools {
                        out.push_str(&format!("- {} ({}): {}\n", tool.id, tool.label, tool.description));
                    }
                }
                PromptListingMode::Off => unreachable!(),
            }
        }
        Some(out)
    }
}
