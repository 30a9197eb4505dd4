//! The layered policy pipeline.
//!
//! An ordered sequence of steps, each narrowing the working tool set. Steps
//! may only subtract capability; a tool denied by any step never reappears.
//! Diagnostics go through the injected warn sink and never abort evaluation.

use std::collections::HashSet;

use crate::catalog::ToolCatalog;
use crate::groups::{plugin_groups, PolicyTool};
use crate::normalize::{normalize_tool_list, normalize_tool_name};
use crate::policy::{expand_policy, filter_tools_by_policy, strip_plugin_only_allowlist, ToolPolicy};

/// One step of the policy pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineStep {
    /// Diagnostic label naming the configuration source of this step.
    pub label: String,
    /// The policy to apply; `None` steps are skipped.
    pub policy: Option<ToolPolicy>,
    /// Whether to run the allowlist safety filter before applying.
    pub strip_plugin_only_allowlist: bool,
}

impl PipelineStep {
    pub fn new(label: impl Into<String>, policy: Option<ToolPolicy>) -> Self {
        Self {
            label: label.into(),
            policy,
            strip_plugin_only_allowlist: true,
        }
    }
}

/// Context describing the named profile that produced the pipeline, used for
/// post-filter diagnostics.
#[derive(Debug, Clone)]
pub struct NamedProfileContext {
    pub profile_name: String,
    /// Tools the profile advertises as its signature capabilities.
    pub headline_tools: Vec<String>,
}

/// Run the policy pipeline over a tool list.
///
/// Each step narrows the working set; the relative order of surviving tools
/// matches the input. Warnings (unknown allowlist entries, stripped
/// allowlists, degenerate post-filter outcomes) are emitted through `warn`.
pub fn run_policy_pipeline<T: PolicyTool>(
    catalog: &ToolCatalog,
    tools: Vec<T>,
    steps: &[PipelineStep],
    named_profile: Option<&NamedProfileContext>,
    warn: &mut dyn FnMut(String),
) -> Vec<T> {
    let core_tool_names: HashSet<String> = tools
        .iter()
        .filter(|t| t.plugin_id().is_none())
        .map(|t| normalize_tool_name(t.tool_name()))
        .collect();
    let plugin_groups = plugin_groups(&tools);

    let mut working = tools;
    for step in steps {
        let Some(policy) = &step.policy else {
            continue;
        };

        let policy = if step.strip_plugin_only_allowlist {
            let review =
                strip_plugin_only_allowlist(catalog, &plugin_groups, &core_tool_names, policy);
            if !review.unknown_entries.is_empty() {
                let remediation = if review.stripped {
                    "Ignoring allowlist."
                } else {
                    "They won't match any tools."
                };
                warn(format!(
                    "tools: {} allowlist contains unknown entries ({}). {}",
                    step.label,
                    review.unknown_entries.join(", "),
                    remediation
                ));
            } else if review.stripped {
                warn(format!(
                    "tools: {} allowlist only references plugin tools. Ignoring allowlist.",
                    step.label
                ));
            }
            review.policy
        } else {
            policy.clone()
        };

        let expanded = expand_policy(catalog, &plugin_groups, &policy);
        if expanded.is_empty() {
            continue;
        }

        let before = working.len();
        working = filter_tools_by_policy(working, &expanded);
        tracing::debug!(
            step = %step.label,
            before,
            after = working.len(),
            "applied tool policy step"
        );
    }

    if let Some(ctx) = named_profile {
        warn_degenerate_outcome(ctx, &working, warn);
    }

    working
}

fn warn_degenerate_outcome<T: PolicyTool>(
    ctx: &NamedProfileContext,
    working: &[T],
    warn: &mut dyn FnMut(String),
) {
    let names: Vec<String> = working
        .iter()
        .map(|t| normalize_tool_name(t.tool_name()))
        .collect();

    if names.is_empty() {
        warn(format!(
            "Named profile \"{}\" resulted in zero tools after policy filtering.",
            ctx.profile_name
        ));
        return;
    }
    if names.len() == 1 && names[0] == "session_status" {
        warn(format!(
            "Named profile \"{}\" resulted in only session_status after policy filtering.",
            ctx.profile_name
        ));
        return;
    }

    let headline = normalize_tool_list(&ctx.headline_tools);
    if headline.is_empty() {
        return;
    }
    let surviving: HashSet<&str> = names.iter().map(|s| s.as_str()).collect();
    if headline.iter().any(|h| surviving.contains(h.as_str())) {
        return;
    }
    warn(format!(
        "Named profile \"{}\" requested headline tools [{}], but none remain after filtering. Effective tools: {}.",
        ctx.profile_name,
        headline.join(", "),
        names.join(", ")
    ));
}
