//! Assembly of the default policy pipeline from configuration.
//!
//! Seven steps in fixed order: global profile, provider profile, global
//! allow, provider allow, agent allow, agent provider allow, group allow.
//! Session overrides append after the seventh step and can only narrow.

use std::collections::HashMap;

use openclaw_types::{NamedProfileConfig, SessionOverrides, ToolsConfig};

use crate::catalog::ToolCatalog;
use crate::pipeline::{NamedProfileContext, PipelineStep};
use crate::policy::ToolPolicy;
use crate::profiles::{headline_tools, resolve_builtin_profile, resolve_named_profile};

/// The configuration sources feeding the default pipeline.
#[derive(Default)]
pub struct PipelineLayers<'a> {
    /// Global `[tools]` section.
    pub tools: Option<&'a ToolsConfig>,
    /// The invoked agent's `[agents.<id>.tools]` section.
    pub agent_tools: Option<&'a ToolsConfig>,
    pub agent_id: Option<&'a str>,
    /// Provider key for `by_provider` lookups.
    pub provider: Option<&'a str>,
    /// Group-chat allowlist, when the session runs in a group.
    pub group_allow: Option<&'a [String]>,
    /// User-defined profiles.
    pub named_profiles: Option<&'a HashMap<String, NamedProfileConfig>>,
}

/// Build the seven default pipeline steps.
///
/// Every step is present (absent configuration yields a null policy) so
/// diagnostics always name a stable step order. Also returns the named
/// profile context for diagnostics; when both the global and the provider
/// profile resolve through named profiles, the first in layer order (the
/// global one) supplies it.
pub fn default_pipeline_steps(
    catalog: &ToolCatalog,
    layers: &PipelineLayers,
) -> (Vec<PipelineStep>, Option<NamedProfileContext>) {
    let empty_profiles = HashMap::new();
    let named_profiles = layers.named_profiles.unwrap_or(&empty_profiles);
    let agent_id = layers.agent_id.unwrap_or("default");

    let provider_tools = layers
        .provider
        .and_then(|p| layers.tools.and_then(|t| t.by_provider.get(p)));
    let agent_provider_tools = layers
        .provider
        .and_then(|p| layers.agent_tools.and_then(|t| t.by_provider.get(p)));

    let mut named_context = None;
    let mut steps = Vec::with_capacity(7);

    // 1. Global profile
    let (label, policy, ctx) = profile_step(
        catalog,
        named_profiles,
        "tools.profile",
        layers.tools.and_then(|t| t.profile.as_deref()),
    );
    named_context = named_context.or(ctx);
    steps.push(PipelineStep::new(label, policy));

    // 2. Provider profile
    let (label, policy, ctx) = profile_step(
        catalog,
        named_profiles,
        "tools.byProvider.profile",
        provider_tools.and_then(|t| t.profile.as_deref()),
    );
    named_context = named_context.or(ctx);
    steps.push(PipelineStep::new(label, policy));

    // 3. Global allow/deny
    steps.push(PipelineStep::new(
        "tools.allow",
        layers.tools.and_then(|t| lists_policy(&t.allow, &t.deny)),
    ));

    // 4. Provider allow/deny
    steps.push(PipelineStep::new(
        "tools.byProvider.allow",
        provider_tools.and_then(|t| lists_policy(&t.allow, &t.deny)),
    ));

    // 5. Agent allow/deny
    steps.push(PipelineStep::new(
        format!("agents.{agent_id}.tools.allow"),
        layers.agent_tools.and_then(|t| lists_policy(&t.allow, &t.deny)),
    ));

    // 6. Agent provider allow/deny
    steps.push(PipelineStep::new(
        format!("agents.{agent_id}.tools.byProvider.allow"),
        agent_provider_tools.and_then(|t| lists_policy(&t.allow, &t.deny)),
    ));

    // 7. Group allow
    steps.push(PipelineStep::new(
        "group tools.allow",
        layers.group_allow.and_then(|allow| lists_policy(allow, &[])),
    ));

    (steps, named_context)
}

/// Build the full pipeline: the seven default steps with the session
/// override steps appended.
///
/// A single named profile context survives per run. The first named profile
/// in layer order wins: a context from the default layers takes precedence
/// over one from a session profile override. Callers combining
/// [`default_pipeline_steps`] and [`session_override_steps`] by hand should
/// apply the same rule.
pub fn pipeline_with_session_overrides(
    catalog: &ToolCatalog,
    layers: &PipelineLayers,
    overrides: Option<&SessionOverrides>,
) -> (Vec<PipelineStep>, Option<NamedProfileContext>) {
    let (mut steps, named_context) = default_pipeline_steps(catalog, layers);
    let Some(overrides) = overrides else {
        return (steps, named_context);
    };

    let empty_profiles = HashMap::new();
    let named_profiles = layers.named_profiles.unwrap_or(&empty_profiles);
    let (session_steps, session_context) =
        session_override_steps(catalog, named_profiles, overrides);
    steps.extend(session_steps);
    (steps, named_context.or(session_context))
}

/// Build the session override steps appended after the defaults.
///
/// The returned context comes from a named session profile override;
/// [`pipeline_with_session_overrides`] prefers the default layers' context
/// over it.
pub fn session_override_steps(
    catalog: &ToolCatalog,
    named_profiles: &HashMap<String, NamedProfileConfig>,
    overrides: &SessionOverrides,
) -> (Vec<PipelineStep>, Option<NamedProfileContext>) {
    let mut steps = Vec::new();
    let mut named_context = None;

    if overrides.tools_profile_override.is_some() {
        let (label, policy, ctx) = profile_step(
            catalog,
            named_profiles,
            "session tools.profile",
            overrides.tools_profile_override.as_deref(),
        );
        named_context = ctx;
        steps.push(PipelineStep::new(label, policy));
    }

    let allow = overrides.tools_allow_override.as_deref().unwrap_or(&[]);
    let deny = overrides.tools_deny_override.as_deref().unwrap_or(&[]);
    if let Some(policy) = lists_policy(allow, deny) {
        steps.push(PipelineStep::new("session tools.allow", Some(policy)));
    }

    (steps, named_context)
}

/// Resolve a profile reference into a pipeline step payload.
///
/// User-defined profiles shadow built-ins at the top level; unknown names
/// and `full` yield a null policy.
fn profile_step(
    catalog: &ToolCatalog,
    named_profiles: &HashMap<String, NamedProfileConfig>,
    base_label: &str,
    profile: Option<&str>,
) -> (String, Option<ToolPolicy>, Option<NamedProfileContext>) {
    let Some(name) = profile else {
        return (base_label.to_string(), None, None);
    };
    let label = format!("{base_label} ({name})");

    if let Some(config) = named_profiles.get(name) {
        let Some((policy, _trace)) = resolve_named_profile(catalog, name, named_profiles) else {
            return (label, None, None);
        };
        let context = NamedProfileContext {
            profile_name: name.to_string(),
            headline_tools: headline_tools(config),
        };
        return (label, Some(policy), Some(context));
    }

    let policy = resolve_builtin_profile(catalog, name);
    if policy.is_none() {
        tracing::debug!(profile = %name, "unknown or unrestricted tool profile");
    }
    (label, policy, None)
}

fn lists_policy(allow: &[String], deny: &[String]) -> Option<ToolPolicy> {
    let allow = (!allow.is_empty()).then(|| allow.to_vec());
    let deny = (!deny.is_empty()).then(|| deny.to_vec());
    if allow.is_none() && deny.is_none() {
        return None;
    }
    Some(ToolPolicy { allow, deny })
}

#[cfg(test)]
mod tests {
    use super::*;
    use openclaw_types::ProviderToolsConfig;

    use crate::groups::PolicyTool;
    use crate::pipeline::run_policy_pipeline;

    #[derive(Debug, Clone, PartialEq)]
    struct TestTool(&'static str);

    impl PolicyTool for TestTool {
        fn tool_name(&self) -> &str {
            self.0
        }
    }

    fn catalog_tools(catalog: &ToolCatalog) -> Vec<TestTool> {
        catalog
            .tools()
            .iter()
            .map(|t| TestTool(t.id))
            .collect()
    }

    #[test]
    fn test_step_labels_and_order() {
        let catalog = ToolCatalog::builtin();
        let tools = ToolsConfig {
            profile: Some("coding".into()),
            allow: vec!["group:fs".into()],
            ..Default::default()
        };
        let layers = PipelineLayers {
            tools: Some(&tools),
            agent_id: Some("helper"),
            ..Default::default()
        };
        let (steps, ctx) = default_pipeline_steps(&catalog, &layers);
        assert!(ctx.is_none());

        let labels: Vec<&str> = steps.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "tools.profile (coding)",
                "tools.byProvider.profile",
                "tools.allow",
                "tools.byProvider.allow",
                "agents.helper.tools.allow",
                "agents.helper.tools.byProvider.allow",
                "group tools.allow",
            ]
        );
        assert!(steps.iter().all(|s| s.strip_plugin_only_allowlist));
        assert!(steps[0].policy.is_some());
        assert!(steps[1].policy.is_none());
        assert!(steps[2].policy.is_some());
    }

    #[test]
    fn test_provider_scoped_layers() {
        let catalog = ToolCatalog::builtin();
        let mut tools = ToolsConfig::default();
        tools.by_provider.insert(
            "telegram".into(),
            ProviderToolsConfig {
                profile: Some("messaging".into()),
                deny: vec!["exec".into()],
                ..Default::default()
            },
        );
        let layers = PipelineLayers {
            tools: Some(&tools),
            provider: Some("telegram"),
            ..Default::default()
        };
        let (steps, _) = default_pipeline_steps(&catalog, &layers);
        assert_eq!(steps[1].label, "tools.byProvider.profile (messaging)");
        assert!(steps[1].policy.is_some());
        assert_eq!(
            steps[3].policy.as_ref().unwrap().deny,
            Some(vec!["exec".into()])
        );

        // Same config without a provider key contributes nothing
        let layers = PipelineLayers {
            tools: Some(&tools),
            ..Default::default()
        };
        let (steps, _) = default_pipeline_steps(&catalog, &layers);
        assert!(steps[1].policy.is_none());
        assert!(steps[3].policy.is_none());
    }

    #[test]
    fn test_full_profile_contributes_nothing() {
        let catalog = ToolCatalog::builtin();
        let tools = ToolsConfig {
            profile: Some("full".into()),
            ..Default::default()
        };
        let layers = PipelineLayers {
            tools: Some(&tools),
            ..Default::default()
        };
        let (steps, _) = default_pipeline_steps(&catalog, &layers);
        assert_eq!(steps[0].label, "tools.profile (full)");
        assert!(steps[0].policy.is_none());
    }

    #[test]
    fn test_named_profile_produces_context() {
        let catalog = ToolCatalog::builtin();
        let mut profiles = HashMap::new();
        profiles.insert(
            "marketing".to_string(),
            NamedProfileConfig {
                extends: None,
                allow: vec!["message".into(), "group:web".into()],
                deny: vec![],
            },
        );
        let tools = ToolsConfig {
            profile: Some("marketing".into()),
            ..Default::default()
        };
        let layers = PipelineLayers {
            tools: Some(&tools),
            named_profiles: Some(&profiles),
            ..Default::default()
        };
        let (steps, ctx) = default_pipeline_steps(&catalog, &layers);
        assert_eq!(steps[0].label, "tools.profile (marketing)");
        let ctx = ctx.unwrap();
        assert_eq!(ctx.profile_name, "marketing");
        assert_eq!(ctx.headline_tools, vec!["message"]);
    }

    #[test]
    fn test_first_named_profile_in_layer_order_supplies_context() {
        let catalog = ToolCatalog::builtin();
        let mut profiles = HashMap::new();
        profiles.insert(
            "marketing".to_string(),
            NamedProfileConfig {
                extends: None,
                allow: vec!["message".into()],
                deny: vec![],
            },
        );
        profiles.insert(
            "support".to_string(),
            NamedProfileConfig {
                extends: None,
                allow: vec!["session_status".into()],
                deny: vec![],
            },
        );
        let mut tools = ToolsConfig {
            profile: Some("marketing".into()),
            ..Default::default()
        };
        tools.by_provider.insert(
            "discord".into(),
            ProviderToolsConfig {
                profile: Some("support".into()),
                ..Default::default()
            },
        );
        let layers = PipelineLayers {
            tools: Some(&tools),
            provider: Some("discord"),
            named_profiles: Some(&profiles),
            ..Default::default()
        };
        let (steps, ctx) = default_pipeline_steps(&catalog, &layers);
        // Both profile steps carry policies, but the global layer's named
        // profile supplies the diagnostic context
        assert!(steps[0].policy.is_some());
        assert!(steps[1].policy.is_some());
        assert_eq!(ctx.unwrap().profile_name, "marketing");
    }

    #[test]
    fn test_combined_pipeline_prefers_default_layer_context() {
        let catalog = ToolCatalog::builtin();
        let mut profiles = HashMap::new();
        profiles.insert(
            "marketing".to_string(),
            NamedProfileConfig {
                extends: None,
                allow: vec!["message".into()],
                deny: vec![],
            },
        );
        profiles.insert(
            "support".to_string(),
            NamedProfileConfig {
                extends: None,
                allow: vec!["session_status".into()],
                deny: vec![],
            },
        );
        let tools = ToolsConfig {
            profile: Some("marketing".into()),
            ..Default::default()
        };
        let layers = PipelineLayers {
            tools: Some(&tools),
            named_profiles: Some(&profiles),
            ..Default::default()
        };
        let overrides = SessionOverrides {
            tools_profile_override: Some("support".into()),
            ..Default::default()
        };
        let (steps, ctx) = pipeline_with_session_overrides(&catalog, &layers, Some(&overrides));
        assert_eq!(steps.len(), 8);
        assert_eq!(steps[7].label, "session tools.profile (support)");
        assert_eq!(ctx.unwrap().profile_name, "marketing");
    }

    #[test]
    fn test_combined_pipeline_falls_back_to_session_context() {
        let catalog = ToolCatalog::builtin();
        let mut profiles = HashMap::new();
        profiles.insert(
            "support".to_string(),
            NamedProfileConfig {
                extends: None,
                allow: vec!["session_status".into()],
                deny: vec![],
            },
        );
        let layers = PipelineLayers {
            named_profiles: Some(&profiles),
            ..Default::default()
        };
        let overrides = SessionOverrides {
            tools_profile_override: Some("support".into()),
            tools_deny_override: Some(vec!["exec".into()]),
            ..Default::default()
        };
        let (steps, ctx) = pipeline_with_session_overrides(&catalog, &layers, Some(&overrides));
        assert_eq!(steps.len(), 9);
        assert_eq!(steps[7].label, "session tools.profile (support)");
        assert_eq!(steps[8].label, "session tools.allow");
        assert_eq!(ctx.unwrap().profile_name, "support");

        // Without overrides the defaults pass through unchanged
        let (steps, ctx) = pipeline_with_session_overrides(&catalog, &layers, None);
        assert_eq!(steps.len(), 7);
        assert!(ctx.is_none());
    }

    #[test]
    fn test_named_profile_shadows_builtin_at_top_level() {
        let catalog = ToolCatalog::builtin();
        let mut profiles = HashMap::new();
        profiles.insert(
            "coding".to_string(),
            NamedProfileConfig {
                extends: None,
                allow: vec!["read".into()],
                deny: vec![],
            },
        );
        let tools = ToolsConfig {
            profile: Some("coding".into()),
            ..Default::default()
        };
        let layers = PipelineLayers {
            tools: Some(&tools),
            named_profiles: Some(&profiles),
            ..Default::default()
        };
        let (steps, _) = default_pipeline_steps(&catalog, &layers);
        assert_eq!(
            steps[0].policy.as_ref().unwrap().allow,
            Some(vec!["read".into()])
        );
    }

    #[test]
    fn test_end_to_end_layering_narrows() {
        let catalog = ToolCatalog::builtin();
        let global = ToolsConfig {
            profile: Some("coding".into()),
            deny: vec!["exec".into()],
            ..Default::default()
        };
        let agent = ToolsConfig {
            allow: vec!["group:fs".into(), "group:runtime".into()],
            ..Default::default()
        };
        let group_allow = vec!["read".into(), "edit".into(), "message".into()];
        let layers = PipelineLayers {
            tools: Some(&global),
            agent_tools: Some(&agent),
            agent_id: Some("coder"),
            group_allow: Some(&group_allow),
            ..Default::default()
        };
        let (steps, ctx) = default_pipeline_steps(&catalog, &layers);

        let mut warnings = Vec::new();
        let out = run_policy_pipeline(
            &catalog,
            catalog_tools(&catalog),
            &steps,
            ctx.as_ref(),
            &mut |msg| warnings.push(msg),
        );
        // coding profile minus exec, narrowed to fs/runtime, narrowed to the
        // group allowlist (message never survived the profile)
        let names: Vec<&str> = out.iter().map(|t| t.0).collect();
        assert_eq!(names, vec!["read", "edit"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_session_override_steps() {
        let catalog = ToolCatalog::builtin();
        let overrides = SessionOverrides {
            tools_profile_override: Some("minimal".into()),
            tools_deny_override: Some(vec!["exec".into()]),
            ..Default::default()
        };
        let (steps, ctx) = session_override_steps(&catalog, &HashMap::new(), &overrides);
        assert!(ctx.is_none());
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].label, "session tools.profile (minimal)");
        assert_eq!(steps[1].label, "session tools.allow");
        assert_eq!(
            steps[1].policy.as_ref().unwrap().deny,
            Some(vec!["exec".into()])
        );
    }

    #[test]
    fn test_session_override_steps_empty_record() {
        let catalog = ToolCatalog::builtin();
        let (steps, ctx) =
            session_override_steps(&catalog, &HashMap::new(), &SessionOverrides::default());
        assert!(steps.is_empty());
        assert!(ctx.is_none());
    }

    #[test]
    fn test_session_override_cannot_widen() {
        let catalog = ToolCatalog::builtin();
        let global = ToolsConfig {
            profile: Some("minimal".into()),
            ..Default::default()
        };
        let layers = PipelineLayers {
            tools: Some(&global),
            ..Default::default()
        };
        let (mut steps, _) = default_pipeline_steps(&catalog, &layers);

        let overrides = SessionOverrides {
            tools_allow_override: Some(vec!["session_status".into(), "exec".into()]),
            ..Default::default()
        };
        let (extra, _) = session_override_steps(&catalog, &HashMap::new(), &overrides);
        steps.extend(extra);

        let mut warnings = Vec::new();
        let out = run_policy_pipeline(
            &catalog,
            catalog_tools(&catalog),
            &steps,
            None,
            &mut |msg| warnings.push(msg),
        );
        let names: Vec<&str> = out.iter().map(|t| t.0).collect();
        assert_eq!(names, vec!["session_status"]);
    }
}
