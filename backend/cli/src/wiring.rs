//! Turns a prepared [`HeraldConfig`] into a ready [`Router`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use herald_commands::{
    ChannelCooldown, Cooldown, GuildCooldown, MentionPrefix, MultiplePrefixCheckers, PrefixCheck, Router,
    RouterConfig, StaticPrefix, UserCooldown,
};
use herald_config::{CooldownPreset, CooldownScopeKind, HeraldConfig};
use tracing::info;

/// Cooldown presets by name, built once so that commands naming the same
/// preset share one table.
pub type Presets = BTreeMap<String, Arc<dyn Cooldown>>;

pub fn build_presets(config: &HeraldConfig) -> Presets {
    config
        .cooldowns
        .iter()
        .map(|(name, preset)| (name.clone(), cooldown_from_preset(preset)))
        .collect()
}

pub fn cooldown_from_preset(preset: &CooldownPreset) -> Arc<dyn Cooldown> {
    let expires = Duration::from_secs(preset.usage_expires_secs);
    match preset.scope {
        CooldownScopeKind::User => Arc::new(UserCooldown::new(preset.max_runs, expires)),
        CooldownScopeKind::Channel => Arc::new(ChannelCooldown::new(preset.max_runs, expires)),
        CooldownScopeKind::Guild => Arc::new(GuildCooldown::new(preset.max_runs, expires)),
    }
}

/// Static prefixes in configured order, then the bot mention when enabled.
pub fn build_prefix_check(config: &HeraldConfig) -> Arc<dyn PrefixCheck> {
    let mut checks: Vec<Arc<dyn PrefixCheck>> = config
        .router
        .prefixes
        .iter()
        .map(|p| Arc::new(StaticPrefix::new(p.clone())) as Arc<dyn PrefixCheck>)
        .collect();
    if config.router.mention_prefix.unwrap_or(true) {
        checks.push(Arc::new(MentionPrefix));
    }
    match checks.len() {
        1 => checks.remove(0),
        _ => Arc::new(MultiplePrefixCheckers(checks)),
    }
}

pub fn build_router(config: &HeraldConfig, presets: &Presets) -> Result<Router> {
    let cooldown = match &config.global_cooldown {
        Some(name) => Some(
            presets
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("globalCooldown references unknown preset '{name}'"))?,
        ),
        None => None,
    };

    let router = Router::new(RouterConfig {
        prefix_check: Some(build_prefix_check(config)),
        cooldown,
        ignore_bots: config.router.ignore_bots.unwrap_or(true),
        ignore_direct_messages: config.router.ignore_direct_messages.unwrap_or(true),
        register_help: config.router.register_help.unwrap_or(true),
        ..RouterConfig::default()
    });

    info!(
        prefixes = ?config.router.prefixes,
        presets = presets.len(),
        global_cooldown = ?config.global_cooldown,
        "Router configured"
    );
    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_config::apply_all_defaults;

    fn preset(scope: CooldownScopeKind) -> CooldownPreset {
        CooldownPreset {
            scope,
            max_runs: 2,
            usage_expires_secs: 30,
        }
    }

    #[test]
    fn presets_keep_their_names() {
        let mut config = HeraldConfig::default();
        config.cooldowns.insert("ping".into(), preset(CooldownScopeKind::User));
        config.cooldowns.insert("slow".into(), preset(CooldownScopeKind::Guild));
        let presets = build_presets(&config);
        assert_eq!(presets.keys().collect::<Vec<_>>(), vec!["ping", "slow"]);
    }

    #[test]
    fn unknown_global_preset_is_an_error() {
        let mut config = apply_all_defaults(HeraldConfig::default());
        config.global_cooldown = Some("missing".into());
        let err = build_router(&config, &build_presets(&config)).err().unwrap();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn help_follows_config() {
        let mut config = apply_all_defaults(HeraldConfig::default());
        let router = build_router(&config, &Presets::new()).unwrap();
        assert!(router.get_command("help").is_some());

        config.router.register_help = Some(false);
        let router = build_router(&config, &Presets::new()).unwrap();
        assert!(router.get_command("help").is_none());
    }
}
