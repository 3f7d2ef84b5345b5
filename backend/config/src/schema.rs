//! herald configuration schema (camelCase YAML).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeraldConfig {
    #[serde(default)]
    pub router: RouterSettings,

    /// Named cooldown presets that commands can reference.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cooldowns: BTreeMap<String, CooldownPreset>,

    /// Preset applied router-wide, by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_cooldown: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub console: ConsoleConfig,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterSettings {
    /// Static prefixes, tried in order.
    #[serde(default)]
    pub prefixes: Vec<String>,

    /// Also accept a mention of the bot as prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mention_prefix: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_bots: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_direct_messages: Option<bool>,

    /// Register the built-in `help` command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register_help: Option<bool>,
}

// ---------------------------------------------------------------------------
// Cooldowns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CooldownScopeKind {
    User,
    Channel,
    Guild,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownPreset {
    pub scope: CooldownScopeKind,
    /// Usages allowed before the scope is rejected.
    pub max_runs: u32,
    /// Lifetime of each usage, in seconds.
    pub usage_expires_secs: u64,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Directory for the rolling NDJSON log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Emit JSON on the console as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// Identity the interactive console uses for the messages it fabricates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_user_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
router:
  prefixes: ["%", "!"]
  mentionPrefix: false
cooldowns:
  tag:
    scope: user
    maxRuns: 2
    usageExpiresSecs: 60
globalCooldown: tag
logging:
  level: debug
"#;
        let cfg: HeraldConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.router.prefixes, vec!["%", "!"]);
        assert_eq!(cfg.router.mention_prefix, Some(false));
        let tag = &cfg.cooldowns["tag"];
        assert_eq!(tag.scope, CooldownScopeKind::User);
        assert_eq!(tag.max_runs, 2);
        assert_eq!(cfg.global_cooldown.as_deref(), Some("tag"));
        assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn empty_document_is_default() {
        let cfg: HeraldConfig = serde_yaml::from_str("{}").unwrap();
        assert!(cfg.router.prefixes.is_empty());
        assert!(cfg.cooldowns.is_empty());
    }
}
