//! Config defaults: fills in values the user left unset.

use crate::schema::HeraldConfig;

pub const DEFAULT_PREFIX: &str = "%";

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_LOG_DIR: &str = "logs";

pub const DEFAULT_CONSOLE_USERNAME: &str = "console";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: HeraldConfig) -> HeraldConfig {
    let config = apply_router_defaults(config);
    let config = apply_logging_defaults(config);
    apply_console_defaults(config)
}

fn apply_router_defaults(mut config: HeraldConfig) -> HeraldConfig {
    let router = &mut config.router;
    if router.prefixes.is_empty() {
        router.prefixes.push(DEFAULT_PREFIX.to_string());
    }
    router.mention_prefix.get_or_insert(true);
    router.ignore_bots.get_or_insert(true);
    router.ignore_direct_messages.get_or_insert(true);
    router.register_help.get_or_insert(true);
    config
}

fn apply_logging_defaults(mut config: HeraldConfig) -> HeraldConfig {
    let logging = &mut config.logging;
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.dir.is_none() {
        logging.dir = Some(DEFAULT_LOG_DIR.to_string());
    }
    logging.json.get_or_insert(false);
    config
}

/// The console fabricates a guild message from user 100 in channel 10 of guild 1.
fn apply_console_defaults(mut config: HeraldConfig) -> HeraldConfig {
    let console = &mut config.console;
    console.user_id.get_or_insert(100);
    console.channel_id.get_or_insert(10);
    console.guild_id.get_or_insert(1);
    console.bot_user_id.get_or_insert(1);
    if console.username.is_none() {
        console.username = Some(DEFAULT_CONSOLE_USERNAME.to_string());
    }
    config
}
