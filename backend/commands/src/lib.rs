pub mod arguments;
pub mod category;
pub mod command;
pub mod context;
pub mod cooldown;
pub mod group;
pub mod help;
pub mod permissions;
pub mod pipeline;
pub mod prefix;
pub mod router;
pub mod state;
pub mod tokenizer;
pub mod transformers;
pub mod value;

#[cfg(test)]
mod test_helpers;

pub use arguments::{ArgumentRule, ResolvedArgs, resolve_arguments};
pub use category::Category;
pub use command::{Command, CommandBuilder, CommandHandler, Middleware, PermissionValidator, RunnableCommand};
pub use context::Context;
pub use cooldown::{
    ChannelCooldown, Cooldown, CooldownScope, GuildCooldown, MultipleCooldowns, PerChannel, PerGuild, PerUser,
    ScopedCooldown, UserCooldown, format_duration, multiple_cooldowns,
};
pub use group::{CommandGroup, CommandGroupBuilder};
pub use help::default_help_command;
pub use permissions::{PermissionChecks, RequirePermissions, guild_only, owner_only, require_permissions};
pub use pipeline::{command_has_permission, run_command};
pub use prefix::{MentionPrefix, MultiplePrefixCheckers, NoPrefix, PrefixCheck, StaticPrefix};
pub use router::{CategoryGroup, CustomCommandsHandler, DispatchOutcome, ErrorHandler, Router, RouterConfig};
pub use state::{State, StateStore};
pub use tokenizer::{Token, Tokenizer};
pub use transformers::{Transformer, any_of};
pub use value::ArgValue;
