//! Stock permission validators backed by the chat client's permission
//! lookups.

use async_trait::async_trait;
use herald_core::{Permissions, Snowflake};
use std::ops::BitOr;

use crate::command::PermissionValidator;
use crate::context::Context;

/// Which parties a [`RequirePermissions`] validator checks, and where.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionChecks(u8);

impl PermissionChecks {
    /// The invoking member's guild-wide permissions.
    pub const MEMBER_GUILD: Self = Self(1);
    /// The invoking member's permissions in the invoking channel.
    pub const MEMBER_CHANNEL: Self = Self(1 << 1);
    pub const BOT_GUILD: Self = Self(1 << 2);
    pub const BOT_CHANNEL: Self = Self(1 << 3);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PermissionChecks {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Requires `required` of the invoker and/or the bot.
///
/// The guild owner always passes the member checks. `ADMINISTRATOR` satisfies
/// any requirement. Direct messages are rejected outright.
#[derive(Debug, Clone)]
pub struct RequirePermissions {
    label: String,
    required: Permissions,
    checks: PermissionChecks,
}

pub fn require_permissions(
    label: impl Into<String>,
    required: Permissions,
    checks: PermissionChecks,
) -> RequirePermissions {
    let checks = if checks.is_empty() {
        PermissionChecks::MEMBER_GUILD
    } else {
        checks
    };
    RequirePermissions {
        label: label.into(),
        required,
        checks,
    }
}

impl RequirePermissions {
    async fn member_allowed(&self, ctx: &Context, guild_id: Snowflake, in_channel: bool) -> Result<bool, String> {
        let guild = ctx.client.get_guild(guild_id).await.map_err(|e| e.to_string())?;
        if guild.owner_id == ctx.message.author.id {
            return Ok(true);
        }
        let channel = in_channel.then_some(ctx.message.channel_id);
        let perms = ctx
            .client
            .member_permissions(guild_id, ctx.message.author.id, channel)
            .await
            .map_err(|e| e.to_string())?;
        Ok(perms.allows(self.required))
    }

    async fn bot_allowed(&self, ctx: &Context, guild_id: Snowflake, in_channel: bool) -> Result<bool, String> {
        let Some(bot) = ctx.bot_user.as_ref() else {
            return Ok(false);
        };
        let channel = in_channel.then_some(ctx.message.channel_id);
        let perms = ctx
            .client
            .member_permissions(guild_id, bot.id, channel)
            .await
            .map_err(|e| e.to_string())?;
        Ok(perms.allows(self.required))
    }
}

#[async_trait]
impl PermissionValidator for RequirePermissions {
    async fn validate(&self, ctx: &Context) -> Result<(), String> {
        let Some(guild_id) = ctx.message.guild_id else {
            return Err("This command can only be run in a guild.".into());
        };

        for (check, in_channel) in [
            (PermissionChecks::MEMBER_GUILD, false),
            (PermissionChecks::MEMBER_CHANNEL, true),
        ] {
            if self.checks.contains(check) && !self.member_allowed(ctx, guild_id, in_channel).await? {
                return Err(format!(
                    "You must have the \"{}\" permission to run this command.",
                    self.label
                ));
            }
        }

        for (check, in_channel) in [
            (PermissionChecks::BOT_GUILD, false),
            (PermissionChecks::BOT_CHANNEL, true),
        ] {
            if self.checks.contains(check) && !self.bot_allowed(ctx, guild_id, in_channel).await? {
                return Err(format!(
                    "The bot must have the \"{}\" permission to run this command.",
                    self.label
                ));
            }
        }

        Ok(())
    }
}

/// Rejects direct messages.
pub fn guild_only() -> impl PermissionValidator {
    |ctx: &Context| -> Result<(), String> {
        if ctx.message.is_direct_message() {
            Err("This command can only be run in a guild.".to_string())
        } else {
            Ok(())
        }
    }
}

/// Only the listed users may run the command.
pub fn owner_only(owners: Vec<Snowflake>) -> impl PermissionValidator {
    move |ctx: &Context| -> Result<(), String> {
        if owners.contains(&ctx.message.author.id) {
            Ok(())
        } else {
            Err("This command is restricted to the bot owners.".to_string())
        }
    }
}
