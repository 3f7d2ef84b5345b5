//! Argument transformers: text token → typed [`ArgValue`].

use async_trait::async_trait;
use herald_core::{DispatchError, Snowflake};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use crate::context::Context;
use crate::value::ArgValue;

static USER_MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<@!?(\d+)>$").unwrap());
static CHANNEL_MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<#(\d+)>$").unwrap());
static ROLE_MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<@&(\d+)>$").unwrap());

// ---------------------------------------------------------------------------
// Transformer trait
// ---------------------------------------------------------------------------

/// Converts one argument token. May look entities up through the context's
/// client but must not change pipeline state.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError>;
}

#[async_trait]
impl<F> Transformer for F
where
    F: Fn(&Context, &str) -> Result<ArgValue, DispatchError> + Send + Sync,
{
    async fn transform(&self, ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
        self(ctx, arg)
    }
}

// ---------------------------------------------------------------------------
// Plain values
// ---------------------------------------------------------------------------

pub fn string(_ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
    Ok(ArgValue::Str(arg.to_string()))
}

pub fn int(_ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
    arg.parse::<i64>().map(ArgValue::Int).map_err(|_| {
        DispatchError::invalid_transformation("Could not transform the argument to an integer.")
    })
}

pub fn uint(_ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
    arg.parse::<u64>().map(ArgValue::UInt).map_err(|_| {
        DispatchError::invalid_transformation(
            "Could not transform the argument to an unsigned integer.",
        )
    })
}

pub fn float(_ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
    arg.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(ArgValue::Float)
        .ok_or_else(|| {
            DispatchError::invalid_transformation("Could not transform the argument to a number.")
        })
}

pub fn boolean(_ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
    match arg.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Ok(ArgValue::Bool(true)),
        "false" | "no" | "n" | "off" | "0" => Ok(ArgValue::Bool(false)),
        _ => Err(DispatchError::invalid_transformation(
            "Could not transform the argument to a boolean.",
        )),
    }
}

/// `30s`, `5m`, `2h`, `1d`, `1w` or combinations such as `1h30m`.
pub fn duration(_ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
    parse_duration(arg).map(ArgValue::Duration).ok_or_else(|| {
        DispatchError::invalid_transformation("Could not transform the argument to a duration.")
    })
}

fn parse_duration(text: &str) -> Option<Duration> {
    let mut total: u64 = 0;
    let mut number: Option<u64> = None;
    let mut parts = 0;

    for c in text.to_ascii_lowercase().chars() {
        if let Some(digit) = c.to_digit(10) {
            number = Some(number.unwrap_or(0).checked_mul(10)?.checked_add(u64::from(digit))?);
            continue;
        }
        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            'd' => 86_400,
            'w' => 604_800,
            _ => return None,
        };
        total = total.checked_add(number.take()?.checked_mul(unit)?)?;
        parts += 1;
    }

    if number.is_some() || parts == 0 {
        return None;
    }
    Some(Duration::from_secs(total))
}

// ---------------------------------------------------------------------------
// Ids and mentions
// ---------------------------------------------------------------------------

fn parse_id(arg: &str, mention: &Regex) -> Option<Snowflake> {
    let digits = mention
        .captures(arg)
        .and_then(|caps| caps.get(1))
        .map_or(arg, |m| m.as_str());
    digits.parse().ok()
}

pub fn user_id(_ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
    parse_id(arg, &USER_MENTION).map(ArgValue::Id).ok_or_else(|| {
        DispatchError::invalid_transformation("Could not transform the argument to a user ID.")
    })
}

pub fn channel_id(_ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
    parse_id(arg, &CHANNEL_MENTION).map(ArgValue::Id).ok_or_else(|| {
        DispatchError::invalid_transformation("Could not transform the argument to a channel ID.")
    })
}

pub fn role_id(_ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
    parse_id(arg, &ROLE_MENTION).map(ArgValue::Id).ok_or_else(|| {
        DispatchError::invalid_transformation("Could not transform the argument to a role ID.")
    })
}

// ---------------------------------------------------------------------------
// Entity lookups
// ---------------------------------------------------------------------------

/// Mention or id, resolved to a full user through the client.
pub struct UserTransformer;

#[async_trait]
impl Transformer for UserTransformer {
    async fn transform(&self, ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
        let id = parse_id(arg, &USER_MENTION).ok_or_else(|| {
            DispatchError::invalid_transformation("Could not transform the argument to a user.")
        })?;
        let user = ctx.client.get_user(id).await.map_err(|_| {
            DispatchError::invalid_transformation("Could not find the user specified.")
        })?;
        Ok(ArgValue::User(user))
    }
}

pub struct ChannelTransformer;

#[async_trait]
impl Transformer for ChannelTransformer {
    async fn transform(&self, ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
        let id = parse_id(arg, &CHANNEL_MENTION).ok_or_else(|| {
            DispatchError::invalid_transformation("Could not transform the argument to a channel.")
        })?;
        let channel = ctx.client.get_channel(id).await.map_err(|_| {
            DispatchError::invalid_transformation("Could not find the channel specified.")
        })?;
        Ok(ArgValue::Channel(channel))
    }
}

/// Only resolves inside a guild.
pub struct RoleTransformer;

#[async_trait]
impl Transformer for RoleTransformer {
    async fn transform(&self, ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
        let Some(guild_id) = ctx.message.guild_id else {
            return Err(DispatchError::invalid_transformation(
                "Roles can only be resolved inside a guild.",
            ));
        };
        let id = parse_id(arg, &ROLE_MENTION).ok_or_else(|| {
            DispatchError::invalid_transformation("Could not transform the argument to a role.")
        })?;
        let role = ctx.client.get_role(guild_id, id).await.map_err(|_| {
            DispatchError::invalid_transformation("Could not find the role specified.")
        })?;
        Ok(ArgValue::Role(role))
    }
}

// ---------------------------------------------------------------------------
// Combinators
// ---------------------------------------------------------------------------

/// First transformer that accepts the token wins.
pub struct AnyOf {
    transformers: Vec<Arc<dyn Transformer>>,
}

pub fn any_of(transformers: Vec<Arc<dyn Transformer>>) -> AnyOf {
    AnyOf { transformers }
}

#[async_trait]
impl Transformer for AnyOf {
    async fn transform(&self, ctx: &Context, arg: &str) -> Result<ArgValue, DispatchError> {
        let mut last_err = DispatchError::invalid_transformation("No transformers were given.");
        for transformer in &self.transformers {
            match transformer.transform(ctx, arg).await {
                Ok(value) => return Ok(value),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{mock_context, mock_message};
    use herald_core::ErrorKind;

    fn ctx() -> Context {
        mock_context(mock_message("%t"))
    }

    #[test]
    fn parses_numbers() {
        let ctx = ctx();
        assert_eq!(int(&ctx, "-4").unwrap(), ArgValue::Int(-4));
        assert_eq!(uint(&ctx, "4").unwrap(), ArgValue::UInt(4));
        assert_eq!(float(&ctx, "2.5").unwrap(), ArgValue::Float(2.5));
        let err = int(&ctx, "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransformation);
        assert_eq!(err.to_string(), "Could not transform the argument to an integer.");
        assert!(uint(&ctx, "-1").is_err());
        assert!(float(&ctx, "NaN").is_err());
    }

    #[test]
    fn parses_booleans() {
        let ctx = ctx();
        assert_eq!(boolean(&ctx, "Yes").unwrap(), ArgValue::Bool(true));
        assert_eq!(boolean(&ctx, "off").unwrap(), ArgValue::Bool(false));
        assert!(boolean(&ctx, "maybe").is_err());
    }

    #[test]
    fn parses_mentions_and_raw_ids() {
        let ctx = ctx();
        assert_eq!(user_id(&ctx, "<@!42>").unwrap(), ArgValue::Id(Snowflake::new(42)));
        assert_eq!(user_id(&ctx, "<@42>").unwrap(), ArgValue::Id(Snowflake::new(42)));
        assert_eq!(user_id(&ctx, "42").unwrap(), ArgValue::Id(Snowflake::new(42)));
        assert_eq!(channel_id(&ctx, "<#7>").unwrap(), ArgValue::Id(Snowflake::new(7)));
        assert_eq!(role_id(&ctx, "<@&9>").unwrap(), ArgValue::Id(Snowflake::new(9)));
        assert!(channel_id(&ctx, "<@7>").is_err());
    }

    #[test]
    fn parses_durations() {
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("1h30m"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("2D"), Some(Duration::from_secs(172_800)));
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("m"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[tokio::test]
    async fn resolves_users_through_client() {
        let ctx = ctx();
        let value = UserTransformer.transform(&ctx, "<@100>").await.unwrap();
        assert_eq!(value.as_user().map(|u| u.id), Some(Snowflake::new(100)));

        let err = UserTransformer.transform(&ctx, "<@404>").await.unwrap_err();
        assert_eq!(err.to_string(), "Could not find the user specified.");
    }

    #[tokio::test]
    async fn resolves_channels_through_client() {
        let ctx = ctx();
        let value = ChannelTransformer.transform(&ctx, "<#10>").await.unwrap();
        assert_eq!(value.as_channel().map(|c| c.id), Some(Snowflake::new(10)));

        let err = ChannelTransformer.transform(&ctx, "<#404>").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransformation);
        assert_eq!(err.to_string(), "Could not find the channel specified.");

        let err = ChannelTransformer.transform(&ctx, "general").await.unwrap_err();
        assert_eq!(err.to_string(), "Could not transform the argument to a channel.");
    }

    #[tokio::test]
    async fn resolves_roles_only_inside_a_guild() {
        let ctx = ctx();
        let value = RoleTransformer.transform(&ctx, "<@&9>").await.unwrap();
        let role = value.as_role().unwrap();
        assert_eq!((role.id, role.guild_id), (Snowflake::new(9), Snowflake::new(1)));

        let mut message = mock_message("%t");
        message.guild_id = Some(Snowflake::new(404));
        let err = RoleTransformer.transform(&mock_context(message), "9").await.unwrap_err();
        assert_eq!(err.to_string(), "Could not find the role specified.");

        let mut message = mock_message("%t");
        message.guild_id = None;
        let err = RoleTransformer.transform(&mock_context(message), "<@&9>").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransformation);
        assert_eq!(err.to_string(), "Roles can only be resolved inside a guild.");
    }

    #[tokio::test]
    async fn any_of_takes_first_success() {
        let ctx = ctx();
        let choices: Vec<Arc<dyn Transformer>> = vec![Arc::new(int), Arc::new(boolean)];
        let t = any_of(choices);
        assert_eq!(t.transform(&ctx, "5").await.unwrap(), ArgValue::Int(5));
        assert_eq!(t.transform(&ctx, "yes").await.unwrap(), ArgValue::Bool(true));
        let err = t.transform(&ctx, "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Could not transform the argument to a boolean.");
    }

    #[tokio::test]
    async fn closures_are_transformers() {
        let ctx = ctx();
        let upper = |_: &Context, arg: &str| -> Result<ArgValue, DispatchError> {
            Ok(ArgValue::Str(arg.to_uppercase()))
        };
        assert_eq!(upper.transform(&ctx, "hi").await.unwrap(), ArgValue::from("HI"));
    }
}
