//! Prefix checks: decide whether a message is addressed to the bot and
//! consume the prefix from the reader.

use async_trait::async_trait;
use herald_core::Snowflake;
use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::context::Context;
use crate::tokenizer::Tokenizer;

static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<@!?(\d+)> *").unwrap());

/// On a match the prefix has been consumed from `reader` and recorded in
/// [`Context::prefix`].
#[async_trait]
pub trait PrefixCheck: Send + Sync {
    async fn check(&self, ctx: &mut Context, reader: &mut Tokenizer) -> bool;
}

#[async_trait]
impl<F> PrefixCheck for F
where
    F: Fn(&mut Context, &mut Tokenizer) -> bool + Send + Sync,
{
    async fn check(&self, ctx: &mut Context, reader: &mut Tokenizer) -> bool {
        self(ctx, reader)
    }
}

/// Every message is a command.
pub struct NoPrefix;

#[async_trait]
impl PrefixCheck for NoPrefix {
    async fn check(&self, _ctx: &mut Context, _reader: &mut Tokenizer) -> bool {
        true
    }
}

/// A fixed, case-sensitive prefix such as `%`.
pub struct StaticPrefix(pub String);

impl StaticPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }
}

#[async_trait]
impl PrefixCheck for StaticPrefix {
    async fn check(&self, ctx: &mut Context, reader: &mut Tokenizer) -> bool {
        for expected in self.0.chars() {
            if reader.next_char() != Some(expected) {
                return false;
            }
        }
        ctx.prefix = self.0.clone();
        true
    }
}

/// `<@BOT_ID>` or `<@!BOT_ID>` followed by optional spaces. Never matches
/// before the router knows the bot user.
pub struct MentionPrefix;

#[async_trait]
impl PrefixCheck for MentionPrefix {
    async fn check(&self, ctx: &mut Context, reader: &mut Tokenizer) -> bool {
        let Some(bot_id) = ctx.bot_user.as_ref().map(|u| u.id) else {
            return false;
        };
        let Some(matched) = match_mention(reader.remainder(), bot_id) else {
            return false;
        };
        reader.advance(matched.len());
        ctx.prefix = matched.trim_end().to_string();
        true
    }
}

fn match_mention(text: &str, bot_id: Snowflake) -> Option<String> {
    let caps = MENTION.captures(text)?;
    let id: Snowflake = caps[1].parse().ok()?;
    (id == bot_id).then(|| caps[0].to_string())
}

/// Tries each check in order, rewinding the reader between attempts.
pub struct MultiplePrefixCheckers(pub Vec<Arc<dyn PrefixCheck>>);

#[async_trait]
impl PrefixCheck for MultiplePrefixCheckers {
    async fn check(&self, ctx: &mut Context, reader: &mut Tokenizer) -> bool {
        let start = reader.position();
        for check in &self.0 {
            if check.check(ctx, reader).await {
                return true;
            }
            reader.seek(start);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{mock_context, mock_message};

    async fn run(check: &dyn PrefixCheck, content: &str) -> Option<(String, String)> {
        let mut ctx = mock_context(mock_message(content));
        let mut reader = Tokenizer::new(content);
        check
            .check(&mut ctx, &mut reader)
            .await
            .then(|| (ctx.prefix.clone(), reader.remainder().to_string()))
    }

    #[tokio::test]
    async fn static_prefix_consumes_itself() {
        let check = StaticPrefix::new("!!");
        assert_eq!(run(&check, "!!ping x").await, Some(("!!".into(), "ping x".into())));
        assert_eq!(run(&check, "!ping").await, None);
        assert_eq!(run(&check, "!").await, None);
    }

    #[tokio::test]
    async fn mention_prefix_requires_bot_id() {
        // The test router's bot user has id 1.
        assert_eq!(
            run(&MentionPrefix, "<@1>   ping").await,
            Some(("<@1>".into(), "ping".into()))
        );
        assert_eq!(
            run(&MentionPrefix, "<@!1>ping").await,
            Some(("<@!1>".into(), "ping".into()))
        );
        assert_eq!(run(&MentionPrefix, "<@2> ping").await, None);
        assert_eq!(run(&MentionPrefix, "ping").await, None);
    }

    #[tokio::test]
    async fn multiple_checkers_rewind_between_attempts() {
        let check = MultiplePrefixCheckers(vec![
            Arc::new(StaticPrefix::new("%%")),
            Arc::new(StaticPrefix::new("%")),
            Arc::new(MentionPrefix),
        ]);
        assert_eq!(run(&check, "%ping").await, Some(("%".into(), "ping".into())));
        assert_eq!(run(&check, "%%ping").await, Some(("%%".into(), "ping".into())));
        assert_eq!(run(&check, "<@1> ping").await, Some(("<@1>".into(), "ping".into())));
        assert_eq!(run(&check, "?ping").await, None);
    }

    #[tokio::test]
    async fn checker_that_overshoots_is_reset_to_start() {
        let overshoot = |_: &mut Context, reader: &mut Tokenizer| {
            reader.rewind(reader.position() + 5);
            false
        };
        let check = MultiplePrefixCheckers(vec![Arc::new(overshoot), Arc::new(StaticPrefix::new("%"))]);

        let mut ctx = mock_context(mock_message("ab %ping"));
        let mut reader = Tokenizer::new("ab %ping");
        reader.advance(3);
        assert!(check.check(&mut ctx, &mut reader).await);
        assert_eq!(reader.remainder(), "ping");
    }

    #[tokio::test]
    async fn closures_are_prefix_checks() {
        let check = |_: &mut Context, reader: &mut Tokenizer| reader.remainder().starts_with("hey ");
        assert!(run(&check, "hey you").await.is_some());
    }
}
