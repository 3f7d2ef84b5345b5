//! In-memory chat client and context builders shared by unit tests.

use anyhow::{Result, bail};
use async_trait::async_trait;
use herald_core::{
    Channel, ChatClient, ChatMessage, Guild, Member, Permissions, Role, SentMessage, Snowflake, User,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::Context;
use crate::prefix::StaticPrefix;
use crate::router::{Router, RouterConfig};

pub const GUILD_ID: u64 = 1;
pub const CHANNEL_ID: u64 = 10;
pub const AUTHOR_ID: u64 = 100;
pub const BOT_ID: u64 = 1;

/// Knows users 1 (the bot) and 100 (the author) and channel 10. Every member
/// has no permissions unless configured, and the guild owner is user 999.
pub struct MockClient {
    sent: Mutex<Vec<(Snowflake, String)>>,
    next_id: AtomicU64,
    owner: Snowflake,
    guild_perms: HashMap<Snowflake, Permissions>,
    channel_perms: HashMap<Snowflake, Permissions>,
    missing_members: bool,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(5000),
            owner: Snowflake::new(999),
            guild_perms: HashMap::new(),
            channel_perms: HashMap::new(),
            missing_members: false,
        }
    }
}

impl MockClient {
    pub fn with_permissions(mut self, user: u64, perms: Permissions) -> Self {
        self.guild_perms.insert(Snowflake::new(user), perms);
        self
    }

    pub fn with_channel_permissions(mut self, user: u64, perms: Permissions) -> Self {
        self.channel_perms.insert(Snowflake::new(user), perms);
        self
    }

    pub fn with_owner(mut self, user: u64) -> Self {
        self.owner = Snowflake::new(user);
        self
    }

    /// Member lookups fail.
    pub fn without_members(mut self) -> Self {
        self.missing_members = true;
        self
    }

    pub fn sent(&self) -> Vec<(Snowflake, String)> {
        self.sent.lock().clone()
    }

    pub fn sent_text(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, text)| text.clone()).collect()
    }

    fn user(id: Snowflake) -> Result<User> {
        match id.get() {
            BOT_ID => Ok(User {
                bot: true,
                ..User::new(BOT_ID, "herald")
            }),
            AUTHOR_ID => Ok(User::new(AUTHOR_ID, "tester")),
            other => bail!("unknown user {other}"),
        }
    }
}

#[async_trait]
impl ChatClient for MockClient {
    async fn send_message(&self, channel_id: Snowflake, content: &str) -> Result<SentMessage> {
        self.sent.lock().push((channel_id, content.to_string()));
        Ok(SentMessage {
            id: Snowflake::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            channel_id,
        })
    }

    async fn get_user(&self, user_id: Snowflake) -> Result<User> {
        Self::user(user_id)
    }

    async fn get_channel(&self, channel_id: Snowflake) -> Result<Channel> {
        if channel_id.get() != CHANNEL_ID {
            bail!("unknown channel {channel_id}");
        }
        Ok(Channel {
            id: channel_id,
            guild_id: Some(Snowflake::new(GUILD_ID)),
            name: format!("channel-{channel_id}"),
        })
    }

    async fn get_guild(&self, guild_id: Snowflake) -> Result<Guild> {
        Ok(Guild {
            id: guild_id,
            name: "Test Guild".into(),
            owner_id: self.owner,
        })
    }

    async fn get_role(&self, guild_id: Snowflake, role_id: Snowflake) -> Result<Role> {
        if guild_id.get() != GUILD_ID {
            bail!("unknown guild {guild_id}");
        }
        Ok(Role {
            id: role_id,
            guild_id,
            name: format!("role-{role_id}"),
            permissions: Permissions::NONE,
        })
    }

    async fn get_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Result<Member> {
        if self.missing_members {
            bail!("member lookups are unavailable");
        }
        Ok(Member {
            user: Self::user(user_id)?,
            guild_id,
            nick: None,
            roles: Vec::new(),
        })
    }

    async fn member_permissions(
        &self,
        _guild_id: Snowflake,
        user_id: Snowflake,
        channel_id: Option<Snowflake>,
    ) -> Result<Permissions> {
        let table = if channel_id.is_some() {
            &self.channel_perms
        } else {
            &self.guild_perms
        };
        Ok(table.get(&user_id).copied().unwrap_or_default())
    }
}

/// A guild message from user 100 in channel 10.
pub fn mock_message(content: &str) -> ChatMessage {
    ChatMessage::new(CHANNEL_ID, User::new(AUTHOR_ID, "tester"), content)
        .with_id(1000)
        .with_guild(GUILD_ID)
}

/// `%` prefix, no help command.
pub fn test_config() -> RouterConfig {
    RouterConfig {
        prefix_check: Some(Arc::new(StaticPrefix::new("%"))),
        register_help: false,
        ..RouterConfig::default()
    }
}

fn with_bot(router: Router) -> Router {
    router.set_bot_user(User {
        bot: true,
        ..User::new(BOT_ID, "herald")
    });
    router
}

pub fn test_router() -> Router {
    with_bot(Router::new(test_config()))
}

pub fn router_with(config: RouterConfig) -> Router {
    with_bot(Router::new(config))
}

pub fn mock_context(message: ChatMessage) -> Context {
    mock_context_with(test_config(), message)
}

pub fn mock_context_with(config: RouterConfig, message: ChatMessage) -> Context {
    Context::new(router_with(config), Arc::new(MockClient::default()), message)
}
