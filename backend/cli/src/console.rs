//! Stdin/stdout chat client: each input line is a message from the console
//! user, each bot reply is printed.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use herald_commands::Router;
use herald_config::ConsoleConfig;
use herald_core::{
    Channel, ChatClient, ChatMessage, Guild, Member, Permissions, Role, SentMessage, Snowflake, User,
};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// One console user talking to the bot in one channel of one guild. The
/// console user owns the guild.
pub struct ConsoleClient {
    pub user: User,
    pub bot: User,
    pub channel_id: Snowflake,
    pub guild_id: Snowflake,
    next_message_id: AtomicU64,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleClient {
    pub fn new(config: &ConsoleConfig) -> Self {
        Self::with_writer(config, Box::new(std::io::stdout()))
    }

    pub fn with_writer(config: &ConsoleConfig, out: Box<dyn Write + Send>) -> Self {
        let bot = User {
            bot: true,
            ..User::new(config.bot_user_id.unwrap_or(1), "herald")
        };
        Self {
            user: User::new(
                config.user_id.unwrap_or(100),
                config.username.clone().unwrap_or_else(|| "console".into()),
            ),
            bot,
            channel_id: Snowflake::new(config.channel_id.unwrap_or(10)),
            guild_id: Snowflake::new(config.guild_id.unwrap_or(1)),
            next_message_id: AtomicU64::new(1),
            out: Mutex::new(out),
        }
    }

    fn next_id(&self) -> Snowflake {
        Snowflake::new(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Wrap one input line as a guild message from the console user.
    pub fn message(&self, content: &str) -> ChatMessage {
        ChatMessage::new(self.channel_id, self.user.clone(), content)
            .with_id(self.next_id())
            .with_guild(self.guild_id)
    }

    fn known_user(&self, id: Snowflake) -> Option<&User> {
        [&self.user, &self.bot].into_iter().find(|u| u.id == id)
    }
}

#[async_trait]
impl ChatClient for ConsoleClient {
    async fn send_message(&self, channel_id: Snowflake, content: &str) -> Result<SentMessage> {
        let mut out = self.out.lock();
        for line in content.lines() {
            writeln!(out, "[{}] {line}", self.bot.username)?;
        }
        out.flush()?;
        Ok(SentMessage {
            id: self.next_id(),
            channel_id,
        })
    }

    async fn get_user(&self, user_id: Snowflake) -> Result<User> {
        match self.known_user(user_id) {
            Some(user) => Ok(user.clone()),
            None => bail!("unknown user {user_id}"),
        }
    }

    async fn get_channel(&self, channel_id: Snowflake) -> Result<Channel> {
        if channel_id != self.channel_id {
            bail!("unknown channel {channel_id}");
        }
        Ok(Channel {
            id: channel_id,
            guild_id: Some(self.guild_id),
            name: "console".into(),
        })
    }

    async fn get_guild(&self, guild_id: Snowflake) -> Result<Guild> {
        if guild_id != self.guild_id {
            bail!("unknown guild {guild_id}");
        }
        Ok(Guild {
            id: guild_id,
            name: "Console".into(),
            owner_id: self.user.id,
        })
    }

    async fn get_role(&self, guild_id: Snowflake, role_id: Snowflake) -> Result<Role> {
        if guild_id != self.guild_id {
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
        if guild_id != self.guild_id {
            bail!("unknown guild {guild_id}");
        }
        let user = self.get_user(user_id).await?;
        Ok(Member {
            user,
            guild_id,
            nick: None,
            roles: Vec::new(),
        })
    }

    async fn member_permissions(
        &self,
        _guild_id: Snowflake,
        user_id: Snowflake,
        _channel_id: Option<Snowflake>,
    ) -> Result<Permissions> {
        match self.known_user(user_id) {
            Some(_) => Ok(Permissions::ADMINISTRATOR),
            None => Ok(Permissions::NONE),
        }
    }
}

/// Feed stdin into the router until EOF or `quit`.
pub async fn run_console(router: Router, client: Arc<ConsoleClient>) -> Result<()> {
    let (tx, rx) = mpsc::channel(32);
    let worker = router.hook(client.clone(), rx);

    info!(
        user = %client.user.username,
        channel_id = %client.channel_id,
        "Console ready; type a command or 'quit'"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        if line == "quit" {
            break;
        }
        if line.is_empty() {
            continue;
        }
        debug!(content = %line, "Console input");
        if tx.send(client.message(line)).await.is_err() {
            break;
        }
    }

    drop(tx);
    worker.await?;
    Ok(())
}
