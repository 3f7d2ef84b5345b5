use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::permissions::Permissions;

/// Platform-wide numeric identifier shared by users, channels, guilds, roles and messages.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Snowflake(pub u64);

impl Snowflake {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

impl From<u64> for Snowflake {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// An account on the chat platform (the "actor" of a message).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    pub fn new(id: impl Into<Snowflake>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            bot: false,
        }
    }

    /// `<@id>` mention string for this user.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// A user's membership in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    pub guild_id: Snowflake,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
}

impl Member {
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.user.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub permissions: Permissions,
}

/// The "container" a channel belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub owner_id: Snowflake,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// An inbound text message as delivered by the platform client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    /// `None` for direct messages.
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    pub author: User,
    /// Guild membership of the author; patched in by the router when absent.
    #[serde(default)]
    pub member: Option<Member>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(channel_id: impl Into<Snowflake>, author: User, content: impl Into<String>) -> Self {
        Self {
            id: Snowflake::default(),
            channel_id: channel_id.into(),
            guild_id: None,
            author,
            member: None,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<Snowflake>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_guild(mut self, guild_id: impl Into<Snowflake>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn is_direct_message(&self) -> bool {
        self.guild_id.is_none()
    }
}

/// Receipt for a message the bot sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_parses_and_displays() {
        let id: Snowflake = "80351110224678912".parse().unwrap();
        assert_eq!(id.get(), 80351110224678912);
        assert_eq!(id.to_string(), "80351110224678912");
        assert!("12a".parse::<Snowflake>().is_err());
    }

    #[test]
    fn direct_messages_have_no_guild() {
        let author = User::new(1, "someone");
        let dm = ChatMessage::new(5, author.clone(), "hi");
        assert!(dm.is_direct_message());
        assert!(!ChatMessage::new(5, author, "hi").with_guild(9).is_direct_message());
    }

    #[test]
    fn member_display_name_prefers_nick() {
        let mut member = Member {
            user: User::new(1, "someone"),
            guild_id: Snowflake(2),
            nick: None,
            roles: vec![],
        };
        assert_eq!(member.display_name(), "someone");
        member.nick = Some("nick".into());
        assert_eq!(member.display_name(), "nick");
    }
}
