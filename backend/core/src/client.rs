use anyhow::Result;
use async_trait::async_trait;

use crate::permissions::Permissions;
use crate::types::{Channel, Guild, Member, Role, SentMessage, Snowflake, User};

/// The chat-platform client the router talks to.
///
/// Everything behind this trait (REST calls, gateway sessions, caching) is
/// owned by the platform integration; the router only sends replies and
/// resolves entities through it.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Post a text message to a channel.
    async fn send_message(&self, channel_id: Snowflake, content: &str) -> Result<SentMessage>;

    async fn get_user(&self, user_id: Snowflake) -> Result<User>;

    async fn get_channel(&self, channel_id: Snowflake) -> Result<Channel>;

    async fn get_guild(&self, guild_id: Snowflake) -> Result<Guild>;

    async fn get_role(&self, guild_id: Snowflake, role_id: Snowflake) -> Result<Role>;

    async fn get_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Result<Member>;

    /// Effective permissions of a member in a guild, narrowed by the
    /// channel's overwrites when `channel_id` is given.
    async fn member_permissions(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        channel_id: Option<Snowflake>,
    ) -> Result<Permissions>;
}
