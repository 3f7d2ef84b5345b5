//! Per-invocation context handed through the pipeline to the handler.

use herald_core::{Channel, ChatClient, ChatMessage, DispatchError, Guild, Member, SentMessage, User};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::arguments::ResolvedArgs;
use crate::command::RunnableCommand;
use crate::pipeline::run_command;
use crate::router::Router;
use crate::state::State;
use crate::tokenizer::Tokenizer;
use crate::value::ArgValue;

pub struct Context {
    /// Correlates the log lines of one dispatch.
    pub invocation_id: Uuid,
    /// Prefix text matched by the prefix check.
    pub prefix: String,
    pub message: ChatMessage,
    pub bot_user: Option<User>,
    pub router: Router,
    pub client: Arc<dyn ChatClient>,
    /// The command currently running; set by the pipeline.
    pub command: Option<Arc<dyn RunnableCommand>>,
    /// Argument text after the command name.
    pub raw_args: String,
    pub args: ResolvedArgs,
    params: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new(router: Router, client: Arc<dyn ChatClient>, message: ChatMessage) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            prefix: String::new(),
            bot_user: router.bot_user(),
            message,
            router,
            client,
            command: None,
            raw_args: String::new(),
            args: Vec::new(),
            params: HashMap::new(),
        }
    }

    /// Send `content` to the channel the command was invoked in.
    pub async fn reply(&self, content: impl Into<String>) -> Result<SentMessage, DispatchError> {
        let content = content.into();
        let sent = self
            .client
            .send_message(self.message.channel_id, &content)
            .await?;
        Ok(sent)
    }

    /// Re-run the current command over [`Context::raw_args`].
    pub async fn replay(&mut self) -> Result<(), DispatchError> {
        let Some(command) = self.command.clone() else {
            return Err(DispatchError::CommandNotFound(
                "There is no command to replay.".into(),
            ));
        };
        self.args.clear();
        let reader = Tokenizer::new(self.raw_args.clone());
        run_command(self, reader, command).await
    }

    /// `None` in direct messages.
    pub async fn guild(&self) -> Result<Option<Guild>, DispatchError> {
        match self.message.guild_id {
            Some(guild_id) => Ok(Some(self.client.get_guild(guild_id).await?)),
            None => Ok(None),
        }
    }

    pub async fn channel(&self) -> Result<Channel, DispatchError> {
        Ok(self.client.get_channel(self.message.channel_id).await?)
    }

    /// The bot's own membership in the invoking guild.
    pub async fn bot_member(&self) -> Result<Option<Member>, DispatchError> {
        let (Some(guild_id), Some(bot)) = (self.message.guild_id, self.bot_user.as_ref()) else {
            return Ok(None);
        };
        Ok(Some(self.client.get_member(guild_id, bot.id).await?))
    }

    // -- resolved arguments --------------------------------------------------

    pub fn arg(&self, index: usize) -> Option<&ArgValue> {
        self.args.get(index).and_then(Option::as_ref)
    }

    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.arg(index).and_then(ArgValue::as_str)
    }

    pub fn arg_int(&self, index: usize) -> Option<i64> {
        self.arg(index).and_then(ArgValue::as_int)
    }

    pub fn arg_uint(&self, index: usize) -> Option<u64> {
        self.arg(index).and_then(ArgValue::as_uint)
    }

    pub fn arg_bool(&self, index: usize) -> Option<bool> {
        self.arg(index).and_then(ArgValue::as_bool)
    }

    pub fn arg_list(&self, index: usize) -> Option<&[ArgValue]> {
        self.arg(index).and_then(ArgValue::as_list)
    }

    // -- middleware params ---------------------------------------------------

    pub fn set_param<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.params.insert(key.into(), Box::new(value));
    }

    pub fn param<T: Any>(&self, key: &str) -> Option<&T> {
        self.params.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Counter for the invoking guild (id 0 in direct messages).
    pub fn state(&self) -> Arc<State> {
        self.router
            .state_store()
            .for_container(self.message.guild_id.unwrap_or_default())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("invocation_id", &self.invocation_id)
            .field("prefix", &self.prefix)
            .field("message", &self.message)
            .field("command", &self.command.as_ref().map(|c| c.name().to_string()))
            .field("raw_args", &self.raw_args)
            .field("args", &self.args)
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
