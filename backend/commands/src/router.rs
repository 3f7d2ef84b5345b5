//! The router: command registry plus the message entry point.

use async_trait::async_trait;
use herald_core::{ChatClient, ChatMessage, DispatchError, User};
use herald_logging::{DispatchEvent, DispatchLogger};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::category::Category;
use crate::command::{Middleware, PermissionValidator, RunnableCommand};
use crate::context::Context;
use crate::cooldown::Cooldown;
use crate::group::init_command;
use crate::help::default_help_command;
use crate::pipeline::run_command;
use crate::prefix::{NoPrefix, PrefixCheck};
use crate::state::StateStore;
use crate::tokenizer::Tokenizer;

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// Receives every error the router produces. Returning `true` marks the
/// error as handled and stops the chain.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(&self, ctx: &Context, err: &DispatchError) -> bool;
}

#[async_trait]
impl<F> ErrorHandler for F
where
    F: Fn(&Context, &DispatchError) -> bool + Send + Sync,
{
    async fn handle(&self, ctx: &Context, err: &DispatchError) -> bool {
        self(ctx, err)
    }
}

/// Fallback for names that match no registered command, or for a prefix
/// with nothing after it (`name` is then empty). `Ok(true)` means the
/// handler dealt with the message.
#[async_trait]
pub trait CustomCommandsHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &mut Context,
        name: &str,
        reader: &mut Tokenizer,
    ) -> Result<bool, DispatchError>;
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

pub struct RouterConfig {
    /// Defaults to [`NoPrefix`].
    pub prefix_check: Option<Arc<dyn PrefixCheck>>,
    pub error_handlers: Vec<Arc<dyn ErrorHandler>>,
    pub permission_validators: Vec<Arc<dyn PermissionValidator>>,
    pub middleware: Vec<Arc<dyn Middleware>>,
    pub cooldown: Option<Arc<dyn Cooldown>>,
    pub ignore_bots: bool,
    pub ignore_direct_messages: bool,
    /// Register the built-in `help` command.
    pub register_help: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            prefix_check: None,
            error_handlers: Vec::new(),
            permission_validators: Vec::new(),
            middleware: Vec::new(),
            cooldown: None,
            ignore_bots: true,
            ignore_direct_messages: true,
            register_help: true,
        }
    }
}

/// What became of one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Filtered out, or no prefix matched.
    Ignored,
    /// A command or the custom handler ran to completion.
    Completed,
    /// An error was reported to the error handlers.
    Failed,
}

/// Commands that share a category, as listed by help.
#[derive(Debug, Clone)]
pub struct CategoryGroup {
    /// `None` for commands without a category.
    pub category: Option<Arc<Category>>,
    pub commands: Vec<Arc<dyn RunnableCommand>>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

struct RouterInner {
    prefix_check: Arc<dyn PrefixCheck>,
    permission_validators: Vec<Arc<dyn PermissionValidator>>,
    middleware: Vec<Arc<dyn Middleware>>,
    cooldown: Option<Arc<dyn Cooldown>>,
    ignore_bots: bool,
    ignore_direct_messages: bool,
    commands: RwLock<HashMap<String, Arc<dyn RunnableCommand>>>,
    error_handlers: RwLock<Vec<Arc<dyn ErrorHandler>>>,
    custom_commands: RwLock<Option<Arc<dyn CustomCommandsHandler>>>,
    bot_user: RwLock<Option<User>>,
    state: StateStore,
}

/// Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        if let Some(cooldown) = &config.cooldown {
            cooldown.init();
        }
        let router = Self {
            inner: Arc::new(RouterInner {
                prefix_check: config.prefix_check.unwrap_or_else(|| Arc::new(NoPrefix)),
                permission_validators: config.permission_validators,
                middleware: config.middleware,
                cooldown: config.cooldown,
                ignore_bots: config.ignore_bots,
                ignore_direct_messages: config.ignore_direct_messages,
                commands: RwLock::new(HashMap::new()),
                error_handlers: RwLock::new(config.error_handlers),
                custom_commands: RwLock::new(None),
                bot_user: RwLock::new(None),
                state: StateStore::new(),
            }),
        };
        if config.register_help {
            router.set_command(default_help_command());
        }
        router
    }

    // -- registry ------------------------------------------------------------

    /// Register `command` under its name and aliases, case-insensitively.
    /// Existing keys are overwritten.
    pub fn set_command(&self, command: Arc<dyn RunnableCommand>) {
        init_command(command.as_ref());
        let mut commands = self.inner.commands.write();
        commands.insert(command.name().to_lowercase(), Arc::clone(&command));
        for alias in command.aliases() {
            commands.insert(alias.to_lowercase(), Arc::clone(&command));
        }
        debug!(command = %command.name(), aliases = ?command.aliases(), "Command registered");
    }

    /// Remove the command registered as `name` together with all of its keys.
    pub fn remove_command(&self, name: &str) -> Option<Arc<dyn RunnableCommand>> {
        let mut commands = self.inner.commands.write();
        let command = commands.get(&name.to_lowercase()).cloned()?;
        let keys = std::iter::once(command.name()).chain(command.aliases().iter().map(String::as_str));
        for key in keys {
            let key = key.to_lowercase();
            if commands.get(&key).is_some_and(|c| same_command(c, &command)) {
                commands.remove(&key);
            }
        }
        debug!(command = %command.name(), "Command removed");
        Some(command)
    }

    pub fn get_command(&self, name: &str) -> Option<Arc<dyn RunnableCommand>> {
        self.inner.commands.read().get(&name.to_lowercase()).cloned()
    }

    /// Each command once (alias keys skipped), sorted by name.
    pub fn get_all_commands(&self) -> Vec<Arc<dyn RunnableCommand>> {
        let mut commands: Vec<_> = self
            .inner
            .commands
            .read()
            .iter()
            .filter(|(key, cmd)| **key == cmd.name().to_lowercase())
            .map(|(_, cmd)| Arc::clone(cmd))
            .collect();
        commands.sort_by(|a, b| a.name().cmp(b.name()));
        commands
    }

    /// Commands bucketed by category instance. Uncategorized commands come
    /// first, then categories by name.
    pub fn get_commands_ordered_by_category(&self) -> Vec<CategoryGroup> {
        let mut uncategorized = Vec::new();
        let mut groups: Vec<CategoryGroup> = Vec::new();

        for command in self.get_all_commands() {
            let Some(category) = command.category().cloned() else {
                uncategorized.push(command);
                continue;
            };
            match groups.iter_mut().find(|g| {
                g.category
                    .as_ref()
                    .is_some_and(|c| Arc::ptr_eq(c, &category))
            }) {
                Some(group) => group.commands.push(command),
                None => groups.push(CategoryGroup {
                    category: Some(category),
                    commands: vec![command],
                }),
            }
        }

        groups.sort_by(|a, b| {
            let name = |g: &CategoryGroup| g.category.as_ref().map(|c| c.name.clone()).unwrap_or_default();
            name(a).cmp(&name(b))
        });
        if !uncategorized.is_empty() {
            groups.insert(
                0,
                CategoryGroup {
                    category: None,
                    commands: uncategorized,
                },
            );
        }
        groups
    }

    // -- hooks and settings --------------------------------------------------

    pub fn add_error_handler(&self, handler: impl ErrorHandler + 'static) {
        self.inner.error_handlers.write().push(Arc::new(handler));
    }

    pub fn set_custom_commands_handler(&self, handler: impl CustomCommandsHandler + 'static) {
        *self.inner.custom_commands.write() = Some(Arc::new(handler));
    }

    /// The bot's own account; enables mention prefixes and bot permission
    /// checks.
    pub fn set_bot_user(&self, user: User) {
        info!(bot_id = %user.id, username = %user.username, "Bot user set");
        *self.inner.bot_user.write() = Some(user);
    }

    pub fn bot_user(&self) -> Option<User> {
        self.inner.bot_user.read().clone()
    }

    pub fn state_store(&self) -> &StateStore {
        &self.inner.state
    }

    pub fn permission_validators(&self) -> &[Arc<dyn PermissionValidator>] {
        &self.inner.permission_validators
    }

    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.inner.middleware
    }

    pub fn cooldown(&self) -> Option<&Arc<dyn Cooldown>> {
        self.inner.cooldown.as_ref()
    }

    // -- dispatch ------------------------------------------------------------

    /// Run one inbound message through prefix matching, command lookup and
    /// the execution pipeline. Errors go to the error handlers; nothing is
    /// returned to the caller but the outcome.
    pub async fn process_message(&self, client: Arc<dyn ChatClient>, message: ChatMessage) -> DispatchOutcome {
        if self.inner.ignore_bots && message.author.bot {
            return DispatchOutcome::Ignored;
        }
        if self.inner.ignore_direct_messages && message.is_direct_message() {
            return DispatchOutcome::Ignored;
        }

        let mut reader = Tokenizer::new(message.content.clone());
        let mut ctx = Context::new(self.clone(), client, message);

        if !self.inner.prefix_check.check(&mut ctx, &mut reader).await {
            return DispatchOutcome::Ignored;
        }

        if let Err(err) = patch_member(&mut ctx).await {
            return self.report(&ctx, err).await;
        }

        let name = reader.next_word();
        if name.is_empty() {
            return self
                .run_custom(&mut ctx, "", &mut reader, || {
                    DispatchError::CommandBlank("The command is blank.".into())
                })
                .await;
        }

        ctx.raw_args = reader.remainder().to_string();

        // The read guard is dropped before the command runs.
        let command = self.get_command(&name);
        let Some(command) = command else {
            return self
                .run_custom(&mut ctx, &name, &mut reader, || {
                    DispatchError::CommandNotFound(format!("The command \"{name}\" does not exist."))
                })
                .await;
        };

        let invocation_id = ctx.invocation_id.to_string();
        let channel_id = ctx.message.channel_id.to_string();
        info!(
            command = %command.name(),
            invocation_id = %invocation_id,
            author = %ctx.message.author.id,
            "Dispatching command"
        );
        DispatchLogger::log_event(
            &invocation_id,
            &channel_id,
            DispatchEvent::CommandInvoked {
                command: command.name().to_string(),
                content: ctx.message.content.clone(),
            },
        );

        match run_command(&mut ctx, reader, command).await {
            Ok(()) => DispatchOutcome::Completed,
            Err(err) => self.report(&ctx, err).await,
        }
    }

    /// Consume messages from `inbox` until it closes, dispatching each on its
    /// own task.
    pub fn hook(&self, client: Arc<dyn ChatClient>, mut inbox: mpsc::Receiver<ChatMessage>) -> JoinHandle<()> {
        let router = self.clone();
        tokio::spawn(async move {
            while let Some(message) = inbox.recv().await {
                let router = router.clone();
                let client = Arc::clone(&client);
                tokio::spawn(async move {
                    router.process_message(client, message).await;
                });
            }
            debug!("Inbound message channel closed");
        })
    }

    async fn run_custom(
        &self,
        ctx: &mut Context,
        name: &str,
        reader: &mut Tokenizer,
        unhandled: impl FnOnce() -> DispatchError,
    ) -> DispatchOutcome {
        let handler = self.inner.custom_commands.read().clone();
        let handled = match handler {
            Some(handler) => {
                DispatchLogger::log_event(
                    &ctx.invocation_id.to_string(),
                    &ctx.message.channel_id.to_string(),
                    DispatchEvent::CustomCommand {
                        name: name.to_string(),
                    },
                );
                handler.handle(ctx, name, reader).await
            }
            None => Ok(false),
        };
        match handled {
            Ok(true) => DispatchOutcome::Completed,
            Ok(false) => self.report(ctx, unhandled()).await,
            Err(err) => self.report(ctx, err).await,
        }
    }

    /// Offer `err` to each error handler until one claims it; log it when
    /// none does.
    async fn report(&self, ctx: &Context, err: DispatchError) -> DispatchOutcome {
        let handlers = self.inner.error_handlers.read().clone();
        for handler in handlers {
            if handler.handle(ctx, &err).await {
                return DispatchOutcome::Failed;
            }
        }

        let command = ctx.command.as_ref().map(|c| c.name().to_string());
        error!(
            command = ?command,
            invocation_id = %ctx.invocation_id,
            kind = err.kind().as_str(),
            error = %err,
            "Unhandled dispatch error"
        );
        DispatchLogger::log_event(
            &ctx.invocation_id.to_string(),
            &ctx.message.channel_id.to_string(),
            DispatchEvent::CommandFailed {
                command,
                kind: err.kind().as_str().to_string(),
                error_msg: err.to_string(),
            },
        );
        DispatchOutcome::Failed
    }
}

/// Fill in the author's guild membership when the client did not supply it.
async fn patch_member(ctx: &mut Context) -> Result<(), DispatchError> {
    if ctx.message.member.is_some() {
        return Ok(());
    }
    let Some(guild_id) = ctx.message.guild_id else {
        return Ok(());
    };
    match ctx.client.get_member(guild_id, ctx.message.author.id).await {
        Ok(mut member) => {
            member.guild_id = guild_id;
            ctx.message.member = Some(member);
            Ok(())
        }
        Err(e) => {
            warn!(guild = %guild_id, author = %ctx.message.author.id, error = %e, "Member lookup failed");
            Err(e.into())
        }
    }
}

fn same_command(a: &Arc<dyn RunnableCommand>, b: &Arc<dyn RunnableCommand>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
