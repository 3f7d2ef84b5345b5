//! Commands and the traits for the layers wrapped around them.

use async_trait::async_trait;
use futures::future::BoxFuture;
use herald_core::DispatchError;
use std::fmt;
use std::sync::Arc;

use crate::arguments::ArgumentRule;
use crate::category::Category;
use crate::context::Context;
use crate::cooldown::Cooldown;

// ---------------------------------------------------------------------------
// Layer traits
// ---------------------------------------------------------------------------

/// Decides whether the invoker may run a command. `Err` carries the message
/// reported to them.
#[async_trait]
pub trait PermissionValidator: Send + Sync {
    async fn validate(&self, ctx: &Context) -> Result<(), String>;
}

#[async_trait]
impl<F> PermissionValidator for F
where
    F: Fn(&Context) -> Result<(), String> + Send + Sync,
{
    async fn validate(&self, ctx: &Context) -> Result<(), String> {
        self(ctx)
    }
}

/// Runs before argument resolution; may stash values with
/// [`Context::set_param`]. An error aborts the invocation unchanged.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn run(&self, ctx: &mut Context) -> Result<(), DispatchError>;
}

#[async_trait]
impl<F> Middleware for F
where
    F: Fn(&mut Context) -> Result<(), DispatchError> + Send + Sync,
{
    async fn run(&self, ctx: &mut Context) -> Result<(), DispatchError> {
        self(ctx)
    }
}

/// The body of a command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: &mut Context) -> Result<(), DispatchError>;
}

#[async_trait]
impl<F> CommandHandler for F
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<(), DispatchError>> + Send + Sync,
{
    async fn handle(&self, ctx: &mut Context) -> Result<(), DispatchError> {
        self(ctx).await
    }
}

// ---------------------------------------------------------------------------
// RunnableCommand
// ---------------------------------------------------------------------------

/// Anything the router can dispatch to: plain commands and command groups.
#[async_trait]
pub trait RunnableCommand: Send + Sync {
    fn name(&self) -> &str;

    fn aliases(&self) -> &[String];

    fn description(&self) -> &str;

    fn usage(&self) -> String;

    fn category(&self) -> Option<&Arc<Category>>;

    fn cooldown(&self) -> Option<&Arc<dyn Cooldown>>;

    fn permission_validators(&self) -> &[Arc<dyn PermissionValidator>];

    fn middleware(&self) -> &[Arc<dyn Middleware>];

    fn argument_rules(&self) -> &[ArgumentRule];

    /// Called once when the command is registered.
    fn init(&self) {}

    /// Run the command body. Arguments are already resolved into the context.
    async fn execute(&self, ctx: &mut Context) -> Result<(), DispatchError>;
}

impl fmt::Debug for dyn RunnableCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnableCommand")
            .field("name", &self.name())
            .field("aliases", &self.aliases())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

pub struct Command {
    name: String,
    aliases: Vec<String>,
    description: String,
    usage: String,
    category: Option<Arc<Category>>,
    cooldown: Option<Arc<dyn Cooldown>>,
    permission_validators: Vec<Arc<dyn PermissionValidator>>,
    argument_rules: Vec<ArgumentRule>,
    middleware: Vec<Arc<dyn Middleware>>,
    handler: Arc<dyn CommandHandler>,
}

impl Command {
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            command: Command {
                name: name.into(),
                aliases: Vec::new(),
                description: String::new(),
                usage: String::new(),
                category: None,
                cooldown: None,
                permission_validators: Vec::new(),
                argument_rules: Vec::new(),
                middleware: Vec::new(),
                handler: Arc::new(NoopHandler),
            },
        }
    }
}

struct NoopHandler;

#[async_trait]
impl CommandHandler for NoopHandler {
    async fn handle(&self, _ctx: &mut Context) -> Result<(), DispatchError> {
        Ok(())
    }
}

#[async_trait]
impl RunnableCommand for Command {
    fn name(&self) -> &str {
        &self.name
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn usage(&self) -> String {
        self.usage.clone()
    }

    fn category(&self) -> Option<&Arc<Category>> {
        self.category.as_ref()
    }

    fn cooldown(&self) -> Option<&Arc<dyn Cooldown>> {
        self.cooldown.as_ref()
    }

    fn permission_validators(&self) -> &[Arc<dyn PermissionValidator>] {
        &self.permission_validators
    }

    fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    fn argument_rules(&self) -> &[ArgumentRule] {
        &self.argument_rules
    }

    async fn execute(&self, ctx: &mut Context) -> Result<(), DispatchError> {
        self.handler.handle(ctx).await
    }
}

pub struct CommandBuilder {
    command: Command,
}

impl CommandBuilder {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.command.aliases.push(alias.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.command.description = description.into();
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.command.usage = usage.into();
        self
    }

    pub fn category(mut self, category: Arc<Category>) -> Self {
        self.command.category = Some(category);
        self
    }

    pub fn cooldown(mut self, cooldown: Arc<dyn Cooldown>) -> Self {
        self.command.cooldown = Some(cooldown);
        self
    }

    pub fn permission(mut self, validator: impl PermissionValidator + 'static) -> Self {
        self.command.permission_validators.push(Arc::new(validator));
        self
    }

    pub fn argument(mut self, rule: ArgumentRule) -> Self {
        self.command.argument_rules.push(rule);
        self
    }

    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.command.middleware.push(Arc::new(middleware));
        self
    }

    /// Closure handler: `|ctx| Box::pin(async move { ... })`.
    pub fn run<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<(), DispatchError>>
            + Send
            + Sync
            + 'static,
    {
        self.command.handler = Arc::new(f);
        self
    }

    pub fn handler(mut self, handler: impl CommandHandler + 'static) -> Self {
        self.command.handler = Arc::new(handler);
        self
    }

    pub fn build(self) -> Arc<dyn RunnableCommand> {
        Arc::new(self.command)
    }
}
