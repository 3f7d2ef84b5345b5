//! Command groups: a command whose first argument picks a sub-command.

use async_trait::async_trait;
use herald_core::DispatchError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::arguments::ArgumentRule;
use crate::category::Category;
use crate::command::{Middleware, PermissionValidator, RunnableCommand};
use crate::context::Context;
use crate::cooldown::Cooldown;
use crate::pipeline::run_command;
use crate::tokenizer::Tokenizer;
use crate::transformers::string;

pub struct CommandGroup {
    name: String,
    aliases: Vec<String>,
    description: String,
    category: Option<Arc<Category>>,
    cooldown: Option<Arc<dyn Cooldown>>,
    permission_validators: Vec<Arc<dyn PermissionValidator>>,
    middleware: Vec<Arc<dyn Middleware>>,
    /// Runs when the group is invoked without a sub-command name.
    no_command_specified: Option<Arc<dyn RunnableCommand>>,
    subcommands: RwLock<HashMap<String, Arc<dyn RunnableCommand>>>,
    /// Sub-command name, then the sub-command's own argument text.
    rules: [ArgumentRule; 2],
}

impl CommandGroup {
    pub fn builder(name: impl Into<String>) -> CommandGroupBuilder {
        CommandGroupBuilder {
            group: CommandGroup {
                name: name.into(),
                aliases: Vec::new(),
                description: String::new(),
                category: None,
                cooldown: None,
                permission_validators: Vec::new(),
                middleware: Vec::new(),
                no_command_specified: None,
                subcommands: RwLock::new(HashMap::new()),
                rules: [
                    ArgumentRule::new(string).optional(),
                    ArgumentRule::new(string).remainder().optional(),
                ],
            },
        }
    }

    /// Register `command` under its lower-cased name and aliases.
    pub fn add_command(&self, command: Arc<dyn RunnableCommand>) {
        let mut subcommands = self.subcommands.write();
        subcommands.insert(command.name().to_lowercase(), Arc::clone(&command));
        for alias in command.aliases() {
            subcommands.insert(alias.to_lowercase(), Arc::clone(&command));
        }
    }

    pub fn get_command(&self, name: &str) -> Option<Arc<dyn RunnableCommand>> {
        self.subcommands.read().get(&name.to_lowercase()).cloned()
    }

    /// One entry per distinct sub-command, sorted by name.
    pub fn commands(&self) -> Vec<Arc<dyn RunnableCommand>> {
        let mut commands: Vec<_> = self
            .subcommands
            .read()
            .iter()
            .filter(|(key, cmd)| **key == cmd.name().to_lowercase())
            .map(|(_, cmd)| Arc::clone(cmd))
            .collect();
        commands.sort_by(|a, b| a.name().cmp(b.name()));
        commands
    }
}

#[async_trait]
impl RunnableCommand for CommandGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn description(&self) -> &str {
        &self.description
    }

    /// `<a/b/c>` over every registered key, or the fallback's usage.
    fn usage(&self) -> String {
        let mut keys: Vec<String> = self.subcommands.read().keys().cloned().collect();
        if keys.is_empty() {
            return self
                .no_command_specified
                .as_ref()
                .map(|cmd| cmd.usage())
                .unwrap_or_default();
        }
        keys.sort();
        format!("<{}>", keys.join("/"))
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
        &self.rules
    }

    fn init(&self) {
        if let Some(fallback) = &self.no_command_specified {
            init_command(fallback.as_ref());
        }
        let mut seen: Vec<Arc<dyn RunnableCommand>> = Vec::new();
        for command in self.subcommands.read().values() {
            if seen.iter().any(|s| std::ptr::addr_eq(Arc::as_ptr(s), Arc::as_ptr(command))) {
                continue;
            }
            init_command(command.as_ref());
            seen.push(Arc::clone(command));
        }
    }

    async fn execute(&self, ctx: &mut Context) -> Result<(), DispatchError> {
        let Some(name) = ctx.arg_str(0).map(str::to_lowercase) else {
            return match &self.no_command_specified {
                Some(fallback) => run_command(ctx, Tokenizer::new(""), Arc::clone(fallback)).await,
                None => Err(DispatchError::CommandBlank(
                    "This group expects a command but none was given.".into(),
                )),
            };
        };

        let Some(subcommand) = self.get_command(&name) else {
            return Err(DispatchError::CommandNotFound(
                "The command specified for the group was not found.".into(),
            ));
        };

        debug!(group = %self.name, subcommand = %subcommand.name(), "Delegating to sub-command");
        let rest = ctx.arg_str(1).unwrap_or_default().to_string();
        run_command(ctx, Tokenizer::new(rest), subcommand).await
    }
}

/// Registration-time setup for a command and its cooldown.
pub(crate) fn init_command(command: &dyn RunnableCommand) {
    command.init();
    if let Some(cooldown) = command.cooldown() {
        cooldown.init();
    }
    if let Some(cooldown) = command.category().and_then(|c| c.cooldown.as_ref()) {
        cooldown.init();
    }
}

pub struct CommandGroupBuilder {
    group: CommandGroup,
}

impl CommandGroupBuilder {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.group.aliases.push(alias.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.group.description = description.into();
        self
    }

    pub fn category(mut self, category: Arc<Category>) -> Self {
        self.group.category = Some(category);
        self
    }

    pub fn cooldown(mut self, cooldown: Arc<dyn Cooldown>) -> Self {
        self.group.cooldown = Some(cooldown);
        self
    }

    pub fn permission(mut self, validator: impl PermissionValidator + 'static) -> Self {
        self.group.permission_validators.push(Arc::new(validator));
        self
    }

    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.group.middleware.push(Arc::new(middleware));
        self
    }

    pub fn no_command_specified(mut self, fallback: Arc<dyn RunnableCommand>) -> Self {
        self.group.no_command_specified = Some(fallback);
        self
    }

    pub fn subcommand(self, command: Arc<dyn RunnableCommand>) -> Self {
        self.group.add_command(command);
        self
    }

    pub fn build(self) -> Arc<CommandGroup> {
        Arc::new(self.group)
    }
}
