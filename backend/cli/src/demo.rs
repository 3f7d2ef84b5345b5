//! The commands the console bot ships with.
//!
//! A cooldown preset named after a command is attached to that command.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use herald_commands::transformers::{duration, float, int, string, UserTransformer};
use herald_commands::{
    require_permissions, ArgValue, ArgumentRule, Category, Command, CommandBuilder, CommandGroup, Context,
    CustomCommandsHandler, PermissionChecks, Router, RunnableCommand, Tokenizer,
};
use herald_core::{DispatchError, Permissions};
use parking_lot::RwLock;
use tracing::debug;

use crate::wiring::Presets;

/// User-defined replies, looked up when no command matches.
#[derive(Default)]
pub struct Tags {
    tags: RwLock<HashMap<String, String>>,
}

impl Tags {
    pub fn set(&self, name: &str, reply: &str) {
        self.tags.write().insert(name.to_lowercase(), reply.to_string());
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.tags.read().get(&name.to_lowercase()).cloned()
    }
}

struct TagLookup(Arc<Tags>);

#[async_trait]
impl CustomCommandsHandler for TagLookup {
    async fn handle(&self, ctx: &mut Context, name: &str, _reader: &mut Tokenizer) -> Result<bool, DispatchError> {
        let Some(reply) = self.0.get(name) else {
            return Ok(false);
        };
        ctx.reply(reply).await?;
        Ok(true)
    }
}

fn with_preset(builder: CommandBuilder, name: &str, presets: &Presets) -> CommandBuilder {
    match presets.get(name) {
        Some(cooldown) => builder.cooldown(Arc::clone(cooldown)),
        None => builder,
    }
}

/// Register every demo command, the tag fallback and the error reporter.
pub fn register_all(router: &Router, presets: &Presets) {
    let fun = Arc::new(Category::new("Fun", "Commands that do silly things."));
    let utility = Arc::new(Category::new("Utility", "Counters, maths and reminders."));
    let admin = Arc::new(
        Category::new("Admin", "Commands for people who manage the guild.").with_permission(require_permissions(
            "Manage Messages",
            Permissions::MANAGE_MESSAGES,
            PermissionChecks::MEMBER_CHANNEL,
        )),
    );
    let tags = Arc::new(Tags::default());

    let commands: Vec<Arc<dyn RunnableCommand>> = vec![
        ping(presets),
        echo(&fun, presets),
        tag_user(&fun, presets),
        add(&utility, presets),
        count(&utility, presets),
        remind(&utility, presets),
        math(&utility),
        set_tag(&admin, Arc::clone(&tags)),
    ];
    for command in commands {
        router.set_command(command);
    }

    router.set_custom_commands_handler(TagLookup(tags));
    router.add_error_handler(ErrorReporter);
}

/// Replies with the message of user-facing errors; leaves the rest to the
/// router's log sink.
struct ErrorReporter;

#[async_trait]
impl herald_commands::ErrorHandler for ErrorReporter {
    async fn handle(&self, ctx: &Context, err: &DispatchError) -> bool {
        if matches!(err, DispatchError::Other(_) | DispatchError::Panic(_)) {
            return false;
        }
        debug!(kind = err.kind().as_str(), "Reporting error to the invoker");
        ctx.reply(err.to_string()).await.is_ok()
    }
}

fn ping(presets: &Presets) -> Arc<dyn RunnableCommand> {
    with_preset(Command::builder("ping"), "ping", presets)
        .description("Responds with pong.")
        .run(|ctx| {
            Box::pin(async move {
                ctx.reply("Pong!").await?;
                Ok(())
            })
        })
        .build()
}

fn echo(category: &Arc<Category>, presets: &Presets) -> Arc<dyn RunnableCommand> {
    with_preset(Command::builder("echo"), "echo", presets)
        .alias("say")
        .description("Echos arguments.")
        .usage("<text> [extra]")
        .category(Arc::clone(category))
        .argument(ArgumentRule::new(string))
        .argument(ArgumentRule::new(string).optional())
        .run(|ctx| {
            Box::pin(async move {
                let first = ctx.arg_str(0).unwrap_or_default().to_string();
                ctx.reply(first).await?;
                if let Some(extra) = ctx.arg_str(1).map(str::to_string) {
                    ctx.reply(format!("Optional arg: {extra}")).await?;
                }
                Ok(())
            })
        })
        .build()
}

fn tag_user(category: &Arc<Category>, presets: &Presets) -> Arc<dyn RunnableCommand> {
    with_preset(Command::builder("tag"), "tag", presets)
        .description("Tags the user specified.")
        .usage("<user>")
        .category(Arc::clone(category))
        .argument(ArgumentRule::new(UserTransformer))
        .run(|ctx| {
            Box::pin(async move {
                let mention = ctx.arg(0).and_then(ArgValue::as_user).map(|u| u.mention());
                if let Some(mention) = mention {
                    ctx.reply(mention).await?;
                }
                Ok(())
            })
        })
        .build()
}

fn add(category: &Arc<Category>, presets: &Presets) -> Arc<dyn RunnableCommand> {
    with_preset(Command::builder("addandecho"), "addandecho", presets)
        .alias("add")
        .description("Adds numbers and echos the last argument.")
        .usage("<numbers...> <text>")
        .category(Arc::clone(category))
        .argument(ArgumentRule::new(int).greedy())
        .argument(ArgumentRule::new(string).remainder())
        .run(|ctx| {
            Box::pin(async move {
                let total: i64 = ctx
                    .arg_list(0)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(ArgValue::as_int)
                    .sum();
                let label = ctx.arg_str(1).unwrap_or_default().to_string();
                ctx.reply(format!("{label}: {total}")).await?;
                Ok(())
            })
        })
        .build()
}

fn count(category: &Arc<Category>, presets: &Presets) -> Arc<dyn RunnableCommand> {
    with_preset(Command::builder("count"), "count", presets)
        .description("Counts how often it was run in this guild.")
        .usage("[reset]")
        .category(Arc::clone(category))
        .argument(ArgumentRule::new(string).optional())
        .run(|ctx| {
            Box::pin(async move {
                let state = ctx.state();
                let reply = match ctx.arg_str(0) {
                    Some("reset") => format!("Counter reset from {}.", state.reset()),
                    _ => format!("Count: {}", state.add_one()),
                };
                ctx.reply(reply).await?;
                Ok(())
            })
        })
        .build()
}

fn remind(category: &Arc<Category>, presets: &Presets) -> Arc<dyn RunnableCommand> {
    with_preset(Command::builder("remind"), "remind", presets)
        .description("Replies with the text after the given delay.")
        .usage("<duration> <text>")
        .category(Arc::clone(category))
        .argument(ArgumentRule::new(duration))
        .argument(ArgumentRule::new(string).remainder())
        .run(|ctx| {
            Box::pin(async move {
                let delay = ctx.arg(0).and_then(ArgValue::as_duration).unwrap_or_default();
                let text = ctx.arg_str(1).unwrap_or_default().to_string();
                tokio::time::sleep(delay).await;
                ctx.reply(format!("{}: {text}", ctx.message.author.mention())).await?;
                Ok(())
            })
        })
        .build()
}

fn math(category: &Arc<Category>) -> Arc<dyn RunnableCommand> {
    let sum = Command::builder("sum")
        .description("Adds every number given.")
        .usage("<numbers...>")
        .argument(ArgumentRule::new(float).greedy())
        .run(|ctx| {
            Box::pin(async move {
                let total: f64 = ctx
                    .arg_list(0)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(ArgValue::as_float)
                    .sum();
                ctx.reply(total.to_string()).await?;
                Ok(())
            })
        })
        .build();

    let max = Command::builder("max")
        .description("Largest of the integers given.")
        .usage("<numbers...>")
        .argument(ArgumentRule::new(int).greedy())
        .run(|ctx| {
            Box::pin(async move {
                let largest = ctx
                    .arg_list(0)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(ArgValue::as_int)
                    .max();
                if let Some(largest) = largest {
                    ctx.reply(largest.to_string()).await?;
                }
                Ok(())
            })
        })
        .build();

    CommandGroup::builder("math")
        .description("Arithmetic helpers.")
        .category(Arc::clone(category))
        .subcommand(sum)
        .subcommand(max)
        .build()
}

fn set_tag(category: &Arc<Category>, tags: Arc<Tags>) -> Arc<dyn RunnableCommand> {
    Command::builder("settag")
        .description("Creates a tag; sending the tag name as a command replies with its text.")
        .usage("<name> <text>")
        .category(Arc::clone(category))
        .argument(ArgumentRule::new(string))
        .argument(ArgumentRule::new(string).remainder())
        .run(move |ctx| {
            let tags = Arc::clone(&tags);
            Box::pin(async move {
                let name = ctx.arg_str(0).unwrap_or_default().to_string();
                if ctx.router.get_command(&name).is_some() {
                    ctx.reply(format!("\"{name}\" is already a command.")).await?;
                    return Ok(());
                }
                tags.set(&name, ctx.arg_str(1).unwrap_or_default());
                ctx.reply(format!("Tag \"{name}\" saved.")).await?;
                Ok(())
            })
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ConsoleClient;
    use herald_commands::{DispatchOutcome, RouterConfig, StaticPrefix};
    use herald_config::ConsoleConfig;
    use parking_lot::Mutex;
    use std::io::Write;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock())
                .lines()
                .map(|l| l.trim_start_matches("[herald] ").to_string())
                .collect()
        }
    }

    fn bot() -> (Router, Arc<ConsoleClient>, Capture) {
        let capture = Capture::default();
        let client = Arc::new(ConsoleClient::with_writer(
            &ConsoleConfig::default(),
            Box::new(capture.clone()),
        ));
        let router = Router::new(RouterConfig {
            prefix_check: Some(Arc::new(StaticPrefix::new("%"))),
            ..RouterConfig::default()
        });
        register_all(&router, &Presets::new());
        (router, client, capture)
    }

    async fn say(router: &Router, client: &Arc<ConsoleClient>, line: &str) -> DispatchOutcome {
        router.process_message(client.clone(), client.message(line)).await
    }

    #[tokio::test]
    async fn demo_commands_reply() {
        let (router, client, capture) = bot();
        say(&router, &client, "%ping").await;
        say(&router, &client, "%say hello \"big world\"").await;
        say(&router, &client, "%add 1 2 3 total").await;
        say(&router, &client, "%math max 4 9 2").await;
        say(&router, &client, "%tag <@100>").await;
        say(&router, &client, "%count").await;
        say(&router, &client, "%count").await;
        assert_eq!(
            capture.lines(),
            vec![
                "Pong!",
                "hello",
                "Optional arg: big world",
                "total: 6",
                "9",
                "<@100>",
                "Count: 1",
                "Count: 2"
            ]
        );
    }

    #[tokio::test]
    async fn tags_answer_unknown_names() {
        let (router, client, capture) = bot();
        say(&router, &client, "%settag hi Hello there!").await;
        assert_eq!(say(&router, &client, "%hi").await, DispatchOutcome::Completed);
        assert_eq!(say(&router, &client, "%bye").await, DispatchOutcome::Failed);
        assert_eq!(
            capture.lines(),
            vec![
                "Tag \"hi\" saved.",
                "Hello there!",
                "The command \"bye\" does not exist."
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn preset_cooldowns_attach_by_name() {
        let capture = Capture::default();
        let client = Arc::new(ConsoleClient::with_writer(
            &ConsoleConfig::default(),
            Box::new(capture.clone()),
        ));
        let router = Router::new(RouterConfig {
            prefix_check: Some(Arc::new(StaticPrefix::new("%"))),
            ..RouterConfig::default()
        });
        let mut presets = Presets::new();
        presets.insert(
            "ping".into(),
            Arc::new(herald_commands::UserCooldown::new(1, std::time::Duration::from_secs(5))),
        );
        register_all(&router, &presets);

        say(&router, &client, "%ping").await;
        say(&router, &client, "%ping").await;
        tokio::time::sleep(std::time::Duration::from_millis(5001)).await;
        say(&router, &client, "%ping").await;
        assert_eq!(
            capture.lines(),
            vec!["Pong!", "This command has a 5 second cooldown.", "Pong!"]
        );
    }
}
