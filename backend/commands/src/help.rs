//! Built-in `help` command.

use herald_core::DispatchError;
use std::sync::Arc;

use crate::arguments::ArgumentRule;
use crate::command::{Command, RunnableCommand};
use crate::context::Context;
use crate::pipeline::command_has_permission;
use crate::router::CategoryGroup;
use crate::transformers::{Transformer, any_of, string, uint};

const COMMANDS_PER_PAGE: usize = 5;

/// `help [page/command]`: one command's usage, or a page of the commands
/// the caller may run.
pub fn default_help_command() -> Arc<dyn RunnableCommand> {
    let page_or_name: Vec<Arc<dyn Transformer>> = vec![Arc::new(uint), Arc::new(string)];
    Command::builder("help")
        .description("Used to get help for a command.")
        .usage("[page/command]")
        .argument(ArgumentRule::new(any_of(page_or_name)).optional())
        .run(|ctx| Box::pin(run_help(ctx)))
        .build()
}

async fn run_help(ctx: &mut Context) -> Result<(), DispatchError> {
    if let Some(name) = ctx.arg_str(0).map(str::to_lowercase) {
        let text = describe_command(ctx, &name).await;
        ctx.reply(text).await?;
        return Ok(());
    }

    let requested = ctx.arg_uint(0).unwrap_or(1);
    let groups = ctx.router.get_commands_ordered_by_category();
    let pages = build_pages(ctx, groups).await;
    if pages.is_empty() {
        ctx.reply("There are no commands you can run.").await?;
        return Ok(());
    }

    let index = usize::try_from(requested)
        .unwrap_or(usize::MAX)
        .clamp(1, pages.len())
        - 1;
    let footer = format!(
        "Use {}help <page number> to flick between pages.",
        ctx.prefix
    );
    ctx.reply(format!("{}\n\n{footer}", pages[index])).await?;
    Ok(())
}

async fn describe_command(ctx: &Context, name: &str) -> String {
    let Some(command) = ctx.router.get_command(name) else {
        return format!("The command \"{name}\" was not found.");
    };

    let mut text = format!("{}{} {}", ctx.prefix, name, command.usage())
        .trim_end()
        .to_string();
    text.push('\n');
    text.push_str(description_or_default(command.as_ref()));
    if !command_has_permission(ctx, command.as_ref()).await {
        text.push_str("\n\nYou do not have permission to run this.");
    }
    text
}

/// Render every category the caller can use into pages of at most
/// [`COMMANDS_PER_PAGE`] commands.
async fn build_pages(ctx: &Context, groups: Vec<CategoryGroup>) -> Vec<String> {
    let mut pages = Vec::new();
    for group in groups {
        let mut runnable = Vec::with_capacity(group.commands.len());
        for command in group.commands {
            if command_has_permission(ctx, command.as_ref()).await {
                runnable.push(command);
            }
        }
        if runnable.is_empty() {
            continue;
        }

        let (title, description) = match &group.category {
            Some(category) => (category.name.as_str(), category.description.as_str()),
            None => (
                "General Commands",
                "These commands have not been assigned a category yet.",
            ),
        };
        let chunks: Vec<_> = runnable.chunks(COMMANDS_PER_PAGE).collect();
        let total = chunks.len();
        for (i, chunk) in chunks.into_iter().enumerate() {
            let mut page = format!("{title} [{}/{total}]", i + 1);
            if !description.is_empty() {
                page.push('\n');
                page.push_str(description);
            }
            for command in chunk {
                let line = format!("{}{} {}", ctx.prefix, command.name(), command.usage());
                page.push_str("\n\n");
                page.push_str(line.trim_end());
                page.push('\n');
                page.push_str(description_or_default(command.as_ref()));
            }
            pages.push(page);
        }
    }
    pages
}

fn description_or_default(command: &dyn RunnableCommand) -> &str {
    match command.description() {
        "" => "No description set.",
        description => description,
    }
}

#[cfg(test)]
mod tests {
    use crate::category::Category;
    use crate::command::Command;
    use crate::context::Context;
    use crate::router::{Router, RouterConfig};
    use crate::test_helpers::{MockClient, mock_message};
    use crate::prefix::StaticPrefix;
    use std::sync::Arc;

    fn help_router() -> Router {
        Router::new(RouterConfig {
            prefix_check: Some(Arc::new(StaticPrefix::new("%"))),
            ..RouterConfig::default()
        })
    }

    async fn ask(router: &Router, content: &str) -> String {
        let client = Arc::new(MockClient::default());
        router.process_message(client.clone(), mock_message(content)).await;
        client.sent_text().join("\n---\n")
    }

    #[tokio::test]
    async fn describes_a_single_command() {
        let router = help_router();
        router.set_command(Command::builder("ping").usage("[target]").build());
        router.set_command(
            Command::builder("secret")
                .description("Hidden.")
                .permission(|_: &Context| -> Result<(), String> { Err("no".to_string()) })
                .build(),
        );

        assert_eq!(ask(&router, "%help PING").await, "%ping [target]\nNo description set.");
        assert_eq!(
            ask(&router, "%help secret").await,
            "%secret\nHidden.\n\nYou do not have permission to run this."
        );
        assert_eq!(ask(&router, "%help nope").await, "The command \"nope\" was not found.");
    }

    #[tokio::test]
    async fn pages_by_category() {
        let router = help_router();
        let fun = Arc::new(Category::new("Fun", "Silly things"));
        for name in ["a1", "a2", "a3", "a4", "a5", "a6"] {
            router.set_command(Command::builder(name).category(fun.clone()).build());
        }
        router.set_command(
            Command::builder("hidden")
                .permission(|_: &Context| -> Result<(), String> { Err("no".to_string()) })
                .build(),
        );

        let first = ask(&router, "%help").await;
        assert!(first.starts_with("General Commands [1/1]\nThese commands have not been assigned a category yet."));
        assert!(first.contains("%help [page/command]\nUsed to get help for a command."));
        assert!(!first.contains("hidden"));
        assert!(first.ends_with("Use %help <page number> to flick between pages."));

        let second = ask(&router, "%help 2").await;
        assert!(second.starts_with("Fun [1/2]\nSilly things"));
        assert!(second.contains("%a5\nNo description set."));
        assert!(!second.contains("%a6"));

        let clamped = ask(&router, "%help 99").await;
        assert!(clamped.starts_with("Fun [2/2]"));
        assert!(clamped.contains("%a6"));
    }
}
