//! Execution pipeline: permissions → cooldowns → middleware → arguments →
//! handler, across the global, category and command layers.

use futures::FutureExt;
use futures::future::BoxFuture;
use herald_core::DispatchError;
use herald_logging::{DispatchEvent, DispatchLogger};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

use crate::arguments::resolve_arguments;
use crate::command::{Middleware, PermissionValidator, RunnableCommand};
use crate::context::Context;
use crate::cooldown::{Cooldown, same_cooldown};
use crate::router::Router;
use crate::tokenizer::Tokenizer;

/// Run `command` over the text left in `reader`.
///
/// Panics anywhere in the pipeline are caught here and returned as errors.
/// Command groups call back into this for their sub-commands.
pub fn run_command<'a>(
    ctx: &'a mut Context,
    reader: Tokenizer,
    command: Arc<dyn RunnableCommand>,
) -> BoxFuture<'a, Result<(), DispatchError>> {
    Box::pin(async move {
        let name = command.name().to_string();
        let invocation_id = ctx.invocation_id.to_string();
        let channel_id = ctx.message.channel_id.to_string();

        match AssertUnwindSafe(execute(ctx, reader, command))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => {
                let err = panic_to_error(payload);
                error!(command = %name, invocation_id = %invocation_id, error = %err, "Recovered from command panic");
                DispatchLogger::log_event(
                    &invocation_id,
                    &channel_id,
                    DispatchEvent::PanicRecovered {
                        command: name,
                        panic_msg: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    })
}

async fn execute(
    ctx: &mut Context,
    mut reader: Tokenizer,
    command: Arc<dyn RunnableCommand>,
) -> Result<(), DispatchError> {
    ctx.command = Some(Arc::clone(&command));
    ctx.raw_args = reader.remainder().to_string();
    let router = ctx.router.clone();

    for validator in permission_layers(&router, command.as_ref()) {
        if let Err(msg) = validator.validate(ctx).await {
            debug!(command = %command.name(), reason = %msg, "Permission check failed");
            return Err(DispatchError::IncorrectPermissions(msg));
        }
    }

    check_cooldowns(ctx, &router, command.as_ref()).await?;

    for middleware in middleware_layers(&router, command.as_ref()) {
        middleware.run(ctx).await?;
    }

    ctx.args = resolve_arguments(command.argument_rules(), &mut reader, ctx).await?;
    debug!(command = %command.name(), args = ?ctx.args, "Arguments resolved");

    command.execute(ctx).await
}

/// Global, then category, then command validators.
fn permission_layers(
    router: &Router,
    command: &dyn RunnableCommand,
) -> Vec<Arc<dyn PermissionValidator>> {
    let category = command.category().map(|c| c.permission_validators.as_slice());
    router
        .permission_validators()
        .iter()
        .chain(category.unwrap_or_default())
        .chain(command.permission_validators())
        .cloned()
        .collect()
}

fn middleware_layers(router: &Router, command: &dyn RunnableCommand) -> Vec<Arc<dyn Middleware>> {
    let category = command.category().map(|c| c.middleware.as_slice());
    router
        .middleware()
        .iter()
        .chain(category.unwrap_or_default())
        .chain(command.middleware())
        .cloned()
        .collect()
}

/// Command cooldown first. The category cooldown only counts when it is not
/// the command's or the global one; the global one only when it is not the
/// command's.
async fn check_cooldowns(
    ctx: &Context,
    router: &Router,
    command: &dyn RunnableCommand,
) -> Result<(), DispatchError> {
    let local = command.cooldown();
    let category = command.category().and_then(|c| c.cooldown.as_ref());
    let global = router.cooldown();

    let shares_with = |cooldown: &Arc<dyn Cooldown>, other: Option<&Arc<dyn Cooldown>>| {
        other.is_some_and(|o| same_cooldown(cooldown, o))
    };

    let mut chain: Vec<&Arc<dyn Cooldown>> = Vec::with_capacity(3);
    chain.extend(local);
    if let Some(cooldown) = category {
        if !shares_with(cooldown, local) && !shares_with(cooldown, global) {
            chain.push(cooldown);
        }
    }
    if let Some(cooldown) = global {
        if !shares_with(cooldown, local) {
            chain.push(cooldown);
        }
    }

    for cooldown in chain {
        if let Err(msg) = cooldown.check(ctx).await {
            debug!(command = %command.name(), reason = %msg, "Cooldown rejected invocation");
            return Err(DispatchError::CommandOnCooldown(msg));
        }
    }
    Ok(())
}

/// Whether the invoker passes every permission layer of `command`.
/// Cooldowns and middleware are not consulted.
pub async fn command_has_permission(ctx: &Context, command: &dyn RunnableCommand) -> bool {
    for validator in permission_layers(&ctx.router, command) {
        if validator.validate(ctx).await.is_err() {
            return false;
        }
    }
    true
}

/// String payloads become [`DispatchError::Panic`]; a `DispatchError` or
/// `anyhow::Error` raised with `panic_any` passes through as is.
fn panic_to_error(payload: Box<dyn Any + Send>) -> DispatchError {
    let payload = match payload.downcast::<DispatchError>() {
        Ok(err) => return *err,
        Err(payload) => payload,
    };
    let payload = match payload.downcast::<anyhow::Error>() {
        Ok(err) => return DispatchError::Other(*err),
        Err(payload) => payload,
    };
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return DispatchError::Panic((*msg).to_string());
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return DispatchError::Panic(msg.clone());
    }
    DispatchError::Panic("command panicked with a non-string payload".into())
}
