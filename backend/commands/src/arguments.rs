//! Argument rules and the resolver that applies them to a tokenizer.

use herald_core::DispatchError;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::tokenizer::Tokenizer;
use crate::transformers::Transformer;
use crate::value::ArgValue;

/// Resolved values by rule index; `None` marks an absent optional.
pub type ResolvedArgs = Vec<Option<ArgValue>>;

/// How one positional argument is read and converted.
#[derive(Clone)]
pub struct ArgumentRule {
    pub greedy: bool,
    pub optional: bool,
    /// Takes all remaining text; must be the last rule.
    pub remainder: bool,
    pub transformer: Arc<dyn Transformer>,
    pub default: Option<ArgValue>,
}

impl ArgumentRule {
    pub fn new(transformer: impl Transformer + 'static) -> Self {
        Self {
            greedy: false,
            optional: false,
            remainder: false,
            transformer: Arc::new(transformer),
            default: None,
        }
    }

    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn remainder(mut self) -> Self {
        self.remainder = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<ArgValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

impl fmt::Debug for ArgumentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentRule")
            .field("greedy", &self.greedy)
            .field("optional", &self.optional)
            .field("remainder", &self.remainder)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Apply `rules` in order to the text left in `reader`.
///
/// An optional single rule that finds no token and has no default ends
/// resolution: later rules stay `None` even if they have defaults.
pub async fn resolve_arguments(
    rules: &[ArgumentRule],
    reader: &mut Tokenizer,
    ctx: &Context,
) -> Result<ResolvedArgs, DispatchError> {
    let mut args: ResolvedArgs = vec![None; rules.len()];

    for (i, rule) in rules.iter().enumerate() {
        if rule.remainder {
            let rest = reader.take_remainder();
            let rest = rest.trim_matches(' ');
            if !rest.is_empty() {
                args[i] = Some(rule.transformer.transform(ctx, rest).await?);
            } else if let Some(default) = &rule.default {
                args[i] = Some(default.clone());
            } else if !rule.optional {
                return Err(DispatchError::InvalidArgCount(
                    "Remainder expected but none was given.".into(),
                ));
            }
            break;
        }

        if rule.greedy {
            args[i] = resolve_greedy(rule, reader, ctx).await?;
            continue;
        }

        let token = reader.next_token();
        if token.is_empty() {
            if let Some(default) = &rule.default {
                args[i] = Some(default.clone());
                continue;
            }
            if rule.optional {
                break;
            }
            return Err(DispatchError::InvalidArgCount(
                "A required argument is missing.".into(),
            ));
        }
        args[i] = Some(rule.transformer.transform(ctx, &token.text).await?);
    }

    Ok(args)
}

/// Collect tokens until one is missing or fails to convert. A failing token
/// after the first is handed back to the reader for the next rule.
async fn resolve_greedy(
    rule: &ArgumentRule,
    reader: &mut Tokenizer,
    ctx: &Context,
) -> Result<Option<ArgValue>, DispatchError> {
    let mut collected = Vec::new();

    loop {
        let token = reader.next_token();
        let first = collected.is_empty();

        if token.is_empty() {
            if first {
                if let Some(default) = &rule.default {
                    return Ok(Some(default.clone()));
                }
                if !rule.optional {
                    return Err(DispatchError::InvalidArgCount(
                        "Expected an argument for the greedy converter.".into(),
                    ));
                }
            }
            break;
        }

        match rule.transformer.transform(ctx, &token.text).await {
            Ok(value) => collected.push(value),
            Err(e) if first => return Err(e),
            Err(_) => {
                reader.rewind(token.consumed);
                break;
            }
        }
    }

    Ok(Some(ArgValue::List(collected)))
}
