use std::sync::Arc;

use crate::command::{Middleware, PermissionValidator};
use crate::cooldown::Cooldown;

/// A named group of commands sharing permission, middleware and cooldown
/// layers. Those layers run before the command's own.
///
/// Categories are compared by pointer, so share one `Arc<Category>` between
/// the commands that belong to it.
#[derive(Default)]
pub struct Category {
    pub name: String,
    pub description: String,
    pub permission_validators: Vec<Arc<dyn PermissionValidator>>,
    pub middleware: Vec<Arc<dyn Middleware>>,
    pub cooldown: Option<Arc<dyn Cooldown>>,
}

impl Category {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_permission(mut self, validator: impl PermissionValidator + 'static) -> Self {
        self.permission_validators.push(Arc::new(validator));
        self
    }

    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn with_cooldown(mut self, cooldown: Arc<dyn Cooldown>) -> Self {
        self.cooldown = Some(cooldown);
        self
    }
}

impl std::fmt::Debug for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Category")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
