use thiserror::Error;

/// Every failure a dispatch can end in.
///
/// The display text of the message-carrying variants is the message itself so
/// that error handlers can relay it to the user unchanged.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    CommandNotFound(String),

    /// No command token was present, or a group got no sub-command and has no fallback.
    #[error("{0}")]
    CommandBlank(String),

    #[error("{0}")]
    IncorrectPermissions(String),

    #[error("{0}")]
    CommandOnCooldown(String),

    /// A required argument or remainder was missing.
    #[error("{0}")]
    InvalidArgCount(String),

    /// A conversion function rejected its input.
    #[error("{0}")]
    InvalidTransformation(String),

    /// A handler or pipeline step panicked with a string payload.
    #[error("{0}")]
    Panic(String),

    /// Handler, middleware or client failure, propagated verbatim.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Fieldless mirror of [`DispatchError`] for matching in error handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CommandNotFound,
    CommandBlank,
    IncorrectPermissions,
    CommandOnCooldown,
    InvalidArgCount,
    InvalidTransformation,
    Panic,
    Other,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::CommandNotFound => "command_not_found",
            ErrorKind::CommandBlank => "command_blank",
            ErrorKind::IncorrectPermissions => "incorrect_permissions",
            ErrorKind::CommandOnCooldown => "command_on_cooldown",
            ErrorKind::InvalidArgCount => "invalid_arg_count",
            ErrorKind::InvalidTransformation => "invalid_transformation",
            ErrorKind::Panic => "panic",
            ErrorKind::Other => "other",
        }
    }
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::CommandNotFound(_) => ErrorKind::CommandNotFound,
            DispatchError::CommandBlank(_) => ErrorKind::CommandBlank,
            DispatchError::IncorrectPermissions(_) => ErrorKind::IncorrectPermissions,
            DispatchError::CommandOnCooldown(_) => ErrorKind::CommandOnCooldown,
            DispatchError::InvalidArgCount(_) => ErrorKind::InvalidArgCount,
            DispatchError::InvalidTransformation(_) => ErrorKind::InvalidTransformation,
            DispatchError::Panic(_) => ErrorKind::Panic,
            DispatchError::Other(_) => ErrorKind::Other,
        }
    }

    pub fn invalid_transformation(description: impl Into<String>) -> Self {
        DispatchError::InvalidTransformation(description.into())
    }
}
