pub mod client;
pub mod error;
pub mod permissions;
pub mod types;

pub use client::ChatClient;
pub use error::{DispatchError, ErrorKind};
pub use permissions::Permissions;
pub use types::{Channel, ChatMessage, Guild, Member, Role, SentMessage, Snowflake, User};
