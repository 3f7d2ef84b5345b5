use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use herald_core::{Channel, Role, Snowflake, User};

/// A typed argument value produced by a transformer.
#[derive(Clone)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Id(Snowflake),
    Duration(Duration),
    User(User),
    Channel(Channel),
    Role(Role),
    /// Values collected by a greedy rule.
    List(Vec<ArgValue>),
    /// Anything a user-defined transformer produces.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl ArgValue {
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        ArgValue::Custom(Arc::new(value))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            ArgValue::UInt(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ArgValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<Snowflake> {
        match self {
            ArgValue::Id(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            ArgValue::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            ArgValue::User(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&Channel> {
        match self {
            ArgValue::Channel(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_role(&self) -> Option<&Role> {
        match self {
            ArgValue::Role(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            ArgValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            ArgValue::Custom(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Str(s) => f.debug_tuple("Str").field(s).finish(),
            ArgValue::Int(i) => f.debug_tuple("Int").field(i).finish(),
            ArgValue::UInt(u) => f.debug_tuple("UInt").field(u).finish(),
            ArgValue::Float(v) => f.debug_tuple("Float").field(v).finish(),
            ArgValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            ArgValue::Id(id) => f.debug_tuple("Id").field(id).finish(),
            ArgValue::Duration(d) => f.debug_tuple("Duration").field(d).finish(),
            ArgValue::User(u) => f.debug_tuple("User").field(u).finish(),
            ArgValue::Channel(c) => f.debug_tuple("Channel").field(c).finish(),
            ArgValue::Role(r) => f.debug_tuple("Role").field(r).finish(),
            ArgValue::List(items) => f.debug_tuple("List").field(items).finish(),
            ArgValue::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArgValue::Str(a), ArgValue::Str(b)) => a == b,
            (ArgValue::Int(a), ArgValue::Int(b)) => a == b,
            (ArgValue::UInt(a), ArgValue::UInt(b)) => a == b,
            (ArgValue::Float(a), ArgValue::Float(b)) => a == b,
            (ArgValue::Bool(a), ArgValue::Bool(b)) => a == b,
            (ArgValue::Id(a), ArgValue::Id(b)) => a == b,
            (ArgValue::Duration(a), ArgValue::Duration(b)) => a == b,
            (ArgValue::User(a), ArgValue::User(b)) => a == b,
            (ArgValue::Channel(a), ArgValue::Channel(b)) => a == b,
            (ArgValue::Role(a), ArgValue::Role(b)) => a == b,
            (ArgValue::List(a), ArgValue::List(b)) => a == b,
            (ArgValue::Custom(a), ArgValue::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Str(s)
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Str(s.to_string())
    }
}

impl From<i64> for ArgValue {
    fn from(i: i64) -> Self {
        ArgValue::Int(i)
    }
}

impl From<u64> for ArgValue {
    fn from(u: u64) -> Self {
        ArgValue::UInt(u)
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

impl From<Vec<ArgValue>> for ArgValue {
    fn from(items: Vec<ArgValue>) -> Self {
        ArgValue::List(items)
    }
}
