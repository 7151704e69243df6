mod callable;
mod function;
mod native;

use std::fmt::{self, Display, Formatter};

pub use callable::Callable;
pub use function::Function;
use gc::{Finalize, Trace};
pub use native::{Clock, Native, NativeFunction};

#[remain::sorted]
#[derive(Clone, Debug, Finalize, Trace)]
pub enum Object {
    Bool(bool),
    Function(Function),
    Native(Native),
    Nil,
    Number(f64),
    String(String),
}

impl Object {
    /// Truthiness: only `nil` and `false` are falsy.
    pub fn bool(&self) -> bool {
        !matches!(self, Object::Nil | Object::Bool(false))
    }

    pub fn type_(&self) -> String {
        match self {
            Object::Bool(_) => "bool".to_string(),
            Object::Function(_) | Object::Native(_) => "function".to_string(),
            Object::Nil => "nil".to_string(),
            Object::Number(_) => "number".to_string(),
            Object::String(_) => "string".to_string(),
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Object::Bool(bool) => write!(f, "{bool}"),
            Object::Function(function) => write!(f, "{function}"),
            Object::Native(native) => write!(f, "{native}"),
            Object::Nil => write!(f, "nil"),
            Object::Number(number) => write!(f, "{number}"),
            Object::String(string) => write!(f, "{string}"),
        }
    }
}

/// Values compare by value, callables by identity. Mismatched types are
/// unequal rather than an error.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Bool(b1), Object::Bool(b2)) => b1 == b2,
            (Object::Function(f1), Object::Function(f2)) => f1 == f2,
            (Object::Native(n1), Object::Native(n2)) => n1 == n2,
            (Object::Nil, Object::Nil) => true,
            (Object::Number(n1), Object::Number(n2)) => n1 == n2,
            (Object::String(s1), Object::String(s2)) => s1 == s2,
            _ => false,
        }
    }
}
