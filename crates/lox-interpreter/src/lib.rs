mod env;
mod interpreter;
mod object;

pub use crate::env::Env;
pub use crate::interpreter::Interpreter;
pub use crate::object::{Callable, Clock, Function, Native, NativeFunction, Object};
