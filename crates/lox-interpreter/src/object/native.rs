use crate::object::{Callable, Object};
use crate::Interpreter;

use gc::{Finalize, Trace};
use lox_common::error::{Error, Result};
use lox_common::types::Span;

use std::fmt::{self, Debug, Display, Formatter};
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A function implemented by the host.
///
/// Implementations must not hold on to [`Object`]s they are given: they are
/// invisible to the garbage collector.
pub trait NativeFunction {
    fn name(&self) -> &str;

    fn arity(&self) -> usize;

    fn call(&self, args: Vec<Object>) -> Result<Object, Error>;
}

#[derive(Clone)]
pub struct Native(Rc<dyn NativeFunction>);

impl Native {
    pub fn new(native: impl NativeFunction + 'static) -> Self {
        Self(Rc::new(native))
    }
}

impl Callable for Native {
    fn arity(&self) -> usize {
        self.0.arity()
    }

    fn name(&self) -> &str {
        self.0.name()
    }

    fn call_unchecked<Stdout: Write>(
        &self,
        _interpreter: &mut Interpreter<Stdout>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object> {
        self.0.call(args).map_err(|e| (e, span.clone()))
    }
}

impl Debug for Native {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Native").field(&self.name()).finish()
    }
}

impl Display for Native {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<native func {}>", self.name())
    }
}

impl PartialEq for Native {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.0) as *const () == Rc::as_ptr(&other.0) as *const ()
    }
}

impl Finalize for Native {}

// SAFETY: natives are host objects and never own garbage-collected pointers.
unsafe impl Trace for Native {
    gc::unsafe_empty_trace!();
}

/// `clock()`: milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct Clock;

impl NativeFunction for Clock {
    fn name(&self) -> &str {
        "clock"
    }

    fn arity(&self) -> usize {
        0
    }

    fn call(&self, _args: Vec<Object>) -> Result<Object, Error> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Ok(Object::Number(now.as_millis() as f64))
    }
}
