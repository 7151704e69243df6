use lox_common::error::{Error, Result, TypeError};
use lox_common::types::Span;

use crate::object::Object;
use crate::Interpreter;

use std::io::Write;

pub trait Callable {
    fn arity(&self) -> usize;

    fn name(&self) -> &str;

    /// Invokes the callable; `args.len()` has already been checked against
    /// [`Callable::arity`].
    fn call_unchecked<Stdout: Write>(
        &self,
        interpreter: &mut Interpreter<Stdout>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object>;

    fn call<Stdout: Write>(
        &self,
        interpreter: &mut Interpreter<Stdout>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object> {
        let exp_args = self.arity();
        let got_args = args.len();
        if exp_args != got_args {
            return Err((
                Error::TypeError(TypeError::ArityMismatch { exp_args, got_args }),
                span.clone(),
            ));
        }
        self.call_unchecked(interpreter, args, span)
    }
}
