use crate::env::Env;
use crate::interpreter::Flow;
use crate::object::{Callable, Object};
use crate::Interpreter;

use gc::{Finalize, Gc, Trace};
use lox_common::error::Result;
use lox_common::types::Span;
use lox_syntax::ast::{StmtFunc, StmtS};

use std::fmt::{self, Debug, Display, Formatter};
use std::io::Write;
use std::ops::Deref;
use std::rc::Rc;

/// A user-defined function together with the scope it was declared in.
#[derive(Clone, Finalize, Trace)]
pub struct Function(Gc<FunctionImpl>);

impl Function {
    pub fn new(decl: &Rc<StmtFunc>, env: &Env) -> Self {
        Function(Gc::new(FunctionImpl { decl: Rc::clone(decl), env: env.clone() }))
    }

    pub fn params(&self) -> &[String] {
        &self.decl.params
    }

    pub fn stmts(&self) -> &[StmtS] {
        &self.decl.body.stmts
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.decl.params.len()
    }

    fn name(&self) -> &str {
        &self.decl.name
    }

    fn call_unchecked<Stdout: Write>(
        &self,
        interpreter: &mut Interpreter<Stdout>,
        args: Vec<Object>,
        _span: &Span,
    ) -> Result<Object> {
        tracing::trace!(name = self.name(), "calling function");

        // Parameters live in a fresh scope whose parent is the closure, not
        // the caller's scope.
        let env = Env::with_parent(&self.env);
        for (param, arg) in self.params().iter().zip(args) {
            env.define(param, arg);
        }
        match interpreter.run_stmts(&env, self.stmts())? {
            Flow::Return(object) => Ok(object),
            Flow::Normal => Ok(Object::Nil),
        }
    }
}

impl Debug for Function {
    // The captured scope may contain this very function.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("name", &self.name()).finish_non_exhaustive()
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<func {}>", self.name())
    }
}

impl Deref for Function {
    type Target = FunctionImpl;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Eq for Function {}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Finalize, Trace)]
pub struct FunctionImpl {
    #[unsafe_ignore_trace]
    pub decl: Rc<StmtFunc>,
    pub env: Env,
}
