use std::ops::Deref;

use gc::{Finalize, Gc, GcCell, Trace};
use lox_common::error::{Error, NameError, Result};
use lox_common::types::Span;
use rustc_hash::FxHashMap;

use crate::object::Object;

/// A lexical scope. Cloning an `Env` yields another handle to the same
/// scope, which is how closures keep their defining scope alive and see
/// later writes to it.
#[derive(Clone, Debug, Finalize, Trace)]
pub struct Env(Gc<GcCell<EnvImpl>>);

impl Deref for Env {
    type Target = Gc<GcCell<EnvImpl>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for Env {
    fn default() -> Self {
        Self(Gc::new(GcCell::new(EnvImpl::default())))
    }
}

impl Env {
    pub fn with_parent(parent: &Env) -> Self {
        let env = EnvImpl { map: FxHashMap::default(), parent: Some(parent.clone()) };
        Self(Gc::new(GcCell::new(env)))
    }

    /// Binds `name` in this scope, replacing any previous binding here.
    pub fn define(&self, name: &str, value: Object) {
        self.borrow_mut().map.insert(name.to_string(), value);
    }

    /// Looks `name` up in this scope, then each enclosing scope in turn.
    pub fn get(&self, name: &str, span: &Span) -> Result<Object> {
        let env = self.borrow();
        if let Some(object) = env.map.get(name) {
            return Ok(object.clone());
        }
        match &env.parent {
            Some(parent) => parent.get(name, span),
            None => Err(not_defined(name, span)),
        }
    }

    /// Overwrites the nearest existing binding of `name`. Never creates one.
    pub fn assign(&self, name: &str, value: Object, span: &Span) -> Result<()> {
        let parent = {
            let mut env = self.borrow_mut();
            if let Some(entry) = env.map.get_mut(name) {
                *entry = value;
                return Ok(());
            }
            env.parent.clone()
        };
        match parent {
            Some(parent) => parent.assign(name, value, span),
            None => Err(not_defined(name, span)),
        }
    }
}

fn not_defined(name: &str, span: &Span) -> (Error, Span) {
    (Error::NameError(NameError::NotDefined { name: name.to_string() }), span.clone())
}

#[derive(Debug, Default, Finalize, Trace)]
pub struct EnvImpl {
    map: FxHashMap<String, Object>,
    parent: Option<Env>,
}
