//! Scoped environments for the LiveML evaluator.
//!
//! Top-level definitions live in a [`Namespace`]: values, constructors and
//! modules keyed by name. A namespace is shared behind an `Rc` and copied
//! on write, so a closure keeps seeing the definitions that existed when it
//! was created even after later units shadow them.
//!
//! Local bindings (`let ... in`, parameters, pattern variables) form a
//! persistent linked chain in front of the namespace.

use std::collections::BTreeMap;
use std::rc::Rc;

use liveml_types::ast::Path;

use crate::error::{EvalError, EvalResult};
use crate::value::{Constructor, Value};

/// One level of top-level definitions: the session itself or a module.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    pub values: BTreeMap<String, Value>,
    pub constructors: BTreeMap<String, Rc<Constructor>>,
    pub modules: BTreeMap<String, Rc<Namespace>>,
}

impl Namespace {
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Declare every constructor of a variant type, in declaration order.
    pub fn declare_type(&mut self, type_name: &str, ctors: &[(&str, usize)]) {
        for (tag, (name, arity)) in ctors.iter().enumerate() {
            self.constructors.insert(
                name.to_string(),
                Rc::new(Constructor {
                    name: name.to_string(),
                    type_name: type_name.to_string(),
                    tag,
                    arity: *arity,
                }),
            );
        }
    }

    /// Follow a chain of module names.
    pub fn module(&self, names: &[String]) -> EvalResult<&Namespace> {
        let mut current = self;
        for (i, name) in names.iter().enumerate() {
            current = current
                .modules
                .get(name)
                .ok_or_else(|| EvalError::UnboundModule(names[..=i].join(".")))?;
        }
        Ok(current)
    }

    /// Bring everything `module` defines into this namespace.
    pub fn open(&mut self, module: &Namespace) {
        for (name, value) in &module.values {
            self.values.insert(name.clone(), value.clone());
        }
        for (name, ctor) in &module.constructors {
            self.constructors.insert(name.clone(), ctor.clone());
        }
        for (name, nested) in &module.modules {
            self.modules.insert(name.clone(), nested.clone());
        }
    }
}

#[derive(Debug)]
struct Local {
    name: String,
    value: Value,
    parent: Option<Rc<Local>>,
    /// Deepest value bound here or in any parent.
    depth: usize,
}

/// The environment an expression is evaluated in.
#[derive(Debug, Clone)]
pub struct Env {
    ns: Rc<Namespace>,
    locals: Option<Rc<Local>>,
}

impl Env {
    pub fn new(ns: Rc<Namespace>) -> Self {
        Self { ns, locals: None }
    }

    pub fn namespace(&self) -> &Rc<Namespace> {
        &self.ns
    }

    /// A new environment with `name` bound in front of this one.
    pub fn bind(&self, name: impl Into<String>, value: Value) -> Env {
        let depth = value.depth().max(self.depth());
        Env {
            ns: self.ns.clone(),
            locals: Some(Rc::new(Local {
                name: name.into(),
                value,
                parent: self.locals.clone(),
                depth,
            })),
        }
    }

    /// Nesting depth of the deepest local binding.
    pub fn depth(&self) -> usize {
        self.locals.as_ref().map_or(0, |local| local.depth)
    }

    pub fn bind_all(&self, bindings: Vec<(String, Value)>) -> Env {
        bindings
            .into_iter()
            .fold(self.clone(), |env, (name, value)| env.bind(name, value))
    }

    /// Resolve a possibly qualified value name.
    pub fn lookup(&self, path: &Path) -> EvalResult<Option<Value>> {
        if path.is_qualified() {
            let module = self.ns.module(&path.modules)?;
            return Ok(module.values.get(&path.name).cloned());
        }
        let mut local = self.locals.as_deref();
        while let Some(frame) = local {
            if frame.name == path.name {
                return Ok(Some(frame.value.clone()));
            }
            local = frame.parent.as_deref();
        }
        Ok(self.ns.values.get(&path.name).cloned())
    }

    pub fn constructor(&self, path: &Path) -> EvalResult<Rc<Constructor>> {
        let ns = self.ns.module(&path.modules)?;
        ns.constructors
            .get(&path.name)
            .cloned()
            .ok_or_else(|| EvalError::UnboundConstructor(path.to_string()))
    }
}
