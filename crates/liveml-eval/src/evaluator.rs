//! Core expression and item evaluator.
//!
//! Calls in tail position are not evaluated recursively: `eval_tail`
//! hands the pending call back to `apply`, which loops. Only non-tail
//! calls deepen the native stack, and those are bounded by
//! [`Limits::max_depth`].
//!
//! The same limit bounds how deeply data may nest. Printing, comparing,
//! dropping and drawing a value all recurse once per level, so a value
//! nested past the limit is rejected when it is built.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use liveml_types::ast::*;

use crate::env::{Env, Namespace};
use crate::error::{EvalError, EvalResult};
use crate::graphics;
use crate::limits::{CancelToken, Limits};
use crate::natives;
use crate::ops;
use crate::pattern::matches;
use crate::value::{Closure, Constructor, FunBody, FunDef, List, NativeCall, RecGroup, Value, Variant};

/// Gas ticks between checks of the cancel flag and the clock.
const POLL_INTERVAL: u64 = 1024;

/// The result of evaluating an expression in tail position.
enum Flow {
    Value(Value),
    /// A call left for the caller's trampoline.
    Call(Value, Vec<Value>),
}

/// The core evaluator: walks AST nodes and produces values.
pub struct Evaluator {
    /// Built-in types, natives and modules. Every session namespace starts
    /// as a copy of this.
    builtins: Rc<Namespace>,
    limits: Limits,
    cancel: CancelToken,
    /// Gas consumed by the current unit.
    gas: u64,
    /// Nested non-tail calls in progress.
    depth: usize,
    /// Only set when a timeout is configured; `Instant` is unavailable on
    /// browser targets.
    deadline: Option<Instant>,
    stdout: String,
    stderr: String,
    /// Function definitions already lifted out of the current unit's AST,
    /// keyed by node address. Cleared with every unit, while that AST is
    /// still alive.
    fun_defs: HashMap<*const Expr, Rc<FunDef>>,
}

impl Evaluator {
    pub fn new(limits: Limits, cancel: CancelToken) -> Self {
        let mut builtins = Namespace::default();
        natives::install(&mut builtins);
        graphics::declare(&mut builtins);
        Self {
            builtins: Rc::new(builtins),
            limits,
            cancel,
            gas: 0,
            depth: 0,
            deadline: None,
            stdout: String::new(),
            stderr: String::new(),
            fun_defs: HashMap::new(),
        }
    }

    /// A fresh namespace holding only the built-ins.
    pub fn base_namespace(&self) -> Rc<Namespace> {
        self.builtins.clone()
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Reset the per-unit budget and output buffers.
    pub fn begin_unit(&mut self) {
        self.gas = 0;
        self.depth = 0;
        self.deadline = self.limits.timeout.map(|t| Instant::now() + t);
        self.stdout.clear();
        self.stderr.clear();
        self.fun_defs.clear();
    }

    /// Gas consumed since the last [`begin_unit`](Self::begin_unit).
    pub fn gas_used(&self) -> u64 {
        self.gas
    }

    /// Take the text printed since the last call, as `(stdout, stderr)`.
    pub fn take_output(&mut self) -> (String, String) {
        (
            std::mem::take(&mut self.stdout),
            std::mem::take(&mut self.stderr),
        )
    }

    pub(crate) fn print(&mut self, text: &str) {
        self.stdout.push_str(text);
    }

    pub(crate) fn eprint(&mut self, text: &str) {
        self.stderr.push_str(text);
    }

    /// Build a value with the built-in constructor `name`.
    pub(crate) fn construct(&self, name: &str, args: Vec<Value>) -> EvalResult<Value> {
        let ctor = graphics::builtin_constructor(&self.builtins, name)?;
        Ok(Variant::value(ctor, args))
    }

    /// Consume one unit of gas, polling the cancel flag and the clock
    /// every [`POLL_INTERVAL`] units.
    pub(crate) fn tick(&mut self) -> EvalResult<()> {
        self.gas += 1;
        if self.gas > self.limits.gas {
            return Err(EvalError::GasExhausted(self.limits.gas));
        }
        if self.gas % POLL_INTERVAL == 0 {
            if self.cancel.is_cancelled() {
                return Err(EvalError::Cancelled);
            }
            if let (Some(deadline), Some(timeout)) = (self.deadline, self.limits.timeout) {
                if Instant::now() >= deadline {
                    return Err(EvalError::Timeout(timeout.as_millis() as u64));
                }
            }
        }
        Ok(())
    }

    /// Reject a freshly built value nested deeper than the depth limit.
    fn bounded(&self, value: Value) -> EvalResult<Value> {
        if value.depth() > self.limits.max_depth {
            return Err(EvalError::DataTooDeep(self.limits.max_depth));
        }
        Ok(value)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Items
    // ══════════════════════════════════════════════════════════════════════

    /// Execute one top-level item against `ns`.
    ///
    /// Returns the value of an expression item and `None` for definitions.
    /// A failing item leaves `ns` untouched.
    pub fn exec_item(&mut self, ns: &mut Rc<Namespace>, item: &Item) -> EvalResult<Option<Value>> {
        self.tick()?;
        match &item.kind {
            ItemKind::Expr(expr) => {
                let env = Env::new(ns.clone());
                self.eval(expr, &env).map(Some)
            }
            ItemKind::Let { rec, bindings } => {
                let env = Env::new(ns.clone());
                let bound = if *rec {
                    self.rec_bindings(&env, bindings)?
                } else {
                    self.let_bindings(&env, bindings)?
                };
                let ns = Rc::make_mut(ns);
                for (name, value) in bound {
                    ns.define(name, value);
                }
                Ok(None)
            }
            ItemKind::Type(decls) => {
                let ns = Rc::make_mut(ns);
                for decl in decls {
                    if let TypeBody::Variant(ctors) = &decl.body {
                        let ctors: Vec<(&str, usize)> = ctors
                            .iter()
                            .map(|c| (c.name.as_str(), c.args.len()))
                            .collect();
                        ns.declare_type(&decl.name, &ctors);
                    }
                }
                Ok(None)
            }
            ItemKind::Module { name, items } => {
                let module = self.exec_module(ns, items)?;
                Rc::make_mut(ns).modules.insert(name.clone(), Rc::new(module));
                Ok(None)
            }
            ItemKind::Open(path) => {
                let mut chain = path.modules.clone();
                chain.push(path.name.clone());
                let module = ns.module(&chain)?.clone();
                Rc::make_mut(ns).open(&module);
                Ok(None)
            }
        }
    }

    /// Run a module body on top of `outer` and collect what it defines.
    fn exec_module(&mut self, outer: &Rc<Namespace>, items: &[Item]) -> EvalResult<Namespace> {
        let mut inner = outer.clone();
        for item in items {
            self.exec_item(&mut inner, item)?;
        }
        let mut module = Namespace::default();
        for item in items {
            match &item.kind {
                ItemKind::Let { bindings, .. } => {
                    for binding in bindings {
                        for name in binding.pattern.bound_names() {
                            if let Some(value) = inner.values.get(name) {
                                module.define(name, value.clone());
                            }
                        }
                    }
                }
                ItemKind::Type(decls) => {
                    for decl in decls {
                        if let TypeBody::Variant(ctors) = &decl.body {
                            for ctor in ctors {
                                if let Some(c) = inner.constructors.get(&ctor.name) {
                                    module.constructors.insert(ctor.name.clone(), c.clone());
                                }
                            }
                        }
                    }
                }
                ItemKind::Module { name, .. } => {
                    if let Some(m) = inner.modules.get(name) {
                        module.modules.insert(name.clone(), m.clone());
                    }
                }
                ItemKind::Open(_) | ItemKind::Expr(_) => {}
            }
        }
        Ok(module)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Bindings
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate every right-hand side first, then destructure.
    fn let_bindings(&mut self, env: &Env, bindings: &[Binding]) -> EvalResult<Vec<(String, Value)>> {
        let mut bound = Vec::new();
        for binding in bindings {
            let value = self.eval(&binding.value, env)?;
            if !matches(&binding.pattern, &value, &mut bound) {
                return Err(EvalError::MatchFailure);
            }
        }
        Ok(bound)
    }

    fn rec_bindings(&mut self, env: &Env, bindings: &[Binding]) -> EvalResult<Vec<(String, Value)>> {
        let mut members = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let PatternKind::Var(name) = &binding.pattern.kind else {
                return Err(EvalError::InvalidRec);
            };
            members.push((name.clone(), self.fun_def(&binding.value)?));
        }
        let group = Rc::new(RecGroup {
            env: env.clone(),
            members,
        });
        group
            .members
            .iter()
            .map(|(name, def)| {
                let closure =
                    Closure::value(def.clone(), env.clone(), Some(group.clone()), Vec::new());
                Ok((name.clone(), self.bounded(closure)?))
            })
            .collect()
    }

    fn bind_let(&mut self, rec: bool, bindings: &[Binding], env: &Env) -> EvalResult<Env> {
        let bound = if rec {
            self.rec_bindings(env, bindings)?
        } else {
            self.let_bindings(env, bindings)?
        };
        Ok(env.bind_all(bound))
    }

    /// The function definition of a `fun`/`function` node, lifted out of
    /// the AST once per unit.
    fn fun_def(&mut self, expr: &Expr) -> EvalResult<Rc<FunDef>> {
        let key = expr as *const Expr;
        if let Some(def) = self.fun_defs.get(&key) {
            return Ok(def.clone());
        }
        let def = match &expr.kind {
            ExprKind::Fun { params, body } => FunDef {
                params: params.clone(),
                body: FunBody::Expr((**body).clone()),
            },
            ExprKind::Function(arms) => FunDef {
                params: Vec::new(),
                body: FunBody::Arms(arms.clone()),
            },
            _ => return Err(EvalError::InvalidRec),
        };
        let def = Rc::new(def);
        self.fun_defs.insert(key, def.clone());
        Ok(def)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a value.
    pub fn eval(&mut self, expr: &Expr, env: &Env) -> EvalResult<Value> {
        match self.eval_tail(expr, env)? {
            Flow::Value(value) => Ok(value),
            Flow::Call(func, args) => self.apply(func, args),
        }
    }

    fn eval_all(&mut self, exprs: &[Expr], env: &Env) -> EvalResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e, env)).collect()
    }

    fn eval_tail(&mut self, expr: &Expr, env: &Env) -> EvalResult<Flow> {
        self.tick()?;
        let value = match &expr.kind {
            ExprKind::Int(n) => Value::Int(*n),
            ExprKind::Float(x) => Value::Float(*x),
            ExprKind::Str(s) => Value::str(s.as_str()),
            ExprKind::Char(c) => Value::Char(*c),
            ExprKind::Bool(b) => Value::Bool(*b),
            ExprKind::Unit => Value::Unit,

            ExprKind::Var(path) => lookup(env, path)?,
            ExprKind::Constructor { path, args } => {
                let ctor = env.constructor(path)?;
                let args = self.eval_all(args, env)?;
                Variant::value(ctor.clone(), fix_arity(&ctor, args)?)
            }
            ExprKind::Tuple(items) => Value::tuple(self.eval_all(items, env)?),
            ExprKind::List { items, tail } => {
                let items = self.eval_all(items, env)?;
                let tail = match tail {
                    Some(tail) => self.eval(tail, env)?.as_list()?.clone(),
                    None => List::nil(),
                };
                Value::List(List::prepend(items, tail))
            }

            ExprKind::Apply { func, args } => {
                let func = self.eval(func, env)?;
                let args = self.eval_all(args, env)?;
                return Ok(Flow::Call(func, args));
            }
            ExprKind::Fun { .. } | ExprKind::Function(_) => {
                Closure::value(self.fun_def(expr)?, env.clone(), None, Vec::new())
            }

            ExprKind::Let {
                rec,
                bindings,
                body,
            } => {
                let env = self.bind_let(*rec, bindings, env)?;
                return self.eval_tail(body, &env);
            }
            ExprKind::Seq(first, rest) => {
                self.eval(first, env)?;
                return self.eval_tail(rest, env);
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond, env)?.as_bool()? {
                    return self.eval_tail(then_branch, env);
                }
                match else_branch {
                    Some(else_branch) => return self.eval_tail(else_branch, env),
                    None => Value::Unit,
                }
            }
            ExprKind::Match { scrutinee, arms } => {
                let value = self.eval(scrutinee, env)?;
                return self.match_arms(arms, value, env);
            }

            ExprKind::Unary { op, operand } => ops::unary(*op, self.eval(operand, env)?)?,
            ExprKind::Binary { op, left, right } => match op {
                BinOp::And => {
                    if !self.eval(left, env)?.as_bool()? {
                        Value::Bool(false)
                    } else {
                        return self.eval_tail(right, env);
                    }
                }
                BinOp::Or => {
                    if self.eval(left, env)?.as_bool()? {
                        Value::Bool(true)
                    } else {
                        return self.eval_tail(right, env);
                    }
                }
                BinOp::Custom(name) => {
                    let func = lookup(env, &Path::simple(name.as_str()))?;
                    let left = self.eval(left, env)?;
                    let right = self.eval(right, env)?;
                    return Ok(Flow::Call(func, vec![left, right]));
                }
                _ => {
                    let left = self.eval(left, env)?;
                    let right = self.eval(right, env)?;
                    ops::binary(op, left, right)?
                }
            },
        };
        Ok(Flow::Value(self.bounded(value)?))
    }

    fn match_arms(&mut self, arms: &[MatchArm], value: Value, env: &Env) -> EvalResult<Flow> {
        for arm in arms {
            let mut bound = Vec::new();
            if !matches(&arm.pattern, &value, &mut bound) {
                continue;
            }
            let arm_env = env.bind_all(bound);
            if let Some(guard) = &arm.guard {
                if !self.eval(guard, &arm_env)?.as_bool()? {
                    continue;
                }
            }
            return self.eval_tail(&arm.body, &arm_env);
        }
        Err(EvalError::MatchFailure)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Application
    // ══════════════════════════════════════════════════════════════════════

    /// Apply a function value to arguments.
    pub fn apply(&mut self, func: Value, args: Vec<Value>) -> EvalResult<Value> {
        if self.depth >= self.limits.max_depth {
            return Err(EvalError::DepthExceeded(self.limits.max_depth));
        }
        self.depth += 1;
        let result = self.trampoline(func, args);
        self.depth -= 1;
        result
    }

    fn trampoline(&mut self, mut func: Value, mut args: Vec<Value>) -> EvalResult<Value> {
        loop {
            self.tick()?;
            let (result, rest) = match func {
                Value::Closure(closure) => {
                    let arity = closure.def.arity();
                    let mut all = closure.applied.clone();
                    all.extend(args);
                    if all.len() < arity {
                        return self.bounded(Closure::value(
                            closure.def.clone(),
                            closure.env.clone(),
                            closure.group.clone(),
                            all,
                        ));
                    }
                    let rest = all.split_off(arity);
                    match self.enter(&closure, all)? {
                        Flow::Value(value) => (value, rest),
                        // A call in tail position replaces this one.
                        Flow::Call(next, next_args) if rest.is_empty() => {
                            func = next;
                            args = next_args;
                            continue;
                        }
                        Flow::Call(next, next_args) => (self.apply(next, next_args)?, rest),
                    }
                }
                Value::Native(call) => {
                    let mut all = call.args.clone();
                    all.extend(args);
                    let required = call.native.required(&all)?;
                    if all.len() < required {
                        return self.bounded(NativeCall::value(call.native, all));
                    }
                    let rest = all.split_off(required);
                    let result = (call.native.func)(self, all)?;
                    (self.bounded(result)?, rest)
                }
                other => return Err(EvalError::NotAFunction(other.type_name().to_string())),
            };
            if rest.is_empty() {
                return Ok(result);
            }
            func = result;
            args = rest;
        }
    }

    /// Bind a closure's parameters and evaluate its body in tail position.
    fn enter(&mut self, closure: &Closure, args: Vec<Value>) -> EvalResult<Flow> {
        let mut env = closure.env.clone();
        if let Some(group) = &closure.group {
            for (name, def) in &group.members {
                let member =
                    Closure::value(def.clone(), group.env.clone(), Some(group.clone()), Vec::new());
                env = env.bind(name.clone(), member);
            }
        }
        match &closure.def.body {
            FunBody::Expr(body) => {
                let mut bound = Vec::new();
                for (param, arg) in closure.def.params.iter().zip(&args) {
                    if !matches(param, arg, &mut bound) {
                        return Err(EvalError::MatchFailure);
                    }
                }
                self.eval_tail(body, &env.bind_all(bound))
            }
            FunBody::Arms(arms) => {
                let arg = args.into_iter().next().unwrap_or(Value::Unit);
                self.match_arms(arms, arg, &env)
            }
        }
    }
}

fn lookup(env: &Env, path: &Path) -> EvalResult<Value> {
    env.lookup(path)?
        .ok_or_else(|| EvalError::Unbound(path.to_string()))
}

/// Reconcile the written argument count with the declared arity.
///
/// `Some (1, 2)` in ML passes two arguments to a one-argument constructor,
/// and `Pair((1, 2))` in Reason passes one tuple to a two-argument one.
fn fix_arity(ctor: &Constructor, args: Vec<Value>) -> EvalResult<Vec<Value>> {
    let found = args.len();
    if found == ctor.arity {
        return Ok(args);
    }
    if ctor.arity == 1 && found > 1 {
        return Ok(vec![Value::tuple(args)]);
    }
    if ctor.arity > 1 && found == 1 {
        if let Value::Tuple(tuple) = &args[0] {
            if tuple.items().len() == ctor.arity {
                return Ok(tuple.items().to_vec());
            }
        }
    }
    Err(EvalError::ConstructorArity {
        name: ctor.name.clone(),
        expected: ctor.arity,
        found,
    })
}
