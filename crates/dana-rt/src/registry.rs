//! Function Registry (Component F, §4.F).
//!
//! Three function flavours — `User` closures over a defining `Context`,
//! opaque `Host` callables (the single seam the out-of-scope LLM/reasoning
//! provider plugs into), and `Composed` pipe values — all stored behind one
//! `Function` handle so the expression executor doesn't need to distinguish
//! them until it actually dispatches a call.

use crate::context::Context;
use crate::error::Error;
use crate::value::Value;
use dana_compiler::ast::{Param, Stmt};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub struct UserFunction {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub body: Vec<Stmt>,
    pub closure: Context,
}

impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserFunction({})", self.name)
    }
}

type HostCallback = dyn Fn(&Context, Vec<Value>, HashMap<String, Value>) -> Result<Value, Error>;

pub struct HostFunction {
    pub name: String,
    pub wants_context: bool,
    pub context_param: Option<String>,
    pub callback: Box<HostCallback>,
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostFunction({})", self.name)
    }
}

#[derive(Debug, Clone)]
pub struct ComposedFunction {
    pub left: Function,
    pub right: Function,
}

#[derive(Debug, Clone)]
pub enum Function {
    User(Rc<UserFunction>),
    Host(Rc<HostFunction>),
    Composed(Rc<ComposedFunction>),
}

impl Function {
    pub fn name(&self) -> String {
        match self {
            Function::User(f) => f.name.clone(),
            Function::Host(f) => f.name.clone(),
            Function::Composed(f) => format!("({} | {})", f.left.name(), f.right.name()),
        }
    }

    pub fn compose(left: Function, right: Function) -> Function {
        Function::Composed(Rc::new(ComposedFunction { left, right }))
    }
}

/// A namespace-qualified `namespace -> name -> Function` map, plus a
/// conventional `"local"` namespace for bindings made by the running
/// program. Resolution order mirrors §4.F: an explicit namespace in the
/// name wins, then `"local"`, then `"system"` (builtins).
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    namespaces: HashMap<String, HashMap<String, Function>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, namespace: &str, name: &str, function: Function) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(name.to_string(), function);
    }

    /// Resolve a bare name (no namespace given) by checking `local` first,
    /// then `system` (built-ins).
    pub fn resolve_bare(&self, name: &str) -> Option<Function> {
        self.namespaces
            .get("local")
            .and_then(|ns| ns.get(name))
            .or_else(|| self.namespaces.get("system").and_then(|ns| ns.get(name)))
            .cloned()
    }

    pub fn resolve_in(&self, namespace: &str, name: &str) -> Option<Function> {
        self.namespaces.get(namespace).and_then(|ns| ns.get(name)).cloned()
    }

    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    /// Every `(name, Function)` registered directly in `namespace` — used by
    /// the module loader to surface a module's top-level functions as
    /// exports (§4.J).
    pub fn entries_in(&self, namespace: &str) -> Vec<(String, Function)> {
        self.namespaces
            .get(namespace)
            .map(|ns| ns.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}

/// Trait object the embedder supplies to back the `reason(...)` host
/// function (§4.F, §6 "Reasoning host call"). The core ships no real
/// implementation; `MockReasonProvider` exists only for
/// `OPENDXA_MOCK_LLM=true` (§8 boundary behaviour).
pub trait ReasonProvider {
    fn reason(&self, prompt: &str, options: &HashMap<String, Value>) -> Result<String, Error>;
}

#[derive(Debug, Default)]
pub struct MockReasonProvider;

impl ReasonProvider for MockReasonProvider {
    fn reason(&self, prompt: &str, _options: &HashMap<String, Value>) -> Result<String, Error> {
        Ok(format!("[mock reasoning response to: {prompt}]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_fn(name: &str) -> Function {
        Function::Host(Rc::new(HostFunction {
            name: name.to_string(),
            wants_context: false,
            context_param: None,
            callback: Box::new(|_ctx, _args, _kwargs| Ok(Value::None)),
        }))
    }

    #[test]
    fn local_namespace_shadows_system_builtins() {
        let mut reg = FunctionRegistry::new();
        reg.register("system", "len", host_fn("len"));
        reg.register("local", "len", host_fn("len-override"));
        let resolved = reg.resolve_bare("len").unwrap();
        assert_eq!(resolved.name(), "len-override");
    }

    #[test]
    fn falls_back_to_system_when_no_local_binding() {
        let mut reg = FunctionRegistry::new();
        reg.register("system", "len", host_fn("len"));
        assert!(reg.resolve_bare("len").is_some());
    }

    #[test]
    fn composed_function_name_shows_both_sides() {
        let composed = Function::compose(host_fn("a"), host_fn("b"));
        assert_eq!(composed.name(), "(a | b)");
    }
}
