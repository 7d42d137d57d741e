//! Scoped Context (Component E, §3.4 / §4.E).
//!
//! Four named scopes: `local` lives per call frame in its own map; `private`,
//! `public`, and `system` are shared sandbox-wide and always resolve against
//! the root, regardless of how deep the current frame is nested. A `Context`
//! is a cheap `Clone` — it's a handle onto `Rc`-shared sandbox state plus its
//! own frame-local bindings.

use crate::error::Error;
use crate::module::ModuleCache;
use crate::registry::FunctionRegistry;
use crate::struct_system::StructRegistry;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeName {
    Local,
    Private,
    Public,
    System,
}

impl ScopeName {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeName::Local => "local",
            ScopeName::Private => "private",
            ScopeName::Public => "public",
            ScopeName::System => "system",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "local" => Some(ScopeName::Local),
            "private" => Some(ScopeName::Private),
            "public" => Some(ScopeName::Public),
            "system" => Some(ScopeName::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Default)]
struct SharedScopes {
    private: HashMap<String, Value>,
    public: HashMap<String, Value>,
    system: HashMap<String, Value>,
}

/// Everything that is shared across every frame of one sandbox: the global
/// scopes, the function/struct registries, the module cache, the captured
/// output buffer, and the overall run status.
pub struct SandboxState {
    shared: RefCell<SharedScopes>,
    pub registry: RefCell<FunctionRegistry>,
    pub structs: RefCell<StructRegistry>,
    pub modules: RefCell<ModuleCache>,
    output: RefCell<Vec<String>>,
    status: RefCell<ExecutionStatus>,
    last_result: RefCell<Option<Value>>,
    pub strict: bool,
}

#[derive(Clone)]
pub struct Context {
    state: Rc<SandboxState>,
    local: Rc<RefCell<HashMap<String, Value>>>,
    pub current_module: Option<String>,
    pub current_function: Option<String>,
}

impl Context {
    pub fn new(strict: bool) -> Self {
        Self {
            state: Rc::new(SandboxState {
                shared: RefCell::new(SharedScopes::default()),
                registry: RefCell::new(FunctionRegistry::new()),
                structs: RefCell::new(StructRegistry::new()),
                modules: RefCell::new(ModuleCache::new()),
                output: RefCell::new(Vec::new()),
                status: RefCell::new(ExecutionStatus::Pending),
                last_result: RefCell::new(None),
                strict,
            }),
            local: Rc::new(RefCell::new(HashMap::new())),
            current_module: None,
            current_function: None,
        }
    }

    /// A fresh call frame sharing this context's sandbox-wide state but with
    /// its own empty `local` scope (§3.4: "a fresh child context is pushed
    /// for each Dana function call").
    pub fn child(&self) -> Self {
        Self {
            state: self.state.clone(),
            local: Rc::new(RefCell::new(HashMap::new())),
            current_module: self.current_module.clone(),
            current_function: self.current_function.clone(),
        }
    }

    pub fn registry(&self) -> &RefCell<FunctionRegistry> {
        &self.state.registry
    }

    pub fn structs(&self) -> &RefCell<StructRegistry> {
        &self.state.structs
    }

    pub fn modules(&self) -> &RefCell<ModuleCache> {
        &self.state.modules
    }

    pub fn is_strict(&self) -> bool {
        self.state.strict
    }

    pub fn push_output(&self, line: impl Into<String>) {
        self.state.output.borrow_mut().push(line.into());
    }

    pub fn read_output(&self) -> String {
        self.state.output.borrow().concat()
    }

    pub fn set_execution_status(&self, status: ExecutionStatus) {
        *self.state.status.borrow_mut() = status;
    }

    pub fn execution_status(&self) -> ExecutionStatus {
        *self.state.status.borrow()
    }

    /// Record the value of the most recently executed `ExpressionStatement`
    /// whose value was non-`None` (§4.I — this becomes the sandbox's
    /// `.result`).
    pub fn set_last_result(&self, value: Value) {
        *self.state.last_result.borrow_mut() = Some(value);
    }

    pub fn last_result(&self) -> Option<Value> {
        self.state.last_result.borrow().clone()
    }

    pub fn get_scope(&self, scope: ScopeName, name: &str) -> Option<Value> {
        match scope {
            ScopeName::Local => self.local.borrow().get(name).cloned(),
            ScopeName::Private => self.state.shared.borrow().private.get(name).cloned(),
            ScopeName::Public => self.state.shared.borrow().public.get(name).cloned(),
            ScopeName::System => self.state.shared.borrow().system.get(name).cloned(),
        }
    }

    pub fn set_in_scope(&self, scope: ScopeName, name: &str, value: Value) {
        match scope {
            ScopeName::Local => {
                self.local.borrow_mut().insert(name.to_string(), value);
            }
            ScopeName::Private => {
                self.state.shared.borrow_mut().private.insert(name.to_string(), value);
            }
            ScopeName::Public => {
                self.state.shared.borrow_mut().public.insert(name.to_string(), value);
            }
            ScopeName::System => {
                self.state.shared.borrow_mut().system.insert(name.to_string(), value);
            }
        }
    }

    pub fn delete_in_scope(&self, scope: ScopeName, name: &str) -> bool {
        match scope {
            ScopeName::Local => self.local.borrow_mut().remove(name).is_some(),
            ScopeName::Private => self.state.shared.borrow_mut().private.remove(name).is_some(),
            ScopeName::Public => self.state.shared.borrow_mut().public.remove(name).is_some(),
            ScopeName::System => self.state.shared.borrow_mut().system.remove(name).is_some(),
        }
    }

    pub fn local_names(&self) -> Vec<String> {
        self.local.borrow().keys().cloned().collect()
    }

    pub fn local_bindings(&self) -> HashMap<String, Value> {
        self.local.borrow().clone()
    }

    /// Look up the first segment of a canonical `scope.name` identifier.
    /// Missing names return `Value::None` unless the sandbox runs in strict
    /// mode, per §4.E's lenient-by-default lookup.
    pub fn get(&self, scope: ScopeName, name: &str) -> Result<Value, Error> {
        match self.get_scope(scope, name) {
            Some(v) => Ok(v),
            None if self.is_strict() => Err(Error::name(
                format!("{}.{}", scope.as_str(), name),
                self.local_names(),
            )),
            None => Ok(Value::None),
        }
    }
}

/// Split a canonical identifier into its scope, its first bound segment, and
/// any trailing attribute-chain segments (e.g. `local.p.x` → `(Local, "p",
/// ["x"])`).
pub fn split_qualified(qualified: &str) -> Result<(ScopeName, String, Vec<String>), Error> {
    let mut parts = qualified.split('.');
    let scope_str = parts.next().ok_or_else(|| Error::runtime("empty identifier"))?;
    let scope = ScopeName::from_str(scope_str)
        .ok_or_else(|| Error::runtime(format!("identifier '{qualified}' has no scope prefix")))?;
    let name = parts
        .next()
        .ok_or_else(|| Error::runtime(format!("identifier '{qualified}' has no bound name")))?
        .to_string();
    let rest = parts.map(|s| s.to_string()).collect();
    Ok((scope, name, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_scope_is_per_frame() {
        let root = Context::new(false);
        root.set_in_scope(ScopeName::Local, "x", Value::Integer(1));
        let child = root.child();
        assert!(matches!(child.get_scope(ScopeName::Local, "x"), None));
        assert!(matches!(root.get_scope(ScopeName::Local, "x"), Some(Value::Integer(1))));
    }

    #[test]
    fn global_scopes_are_shared_across_frames() {
        let root = Context::new(false);
        let child = root.child();
        child.set_in_scope(ScopeName::Public, "count", Value::Integer(5));
        assert!(matches!(root.get_scope(ScopeName::Public, "count"), Some(Value::Integer(5))));
    }

    #[test]
    fn lenient_read_of_undefined_name_is_none() {
        let ctx = Context::new(false);
        let v = ctx.get(ScopeName::Local, "missing").unwrap();
        assert!(matches!(v, Value::None));
    }

    #[test]
    fn strict_read_of_undefined_name_errors() {
        let ctx = Context::new(true);
        assert!(ctx.get(ScopeName::Local, "missing").is_err());
    }

    #[test]
    fn split_qualified_separates_scope_name_and_trailer() {
        let (scope, name, rest) = split_qualified("local.p.x").unwrap();
        assert_eq!(scope, ScopeName::Local);
        assert_eq!(name, "p");
        assert_eq!(rest, vec!["x".to_string()]);
    }
}
