//! Sandbox Façade (Component K, §4.K).
//!
//! The one type an embedder actually touches: construct a `Sandbox`,
//! `eval`/`run` source, read back an [`ExecutionResult`]. `startup`/`shutdown`
//! are idempotent and a `Drop` impl calls `shutdown` if the caller never did.

use crate::context::{Context, ExecutionStatus, ScopeName};
use crate::error::{Error, ErrorChain};
use crate::interpreter::Interpreter;
use crate::module;
use crate::registry::{Function, HostFunction, MockReasonProvider, ReasonProvider};
use crate::value::Value;
use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// The result of one `eval`/`run` call (§4.K).
pub struct ExecutionResult {
    pub success: bool,
    pub result: Option<Value>,
    pub output: String,
    pub final_context: Context,
    pub error: Option<ErrorChain>,
}

pub struct Sandbox {
    ctx: Context,
    interpreter: Interpreter,
    started: Cell<bool>,
    shut_down: Cell<bool>,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::with_strict(false)
    }

    pub fn with_strict(strict: bool) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let danapath = std::env::var("DANAPATH").ok();
        let search_paths = module::search_paths_from_env(danapath.as_deref(), &cwd);

        let mut interpreter = Interpreter::new(search_paths);
        if std::env::var("OPENDXA_MOCK_LLM").map(|v| v == "true").unwrap_or(false) {
            log::debug!("OPENDXA_MOCK_LLM=true: wiring MockReasonProvider");
            interpreter = interpreter.with_reason_provider(Rc::new(MockReasonProvider));
        }

        let sandbox = Self {
            ctx: Context::new(strict),
            interpreter,
            started: Cell::new(false),
            shut_down: Cell::new(false),
        };
        sandbox.startup();
        sandbox
    }

    pub fn with_reason_provider(mut self, provider: Rc<dyn ReasonProvider>) -> Self {
        self.interpreter = self.interpreter.with_reason_provider(provider);
        self.register_builtins();
        self
    }

    pub fn with_host_bridge(mut self, bridge: Rc<dyn module::HostModuleBridge>) -> Self {
        self.interpreter = self.interpreter.with_host_bridge(bridge);
        self
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Register built-ins and reset run status. Safe to call more than once;
    /// only the first call (per `Sandbox`) does anything.
    pub fn startup(&self) {
        if self.started.get() {
            return;
        }
        log::debug!("sandbox startup: registering built-ins");
        self.register_builtins();
        self.ctx.set_execution_status(ExecutionStatus::Pending);
        self.started.set(true);
    }

    pub fn shutdown(&self) {
        if self.shut_down.get() {
            return;
        }
        log::debug!("sandbox shutdown");
        self.shut_down.set(true);
    }

    pub fn eval(&self, source: &str) -> ExecutionResult {
        self.startup();
        self.ctx.set_execution_status(ExecutionStatus::Running);
        log::debug!("evaluating {} bytes of Dana source", source.len());

        let outcome = dana_compiler::compile(source)
            .map_err(|e| ErrorChain::new(Error::Parse(e.to_string())))
            .and_then(|program| self.interpreter.exec_block(&self.ctx, &program.statements));

        match outcome {
            Ok(_) => {
                self.ctx.set_execution_status(ExecutionStatus::Completed);
                ExecutionResult {
                    success: true,
                    result: self.ctx.last_result(),
                    output: self.ctx.read_output(),
                    final_context: self.ctx.clone(),
                    error: None,
                }
            }
            Err(chain) => {
                log::warn!("sandbox run failed: {chain}");
                self.ctx.set_execution_status(ExecutionStatus::Failed);
                ExecutionResult {
                    success: false,
                    result: None,
                    output: self.ctx.read_output(),
                    final_context: self.ctx.clone(),
                    error: Some(chain),
                }
            }
        }
    }

    pub fn run(&self, path: &Path) -> ExecutionResult {
        match std::fs::read_to_string(path) {
            Ok(source) => self.eval(&source),
            Err(e) => ExecutionResult {
                success: false,
                result: None,
                output: String::new(),
                final_context: self.ctx.clone(),
                error: Some(ErrorChain::new(Error::runtime(format!(
                    "could not read '{}': {e}",
                    path.display()
                )))),
            },
        }
    }

    fn register_builtins(&self) {
        let mut reg = self.ctx.registry().borrow_mut();
        reg.register("system", "len", host_fn("len", |_ctx, args, _kw| builtin_len(args)));
        reg.register("system", "str", host_fn("str", |_ctx, args, _kw| builtin_str(args)));
        reg.register("system", "int", host_fn("int", |_ctx, args, _kw| builtin_int(args)));
        reg.register("system", "float", host_fn("float", |_ctx, args, _kw| builtin_float(args)));
        reg.register("system", "bool", host_fn("bool", |_ctx, args, _kw| builtin_bool(args)));
        reg.register("system", "list", host_fn("list", |_ctx, args, _kw| builtin_list(args)));
        reg.register("system", "range", host_fn("range", |_ctx, args, _kw| builtin_range(args)));

        let provider = self.interpreter.reason_provider.clone();
        reg.register(
            "system",
            "reason",
            Function::Host(Rc::new(HostFunction {
                name: "reason".to_string(),
                wants_context: false,
                context_param: None,
                callback: Box::new(move |_ctx, args, kwargs| {
                    let provider = provider
                        .clone()
                        .ok_or_else(|| Error::runtime("no reasoning provider configured for this sandbox"))?;
                    let prompt = args.into_iter().next().map(|v| v.to_string()).unwrap_or_default();
                    let response = provider.reason(&prompt, &kwargs)?;
                    Ok(Value::Str(response))
                }),
            })),
        );
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn host_fn(
    name: &str,
    f: impl Fn(&Context, Vec<Value>, HashMap<String, Value>) -> Result<Value, Error> + 'static,
) -> Function {
    Function::Host(Rc::new(HostFunction {
        name: name.to_string(),
        wants_context: false,
        context_param: None,
        callback: Box::new(f),
    }))
}

fn one_arg(args: Vec<Value>, fn_name: &str) -> Result<Value, Error> {
    let mut args = args;
    if args.len() != 1 {
        return Err(Error::type_err(format!("{fn_name}() takes exactly one argument")));
    }
    Ok(args.remove(0))
}

fn builtin_len(args: Vec<Value>) -> Result<Value, Error> {
    let v = one_arg(args, "len")?;
    let n = match &v {
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        Value::Dict(entries) => entries.borrow().len(),
        Value::Set(items) => items.borrow().len(),
        Value::Str(s) => s.chars().count(),
        other => return Err(Error::type_err(format!("object of type '{}' has no len()", other.type_name()))),
    };
    Ok(Value::Integer(n as i64))
}

fn builtin_str(args: Vec<Value>) -> Result<Value, Error> {
    Ok(Value::Str(one_arg(args, "str")?.to_string()))
}

fn builtin_int(args: Vec<Value>) -> Result<Value, Error> {
    let v = one_arg(args, "int")?;
    Ok(Value::Integer(match v {
        Value::Integer(i) => i,
        Value::Float(f) => f as i64,
        Value::Bool(b) => i64::from(b),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::value(format!("invalid literal for int(): '{s}'")))?,
        other => return Err(Error::type_err(format!("int() is not supported for '{}'", other.type_name()))),
    }))
}

fn builtin_float(args: Vec<Value>) -> Result<Value, Error> {
    let v = one_arg(args, "float")?;
    Ok(Value::Float(match v {
        Value::Integer(i) => i as f64,
        Value::Float(f) => f,
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::value(format!("invalid literal for float(): '{s}'")))?,
        other => return Err(Error::type_err(format!("float() is not supported for '{}'", other.type_name()))),
    }))
}

/// The only place `bool(...)`'s enhanced string-token coercion (§4.H) is
/// reached from a builtin call rather than a `: bool` assignment.
fn builtin_bool(args: Vec<Value>) -> Result<Value, Error> {
    let v = one_arg(args, "bool")?;
    Ok(Value::Bool(crate::interpreter::expr::coerce_to_bool(&v)))
}

fn builtin_list(args: Vec<Value>) -> Result<Value, Error> {
    let v = one_arg(args, "list")?;
    Ok(Value::list(v.iterable_items()?))
}

fn builtin_range(args: Vec<Value>) -> Result<Value, Error> {
    let nums: Vec<i64> = args
        .iter()
        .map(|v| match v {
            Value::Integer(i) => Ok(*i),
            other => Err(Error::type_err(format!("range() arguments must be integers, got '{}'", other.type_name()))),
        })
        .collect::<Result<_, _>>()?;
    let (start, stop, step) = match nums.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(Error::type_err("range() takes 1 to 3 arguments")),
    };
    if step == 0 {
        return Err(Error::value("range() step cannot be zero"));
    }
    let mut out = Vec::new();
    let mut i = start;
    if step > 0 {
        while i < stop {
            out.push(Value::Integer(i));
            i += step;
        }
    } else {
        while i > stop {
            out.push(Value::Integer(i));
            i += step;
        }
    }
    Ok(Value::list(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_returns_the_last_non_none_expression_result() {
        let sandbox = Sandbox::new();
        let result = sandbox.eval("x = 1\nx + 1\n");
        assert!(result.success);
        assert!(matches!(result.result, Some(Value::Integer(2))));
    }

    #[test]
    fn print_appends_to_output() {
        let sandbox = Sandbox::new();
        let result = sandbox.eval("print(\"hi\")\n");
        assert!(result.success);
        assert_eq!(result.output, "hi\n");
    }

    #[test]
    fn builtin_len_reports_collection_size() {
        let sandbox = Sandbox::new();
        let result = sandbox.eval("n = len([1, 2, 3])\n");
        assert!(result.success);
        assert!(matches!(result.final_context.get_scope(ScopeName::Local, "n"), Some(Value::Integer(3))));
    }

    #[test]
    fn undefined_name_produces_a_failed_result_with_an_error_chain() {
        let sandbox = Sandbox::with_strict(true);
        let result = sandbox.eval("y = nope\n");
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[test]
    fn range_builtin_produces_a_list() {
        let sandbox = Sandbox::new();
        let result = sandbox.eval("xs = range(3)\n");
        assert!(result.success);
        match result.final_context.get_scope(ScopeName::Local, "xs") {
            Some(Value::List(items)) => assert_eq!(items.borrow().len(), 3),
            other => panic!("expected a list, got {other:?}"),
        }
    }

    #[test]
    fn shutdown_is_idempotent() {
        let sandbox = Sandbox::new();
        sandbox.shutdown();
        sandbox.shutdown();
    }
}
