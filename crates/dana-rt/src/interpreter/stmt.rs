//! Statement Executor (§4.I).

use super::expr;
use super::{Flow, Interpreter};
use crate::context::{self, Context, ScopeName};
use crate::error::{Error, ErrorChain};
use crate::module::{self, ModuleObject};
use crate::registry::{Function, UserFunction};
use crate::value::Value;
use dana_compiler::ast::{Expr, SliceIndex, Stmt};
use std::rc::Rc;

impl Interpreter {
    pub fn exec_stmt(&self, ctx: &Context, stmt: &Stmt) -> Result<Flow, ErrorChain> {
        match stmt {
            Stmt::Assignment { target, type_hint, value, .. } => {
                let v = self.eval_expr(ctx, value)?;
                self.assign_target(ctx, target, type_hint.as_deref(), v)?;
                Ok(Flow::Normal)
            }

            Stmt::Conditional { cond, then_body, else_body, .. } => {
                if self.eval_expr(ctx, cond)?.truthy() {
                    self.exec_block(ctx, then_body)
                } else {
                    self.exec_block(ctx, else_body)
                }
            }

            Stmt::WhileLoop { cond, body, .. } => {
                while self.eval_expr(ctx, cond)?.truthy() {
                    match self.exec_block(ctx, body)? {
                        Flow::Break => break,
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::ForLoop { target, iterable, body, .. } => {
                let iterable_val = self.eval_expr(ctx, iterable)?;
                let items = iterable_val.iterable_items()?;
                for item in items {
                    ctx.set_in_scope(ScopeName::Local, target, item);
                    match self.exec_block(ctx, body)? {
                        Flow::Break => break,
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::FunctionDefinition {
                name,
                params,
                return_type,
                body,
                decorators,
                ..
            } => {
                let user_fn = Rc::new(UserFunction {
                    name: name.clone(),
                    params: params.clone(),
                    return_type: return_type.clone(),
                    body: body.clone(),
                    closure: ctx.clone(),
                });
                let mut function = Function::User(user_fn);
                for decorator in decorators {
                    function = self.apply_decorator(ctx, decorator, function)?;
                }
                ctx.registry().borrow_mut().register("local", name, function);
                Ok(Flow::Normal)
            }

            Stmt::StructDefinition { name, fields, .. } => {
                let field_order: Vec<String> = fields.iter().map(|(n, _)| n.clone()).collect();
                let field_types: std::collections::HashMap<String, String> = fields.iter().cloned().collect();
                let ty = crate::struct_system::StructType::new(name.clone(), field_order, field_types);
                ctx.structs().borrow_mut().register(ty)?;
                Ok(Flow::Normal)
            }

            Stmt::ImportStatement { module_path, alias, .. } => {
                self.exec_import(ctx, module_path, alias.as_deref())?;
                Ok(Flow::Normal)
            }

            Stmt::ImportFromStatement { module_path, names, .. } => {
                self.exec_import_from(ctx, module_path, names)?;
                Ok(Flow::Normal)
            }

            Stmt::ReturnStatement { value, .. } => {
                let v = match value {
                    Some(e) => self.eval_expr(ctx, e)?,
                    None => Value::None,
                };
                Ok(Flow::Return(v))
            }

            Stmt::BreakStatement { .. } => Ok(Flow::Break),
            Stmt::ContinueStatement { .. } => Ok(Flow::Continue),
            Stmt::PassStatement { .. } => Ok(Flow::Normal),

            Stmt::RaiseStatement { value, .. } => Err(self.build_raised_error(ctx, value.as_deref())?),

            Stmt::AssertStatement { cond, msg, .. } => {
                if self.eval_expr(ctx, cond)?.truthy() {
                    Ok(Flow::Normal)
                } else {
                    let message = msg
                        .as_deref()
                        .map(|e| self.eval_expr(ctx, e))
                        .transpose()?
                        .map(|v| v.to_string());
                    Err(Error::Assertion { message }.into())
                }
            }

            Stmt::TryBlock { body, except_blocks, finally, .. } => {
                let outcome = match self.exec_block(ctx, body) {
                    Ok(flow) => Ok(flow),
                    Err(chain) => {
                        let type_name = chain.root_cause().dana_type_name();
                        let mut handled = None;
                        for block in except_blocks {
                            let matches_name = block.exc_name.as_deref().map(|n| n == type_name).unwrap_or(true);
                            if matches_name {
                                if let Some(binding) = &block.binding {
                                    ctx.set_in_scope(ScopeName::Local, binding, Value::Str(chain.display_chain()));
                                }
                                handled = Some(self.exec_block(ctx, &block.body));
                                break;
                            }
                        }
                        handled.unwrap_or(Err(chain))
                    }
                };

                if let Some(finally_body) = finally {
                    match self.exec_block(ctx, finally_body)? {
                        Flow::Normal => {}
                        other => return Ok(other),
                    }
                }
                outcome
            }

            Stmt::PrintStatement { msg, .. } => {
                let v = self.eval_expr(ctx, msg)?;
                ctx.push_output(format!("{v}\n"));
                Ok(Flow::Normal)
            }

            Stmt::ExpressionStatement { expr, .. } => {
                let v = self.eval_expr(ctx, expr)?;
                if !matches!(v, Value::None) {
                    ctx.set_last_result(v);
                }
                Ok(Flow::Normal)
            }
        }
    }

    fn assign_target(&self, ctx: &Context, target: &Expr, type_hint: Option<&str>, value: Value) -> Result<(), ErrorChain> {
        let value = expr::coerce_for_type_hint(value, type_hint);
        match target {
            Expr::Identifier { qualified_name, .. } => {
                let (scope, name, rest) = context::split_qualified(qualified_name)?;
                if rest.is_empty() {
                    ctx.set_in_scope(scope, &name, value);
                    return Ok(());
                }
                let mut receiver = ctx.get(scope, &name)?;
                for seg in &rest[..rest.len() - 1] {
                    receiver = self.get_attribute(&receiver, seg)?;
                }
                set_attribute(&receiver, rest.last().unwrap(), value)
            }
            Expr::AttributeAccess { object, name, .. } => {
                let receiver = self.eval_expr(ctx, object)?;
                set_attribute(&receiver, name, value)
            }
            Expr::SubscriptExpression { object, index, .. } => {
                let container = self.eval_expr(ctx, object)?;
                match index {
                    SliceIndex::Index(key_expr) => {
                        let key = self.eval_expr(ctx, key_expr)?;
                        expr::assign_subscript(&container, key, value).map_err(Into::into)
                    }
                    SliceIndex::Slice { start, stop, step } => {
                        let start = start.as_deref().map(|e| self.eval_expr(ctx, e)).transpose()?;
                        let stop = stop.as_deref().map(|e| self.eval_expr(ctx, e)).transpose()?;
                        let step = step.as_deref().map(|e| self.eval_expr(ctx, e)).transpose()?;
                        expr::assign_slice(&container, start, stop, step, value).map_err(Into::into)
                    }
                }
            }
            _ => Err(Error::runtime("invalid assignment target").into()),
        }
    }

    fn apply_decorator(&self, ctx: &Context, decorator: &Expr, target: Function) -> Result<Function, ErrorChain> {
        let (name, positional, keyword): (&str, &[Expr], &[(String, Expr)]) = match decorator {
            Expr::FunctionCall { name, positional, keyword, .. } => (name, positional, keyword),
            Expr::Identifier { qualified_name, .. } => (qualified_name, &[], &[]),
            _ => return Ok(target),
        };
        let last_segment = name.rsplit('.').next().unwrap_or(name);
        if last_segment != "poet" {
            return Ok(target);
        }
        let Some(poet_fn) = ctx.registry().borrow().resolve_bare("poet") else {
            return Ok(target);
        };

        let mut args = vec![Value::Function(target)];
        for p in positional {
            args.push(self.eval_expr(ctx, p)?);
        }
        let mut kwargs = std::collections::HashMap::new();
        for (k, v) in keyword {
            kwargs.insert(k.clone(), self.eval_expr(ctx, v)?);
        }
        match self.call_function(ctx, &poet_fn, args, kwargs)? {
            Value::Function(f) => Ok(f),
            other => Err(Error::type_err(format!(
                "decorator 'poet' must return a function, got '{}'",
                other.type_name()
            ))
            .into()),
        }
    }

    fn build_raised_error(&self, ctx: &Context, value: Option<&Expr>) -> Result<ErrorChain, ErrorChain> {
        let Some(value) = value else {
            return Ok(Error::runtime("raise with no value is only valid inside an active except block").into());
        };
        if let Expr::FunctionCall { name, positional, .. } = value {
            let exc_type = name.rsplit('.').next().unwrap_or(name);
            if let Some(ctor) = exception_constructor(exc_type) {
                let message = positional
                    .first()
                    .map(|e| self.eval_expr(ctx, e))
                    .transpose()?
                    .map(|v| v.to_string());
                return Ok(ErrorChain::new(ctor(message)));
            }
        }
        let v = self.eval_expr(ctx, value)?;
        Ok(ErrorChain::new(Error::runtime(v.to_string())))
    }

    fn exec_import(&self, ctx: &Context, module_path: &str, alias: Option<&str>) -> Result<(), ErrorChain> {
        if module::is_host_import(module_path) {
            let bridge = self
                .host_bridge
                .clone()
                .ok_or_else(|| Error::Import {
                    message: format!("no host module bridge configured for '{module_path}'"),
                })?;
            let value = bridge.load(module_path)?;
            let bind_name = alias.map(str::to_string).unwrap_or_else(|| module::host_module_name(module_path));
            ctx.set_in_scope(ScopeName::Local, &bind_name, value);
            return Ok(());
        }

        let loaded = self.load_module(ctx, module_path)?;
        let module_obj = Value::Foreign(Rc::new(ModuleObject {
            path: loaded.path.clone(),
            exports: loaded.exports.clone(),
        }));
        let bind_name = alias
            .map(str::to_string)
            .unwrap_or_else(|| module_path.rsplit('.').next().unwrap_or(module_path).to_string());
        ctx.set_in_scope(ScopeName::Local, &bind_name, module_obj);
        Ok(())
    }

    fn exec_import_from(&self, ctx: &Context, module_path: &str, names: &[(String, Option<String>)]) -> Result<(), ErrorChain> {
        if module::is_host_import(module_path) {
            let bridge = self
                .host_bridge
                .clone()
                .ok_or_else(|| Error::Import {
                    message: format!("no host module bridge configured for '{module_path}'"),
                })?;
            let value = bridge.load(module_path)?;
            for (name, alias) in names {
                let v = self.get_attribute(&value, name)?;
                bind_imported_name(ctx, alias.as_deref().unwrap_or(name), v);
            }
            return Ok(());
        }

        let loaded = self.load_module(ctx, module_path)?;
        for (name, alias) in names {
            let value = loaded.exports.get(name).cloned().ok_or_else(|| Error::Attribute {
                type_name: "module".to_string(),
                attr: name.clone(),
                available: loaded.exports.keys().cloned().collect::<Vec<_>>().join(", "),
            })?;
            bind_imported_name(ctx, alias.as_deref().unwrap_or(name), value);
        }
        Ok(())
    }

    /// Parse → execute → collect-exports for one module file, consulting
    /// (and updating) the sandbox's module cache for caching and cycle
    /// detection (§4.J).
    fn load_module(&self, ctx: &Context, path: &str) -> Result<module::LoadedModule, ErrorChain> {
        if let Some(loaded) = ctx.modules().borrow().get_loaded(path) {
            return Ok(loaded);
        }
        ctx.modules().borrow_mut().begin_load(path)?;

        let result = self.load_module_inner(ctx, path);
        match result {
            Ok(loaded) => {
                ctx.modules().borrow_mut().finish_load(path, loaded.clone());
                Ok(loaded)
            }
            Err(e) => {
                ctx.modules().borrow_mut().abort_load(path);
                Err(e)
            }
        }
    }

    fn load_module_inner(&self, ctx: &Context, path: &str) -> Result<module::LoadedModule, ErrorChain> {
        let file = module::resolve_module_file(&self.search_paths, path)?;
        let source = std::fs::read_to_string(&file).map_err(|e| Error::ModuleNotFound {
            path: path.to_string(),
            searched: e.to_string(),
        })?;
        let program = dana_compiler::compile(&source).map_err(|e| Error::Parse(e.to_string()))?;

        let mut module_ctx = Context::new(ctx.is_strict());
        module_ctx.current_module = Some(path.to_string());
        self.exec_block(&module_ctx, &program.statements)?;

        let mut exports = module_ctx.local_bindings();
        let function_entries = module_ctx.registry().borrow().entries_in("local");
        for (n, f) in function_entries {
            exports.insert(n, Value::Function(f));
        }

        Ok(module::LoadedModule {
            path: path.to_string(),
            exports,
        })
    }
}

fn bind_imported_name(ctx: &Context, name: &str, value: Value) {
    ctx.set_in_scope(ScopeName::Local, name, value.clone());
    if let Value::Function(f) = value {
        ctx.registry().borrow_mut().register("local", name, f);
    }
}

fn set_attribute(receiver: &Value, name: &str, value: Value) -> Result<(), ErrorChain> {
    match receiver {
        Value::Struct(inst) => inst.borrow_mut().set_field(name, value).map_err(Into::into),
        other => Err(Error::type_err(format!("'{}' does not support attribute assignment", other.type_name())).into()),
    }
}

fn exception_constructor(name: &str) -> Option<fn(Option<String>) -> Error> {
    fn value_err(m: Option<String>) -> Error {
        Error::value(m.unwrap_or_default())
    }
    fn type_err(m: Option<String>) -> Error {
        Error::type_err(m.unwrap_or_default())
    }
    fn name_err(m: Option<String>) -> Error {
        Error::Name {
            name: m.unwrap_or_default(),
            neighbours: vec![],
        }
    }
    fn index_err(m: Option<String>) -> Error {
        Error::Index {
            index: m.unwrap_or_default(),
            length: 0,
        }
    }
    fn key_err(m: Option<String>) -> Error {
        Error::Key {
            key: m.unwrap_or_default(),
            sample: String::new(),
        }
    }
    fn attribute_err(m: Option<String>) -> Error {
        Error::Attribute {
            type_name: String::new(),
            attr: m.unwrap_or_default(),
            available: String::new(),
        }
    }
    fn import_err(m: Option<String>) -> Error {
        Error::Import { message: m.unwrap_or_default() }
    }
    fn runtime_err(m: Option<String>) -> Error {
        Error::runtime(m.unwrap_or_default())
    }
    fn assertion_err(m: Option<String>) -> Error {
        Error::Assertion { message: m }
    }

    match name {
        "ValueError" => Some(value_err),
        "TypeError" => Some(type_err),
        "NameError" => Some(name_err),
        "IndexError" => Some(index_err),
        "KeyError" => Some(key_err),
        "AttributeError" => Some(attribute_err),
        "ImportError" => Some(import_err),
        "RuntimeError" => Some(runtime_err),
        "AssertionError" => Some(assertion_err),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    fn run(src: &str) -> Context {
        let ctx = Context::new(false);
        let program = dana_compiler::compile(src).unwrap();
        let interp = Interpreter::new(vec![]);
        interp.exec_block(&ctx, &program.statements).unwrap();
        ctx
    }

    #[test]
    fn if_else_picks_the_right_branch() {
        let ctx = run("x = 1\nif x > 0:\n    y = 1\nelse:\n    y = 2\n");
        assert!(matches!(ctx.get_scope(ScopeName::Local, "y"), Some(Value::Integer(1))));
    }

    #[test]
    fn while_loop_accumulates() {
        let ctx = run("i = 0\ntotal = 0\nwhile i < 5:\n    total = total + i\n    i = i + 1\n");
        assert!(matches!(ctx.get_scope(ScopeName::Local, "total"), Some(Value::Integer(10))));
    }

    #[test]
    fn for_loop_binds_the_bare_target_name() {
        let ctx = run("total = 0\nfor n in [1, 2, 3]:\n    total = total + n\n");
        assert!(matches!(ctx.get_scope(ScopeName::Local, "total"), Some(Value::Integer(6))));
    }

    #[test]
    fn function_definition_and_call_round_trip() {
        let ctx = run("def add(a, b):\n    return a + b\nresult = add(2, 3)\n");
        assert!(matches!(ctx.get_scope(ScopeName::Local, "result"), Some(Value::Integer(5))));
    }

    #[test]
    fn struct_construction_and_method_sugar() {
        let ctx = run(
            "struct Point:\n    x: int\n    y: int\n\ndef norm(p):\n    return p.x + p.y\n\np = Point(x=3, y=4)\nn = p.norm()\n",
        );
        assert!(matches!(ctx.get_scope(ScopeName::Local, "n"), Some(Value::Integer(7))));
    }

    #[test]
    fn try_except_binds_the_error_message() {
        let ctx = run(
            "msg = \"\"\ntry:\n    raise ValueError(\"bad\")\nexcept ValueError as e:\n    msg = e\n",
        );
        match ctx.get_scope(ScopeName::Local, "msg") {
            Some(Value::Str(s)) => assert!(s.contains("bad")),
            other => panic!("expected bound error string, got {other:?}"),
        }
    }

    #[test]
    fn finally_runs_even_when_the_try_body_raises() {
        let ctx = run(
            "ran_finally = false\ntry:\n    raise RuntimeError(\"boom\")\nexcept RuntimeError:\n    pass\nfinally:\n    ran_finally = true\n",
        );
        assert!(matches!(ctx.get_scope(ScopeName::Local, "ran_finally"), Some(Value::Bool(true))));
    }

    #[test]
    fn slice_assignment_replaces_a_span_in_place() {
        let ctx = run("a = [1, 2, 3, 4, 5]\na[1:3] = [9, 9, 9]\n");
        match ctx.get_scope(ScopeName::Local, "a") {
            Some(Value::List(items)) => {
                let items = items.borrow();
                assert_eq!(items.len(), 6);
                assert!(matches!(items[1], Value::Integer(9)));
                assert!(matches!(items[3], Value::Integer(4)));
            }
            other => panic!("expected a list, got {other:?}"),
        }
    }

    #[test]
    fn slice_assignment_with_a_shorter_replacement_shrinks_the_list() {
        let ctx = run("a = [1, 2, 3, 4, 5]\na[1:4] = [0]\n");
        match ctx.get_scope(ScopeName::Local, "a") {
            Some(Value::List(items)) => {
                let items = items.borrow();
                assert_eq!(items.len(), 3);
                assert!(matches!(items[0], Value::Integer(1)));
                assert!(matches!(items[1], Value::Integer(0)));
                assert!(matches!(items[2], Value::Integer(5)));
            }
            other => panic!("expected a list, got {other:?}"),
        }
    }

    #[test]
    fn assert_failure_raises_assertion_error() {
        let ctx = Context::new(false);
        let program = dana_compiler::compile("assert 1 > 2, \"nope\"\n").unwrap();
        let interp = Interpreter::new(vec![]);
        let err = interp.exec_block(&ctx, &program.statements).unwrap_err();
        assert!(matches!(err.root_cause(), Error::Assertion { .. }));
    }
}
