//! Expression Executor (§4.H).

use super::{Flow, Interpreter};
use crate::context::{self, Context, ScopeName};
use crate::error::{Error, ErrorChain};
use crate::registry::Function;
use crate::value::Value;
use dana_compiler::ast::{BinaryOp, Expr, FStringPart, SliceIndex, UnaryOp};
use dana_core::strings::coerce_bool_token;
use std::collections::HashMap;
use std::rc::Rc;

impl Interpreter {
    pub fn eval_expr(&self, ctx: &Context, expr: &Expr) -> Result<Value, ErrorChain> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone().into()),

            Expr::Identifier { qualified_name, .. } => self.eval_qualified(ctx, qualified_name),

            Expr::BinaryExpression { left, op, right, .. } => self.eval_binary(ctx, left, *op, right),

            Expr::UnaryExpression { op, operand, .. } => {
                let v = self.eval_expr(ctx, operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!v.truthy())),
                    UnaryOp::Neg => match v {
                        Value::Integer(i) => Ok(Value::Integer(-i)),
                        Value::Float(f) => Ok(Value::Float(-f)),
                        other => Err(Error::type_err(format!(
                            "unary '-' is not supported for '{}'",
                            other.type_name()
                        ))
                        .into()),
                    },
                }
            }

            Expr::FunctionCall {
                name,
                positional,
                keyword,
                ..
            } => self.eval_call(ctx, name, positional, keyword),

            Expr::AttributeAccess { object, name, .. } => {
                let obj = self.eval_expr(ctx, object)?;
                self.get_attribute(&obj, name).map_err(Into::into)
            }

            Expr::SubscriptExpression { object, index, .. } => {
                let obj = self.eval_expr(ctx, object)?;
                self.eval_subscript(ctx, &obj, index)
            }

            Expr::ListLiteral { items, .. } => {
                let values = items
                    .iter()
                    .map(|e| self.eval_expr(ctx, e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::list(values))
            }

            Expr::TupleLiteral { items, .. } => {
                let values = items
                    .iter()
                    .map(|e| self.eval_expr(ctx, e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::tuple(values))
            }

            Expr::DictLiteral { entries, .. } => {
                let mut values = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    values.push((self.eval_expr(ctx, k)?, self.eval_expr(ctx, v)?));
                }
                Ok(Value::dict(values))
            }

            Expr::SetLiteral { items, .. } => {
                let values = items
                    .iter()
                    .map(|e| self.eval_expr(ctx, e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::set(values))
            }

            Expr::FStringExpression { parts, .. } => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        FStringPart::Literal(s) => out.push_str(s),
                        FStringPart::Expr(e) => {
                            let v = self.eval_expr(ctx, e)?;
                            out.push_str(&v.to_string());
                        }
                    }
                }
                Ok(Value::Str(out))
            }
        }
    }

    /// Resolve `scope.name[.attr…]`: a scoped context read followed by zero
    /// or more attribute hops.
    pub(crate) fn eval_qualified(&self, ctx: &Context, qualified: &str) -> Result<Value, ErrorChain> {
        let (scope, name, rest) = context::split_qualified(qualified)?;
        let mut value = ctx.get(scope, &name)?;
        for seg in &rest {
            value = self.get_attribute(&value, seg)?;
        }
        Ok(value)
    }

    pub(crate) fn get_attribute(&self, value: &Value, attr: &str) -> Result<Value, Error> {
        match value {
            Value::Struct(inst) => inst.borrow().get_field(attr),
            Value::Foreign(obj) => obj.get_attr(attr).ok_or_else(|| Error::Attribute {
                type_name: obj.type_name().to_string(),
                attr: attr.to_string(),
                available: String::new(),
            }),
            other => Err(Error::Attribute {
                type_name: other.type_name().to_string(),
                attr: attr.to_string(),
                available: String::new(),
            }),
        }
    }

    fn eval_binary(&self, ctx: &Context, left: &Expr, op: BinaryOp, right: &Expr) -> Result<Value, ErrorChain> {
        // `and`/`or` short-circuit; everything else evaluates both sides.
        match op {
            BinaryOp::And => {
                let l = self.eval_expr(ctx, left)?;
                if !l.truthy() {
                    return Ok(l);
                }
                return self.eval_expr(ctx, right);
            }
            BinaryOp::Or => {
                let l = self.eval_expr(ctx, left)?;
                if l.truthy() {
                    return Ok(l);
                }
                return self.eval_expr(ctx, right);
            }
            BinaryOp::Pipe => return self.eval_pipe(ctx, left, right),
            _ => {}
        }

        let l = self.eval_expr(ctx, left)?;
        let r = self.eval_expr(ctx, right)?;
        apply_binary(op, l, r).map_err(Into::into)
    }

    fn eval_pipe(&self, ctx: &Context, left: &Expr, right: &Expr) -> Result<Value, ErrorChain> {
        let l = self.eval_expr(ctx, left)?;
        let r = self.eval_expr(ctx, right)?;
        match (&l, &r) {
            (Value::Function(lf), Value::Function(rf)) => {
                Ok(Value::Function(Function::compose(lf.clone(), rf.clone())))
            }
            (_, Value::Function(rf)) => self.call_function(ctx, rf, vec![l], HashMap::new()),
            _ => Err(Error::type_err("the right-hand side of '|' must be a function").into()),
        }
    }

    fn eval_call(
        &self,
        ctx: &Context,
        name: &str,
        positional: &[Expr],
        keyword: &[(String, Expr)],
    ) -> Result<Value, ErrorChain> {
        let mut args = positional
            .iter()
            .map(|e| self.eval_expr(ctx, e))
            .collect::<Result<Vec<_>, _>>()?;
        let mut kwargs = HashMap::new();
        for (k, e) in keyword {
            kwargs.insert(k.clone(), self.eval_expr(ctx, e)?);
        }

        if name == "__call__" {
            let callee = args.remove(0);
            return match callee {
                Value::Function(f) => self.call_function(ctx, &f, args, kwargs),
                other => Err(Error::type_err(format!("'{}' object is not callable", other.type_name())).into()),
            };
        }

        let remainder = name.splitn(2, '.').nth(1).unwrap_or("");
        if remainder.is_empty() {
            return Err(Error::runtime(format!("malformed call target '{name}'")).into());
        }
        let segments: Vec<&str> = remainder.split('.').collect();

        if segments.len() == 1 {
            let bare = segments[0];
            if ctx.structs().borrow().get(bare).is_some() {
                let instance = ctx.structs().borrow().construct(bare, kwargs)?;
                return Ok(Value::Struct(Rc::new(std::cell::RefCell::new(instance))));
            }
            let f = ctx
                .registry()
                .borrow()
                .resolve_bare(bare)
                .ok_or_else(|| Error::name(bare, ctx.local_names()))?;
            return self.call_function(ctx, &f, args, kwargs);
        }

        // Multi-segment call: try it as a direct namespaced function first
        // (`from x import f` style, or a bare module-qualified call), then
        // fall back to struct method-sugar resolved against the receiver's
        // runtime value.
        let namespace = segments[..segments.len() - 1].join(".");
        let fn_name = segments[segments.len() - 1];
        if let Some(f) = ctx.registry().borrow().resolve_in(&namespace, fn_name) {
            return self.call_function(ctx, &f, args, kwargs);
        }

        let (scope, first, mut rest) = context::split_qualified(name)?;
        // Drop the trailing method-name segment; everything up to it is the
        // receiver path.
        rest.pop();
        let mut receiver = ctx.get(scope, &first)?;
        for seg in &rest {
            receiver = self.get_attribute(&receiver, seg)?;
        }

        match self.get_attribute(&receiver, fn_name) {
            Ok(Value::Function(f)) => self.call_function(ctx, &f, args, kwargs),
            Ok(other) => Err(Error::type_err(format!("'{}' object is not callable", other.type_name())).into()),
            Err(_) if matches!(receiver, Value::Struct(_)) => {
                // Not a field of the receiver's type: method sugar.
                let f = ctx
                    .registry()
                    .borrow()
                    .resolve_bare(fn_name)
                    .ok_or_else(|| Error::Attribute {
                        type_name: receiver.struct_type_name().unwrap_or_default(),
                        attr: fn_name.to_string(),
                        available: String::new(),
                    })?;
                args.insert(0, receiver);
                self.call_function(ctx, &f, args, kwargs)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn call_function(
        &self,
        ctx: &Context,
        function: &Function,
        args: Vec<Value>,
        kwargs: HashMap<String, Value>,
    ) -> Result<Value, ErrorChain> {
        match function {
            Function::Host(host) => {
                let mut call_kwargs = kwargs;
                if host.wants_context {
                    if let Some(param) = &host.context_param {
                        call_kwargs
                            .entry(param.clone())
                            .or_insert(Value::Str(ctx.current_module.clone().unwrap_or_default()));
                    }
                }
                (host.callback)(ctx, args, call_kwargs).map_err(Into::into)
            }
            Function::Composed(composed) => {
                if args.len() != 1 || !kwargs.is_empty() {
                    return Err(Error::type_err("a composed function takes exactly one positional argument").into());
                }
                let mid = self.call_function(ctx, &composed.left, args, HashMap::new())?;
                self.call_function(ctx, &composed.right, vec![mid], HashMap::new())
            }
            Function::User(user) => {
                let mut frame_ctx = user.closure.child();
                bind_params(&frame_ctx, &user.params, args, kwargs).map_err(ErrorChain::from)?;
                frame_ctx.current_function = Some(user.name.clone());
                match self.exec_block(&frame_ctx, &user.body) {
                    Ok(Flow::Return(v)) => Ok(v),
                    Ok(Flow::Normal) => Ok(Value::None),
                    Ok(Flow::Break) | Ok(Flow::Continue) => {
                        Err(Error::runtime("'break'/'continue' used outside a loop").into())
                    }
                    Err(chain) => Err(chain.with_breadcrumb(user.name.clone(), None)),
                }
            }
        }
    }

    fn eval_subscript(&self, ctx: &Context, object: &Value, index: &SliceIndex) -> Result<Value, ErrorChain> {
        match index {
            SliceIndex::Index(expr) => {
                let key = self.eval_expr(ctx, expr)?;
                index_value(object, &key).map_err(Into::into)
            }
            SliceIndex::Slice { start, stop, step } => {
                let start = start.as_deref().map(|e| self.eval_expr(ctx, e)).transpose()?;
                let stop = stop.as_deref().map(|e| self.eval_expr(ctx, e)).transpose()?;
                let step = step.as_deref().map(|e| self.eval_expr(ctx, e)).transpose()?;
                slice_value(object, start, stop, step).map_err(Into::into)
            }
        }
    }
}

fn bind_params(
    call_ctx: &Context,
    params: &[dana_compiler::ast::Param],
    mut args: Vec<Value>,
    mut kwargs: HashMap<String, Value>,
) -> Result<(), Error> {
    let positional_count = args.len();
    args.reverse(); // pop() from the front in declaration order
    for (i, param) in params.iter().enumerate() {
        let value = if i < positional_count {
            args.pop().unwrap()
        } else if let Some(v) = kwargs.remove(&param.name) {
            v
        } else if let Some(default) = &param.default {
            // Defaults are plain literals/identifiers in practice; evaluate
            // them against the call context so a default referencing an
            // already-bound earlier parameter still works.
            default_to_value(default)?
        } else {
            return Err(Error::type_err(format!("missing required argument '{}'", param.name)));
        };
        let value = coerce_for_type_hint(value, param.type_hint.as_deref());
        call_ctx.set_in_scope(ScopeName::Local, &param.name, value);
    }
    if !kwargs.is_empty() {
        let names: Vec<_> = kwargs.keys().cloned().collect();
        return Err(Error::type_err(format!("unexpected keyword argument(s): {}", names.join(", "))));
    }
    Ok(())
}

fn default_to_value(expr: &Expr) -> Result<Value, Error> {
    match expr {
        Expr::Literal { value, .. } => Ok(value.clone().into()),
        _ => Err(Error::runtime("only literal default arguments are supported")),
    }
}

/// Assignment/parameter-binding coercion for a `: bool`/`: int`/`: float`
/// type annotation, including the enhanced string-token boolean rule of
/// §4.H applied only in this explicit-annotation boundary.
pub fn coerce_for_type_hint(value: Value, type_hint: Option<&str>) -> Value {
    match type_hint {
        Some("bool") => Value::Bool(coerce_to_bool(&value)),
        Some("int") => match &value {
            Value::Float(f) => Value::Integer(*f as i64),
            Value::Str(s) => s.trim().parse::<i64>().map(Value::Integer).unwrap_or(value),
            _ => value,
        },
        Some("float") => match &value {
            Value::Integer(i) => Value::Float(*i as f64),
            Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).unwrap_or(value),
            _ => value,
        },
        Some("str") => Value::Str(value.to_string()),
        _ => value,
    }
}

pub fn coerce_to_bool(value: &Value) -> bool {
    match value {
        Value::Str(s) => coerce_bool_token(s).unwrap_or_else(|| value.truthy()),
        other => other.truthy(),
    }
}

fn apply_binary(op: BinaryOp, l: Value, r: Value) -> Result<Value, Error> {
    use BinaryOp::*;
    match op {
        Eq => Ok(Value::Bool(Value::values_equal(&l, &r))),
        NotEq => Ok(Value::Bool(!Value::values_equal(&l, &r))),
        Lt | LtEq | Gt | GtEq => compare(op, &l, &r),
        In => Ok(Value::Bool(contains(&r, &l)?)),
        Add => add(l, r),
        Sub => numeric_op(l, r, "-", |a, b| a - b, |a, b| a - b),
        Mul => mul(l, r),
        Div => {
            let (a, b) = (as_f64(&l)?, as_f64(&r)?);
            if b == 0.0 {
                return Err(Error::value("division by zero"));
            }
            Ok(Value::Float(a / b))
        }
        FloorDiv => {
            let (a, b) = (as_f64(&l)?, as_f64(&r)?);
            if b == 0.0 {
                return Err(Error::value("division by zero"));
            }
            Ok(match (&l, &r) {
                (Value::Integer(_), Value::Integer(_)) => Value::Integer((a / b).floor() as i64),
                _ => Value::Float((a / b).floor()),
            })
        }
        Mod => {
            let (a, b) = (as_f64(&l)?, as_f64(&r)?);
            if b == 0.0 {
                return Err(Error::value("division by zero"));
            }
            Ok(match (&l, &r) {
                (Value::Integer(x), Value::Integer(y)) => Value::Integer(x.rem_euclid(*y)),
                _ => Value::Float(a.rem_euclid(b)),
            })
        }
        Pow => {
            let (a, b) = (as_f64(&l)?, as_f64(&r)?);
            let result = a.powf(b);
            Ok(match (&l, &r) {
                (Value::Integer(_), Value::Integer(y)) if *y >= 0 => Value::Integer(result as i64),
                _ => Value::Float(result),
            })
        }
        And | Or | Pipe => unreachable!("handled before apply_binary"),
    }
}

fn add(l: Value, r: Value) -> Result<Value, Error> {
    match (&l, &r) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        _ => numeric_op(l, r, "+", |a, b| a + b, |a, b| a + b),
    }
}

fn mul(l: Value, r: Value) -> Result<Value, Error> {
    match (&l, &r) {
        (Value::Str(s), Value::Integer(n)) | (Value::Integer(n), Value::Str(s)) => {
            Ok(Value::Str(s.repeat((*n).max(0) as usize)))
        }
        (Value::List(items), Value::Integer(n)) | (Value::Integer(n), Value::List(items)) => {
            let items = items.borrow();
            let mut out = Vec::with_capacity(items.len() * (*n).max(0) as usize);
            for _ in 0..(*n).max(0) {
                out.extend(items.iter().cloned());
            }
            Ok(Value::list(out))
        }
        _ => numeric_op(l, r, "*", |a, b| a * b, |a, b| a * b),
    }
}

fn numeric_op(
    l: Value,
    r: Value,
    symbol: &str,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, Error> {
    match (&l, &r) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(int_op(*a, *b))),
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            Ok(Value::Float(float_op(as_f64(&l)?, as_f64(&r)?)))
        }
        _ => Err(Error::type_err(format!(
            "unsupported operand types for '{symbol}': '{}' and '{}'",
            l.type_name(),
            r.type_name()
        ))),
    }
}

fn as_f64(v: &Value) -> Result<f64, Error> {
    match v {
        Value::Integer(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        other => Err(Error::type_err(format!("expected a number, got '{}'", other.type_name()))),
    }
}

fn compare(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, Error> {
    use std::cmp::Ordering;
    let ord = match (l, r) {
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            as_f64(l)?.partial_cmp(&as_f64(r)?).ok_or_else(|| Error::type_err("NaN is not ordered"))?
        }
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        _ => {
            return Err(Error::type_err(format!(
                "'{}' and '{}' cannot be compared",
                l.type_name(),
                r.type_name()
            )))
        }
    };
    Ok(Value::Bool(match op {
        BinaryOp::Lt => ord == Ordering::Less,
        BinaryOp::LtEq => ord != Ordering::Greater,
        BinaryOp::Gt => ord == Ordering::Greater,
        BinaryOp::GtEq => ord != Ordering::Less,
        _ => unreachable!(),
    }))
}

fn contains(container: &Value, needle: &Value) -> Result<bool, Error> {
    match container {
        Value::Str(s) => match needle {
            Value::Str(n) => Ok(s.contains(n.as_str())),
            other => Err(Error::type_err(format!("'in <str>' requires str, got '{}'", other.type_name()))),
        },
        Value::List(items) => Ok(items.borrow().iter().any(|v| Value::values_equal(v, needle))),
        Value::Tuple(items) => Ok(items.iter().any(|v| Value::values_equal(v, needle))),
        Value::Set(items) => Ok(items.borrow().iter().any(|v| Value::values_equal(v, needle))),
        Value::Dict(entries) => Ok(entries.borrow().iter().any(|(k, _)| Value::values_equal(k, needle))),
        other => Err(Error::type_err(format!("argument of type '{}' is not iterable", other.type_name()))),
    }
}

fn index_value(container: &Value, key: &Value) -> Result<Value, Error> {
    match container {
        Value::List(items) => {
            let items = items.borrow();
            let idx = normalize_index(key, items.len())?;
            items.get(idx).cloned().ok_or_else(|| Error::Index {
                index: key.to_string(),
                length: items.len(),
            })
        }
        Value::Tuple(items) => {
            let idx = normalize_index(key, items.len())?;
            items.get(idx).cloned().ok_or_else(|| Error::Index {
                index: key.to_string(),
                length: items.len(),
            })
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let idx = normalize_index(key, chars.len())?;
            chars.get(idx).map(|c| Value::Str(c.to_string())).ok_or_else(|| Error::Index {
                index: key.to_string(),
                length: chars.len(),
            })
        }
        Value::Dict(entries) => {
            let entries = entries.borrow();
            entries
                .iter()
                .find(|(k, _)| Value::values_equal(k, key))
                .map(|(_, v)| v.clone())
                .ok_or_else(|| Error::Key {
                    key: key.to_string(),
                    sample: entries.iter().take(5).map(|(k, _)| k.to_string()).collect::<Vec<_>>().join(", "),
                })
        }
        other => Err(Error::type_err(format!("'{}' is not subscriptable", other.type_name()))),
    }
}

fn normalize_index(key: &Value, len: usize) -> Result<usize, Error> {
    let i = match key {
        Value::Integer(i) => *i,
        other => return Err(Error::type_err(format!("index must be an integer, got '{}'", other.type_name()))),
    };
    let idx = if i < 0 { i + len as i64 } else { i };
    if idx < 0 || idx as usize >= len {
        return Err(Error::Index {
            index: i.to_string(),
            length: len,
        });
    }
    Ok(idx as usize)
}

fn resolve_slice_step(step: Option<Value>) -> Result<i64, Error> {
    let step = match step {
        Some(Value::Integer(s)) => s,
        Some(other) => return Err(Error::type_err(format!("slice step must be an integer, got '{}'", other.type_name()))),
        None => 1,
    };
    if step == 0 {
        return Err(Error::value("slice step cannot be zero"));
    }
    Ok(step)
}

fn resolve_slice_bounds(len: usize, start: &Option<Value>, stop: &Option<Value>, step: i64) -> Result<(i64, i64), Error> {
    let to_i = |v: &Option<Value>, default: i64| -> Result<i64, Error> {
        match v {
            Some(Value::Integer(i)) => Ok(*i),
            Some(other) => Err(Error::type_err(format!("slice indices must be integers, got '{}'", other.type_name()))),
            None => Ok(default),
        }
    };
    let len_i = len as i64;
    let (default_start, default_stop) = if step > 0 { (0, len_i) } else { (len_i - 1, -len_i - 1) };
    let mut s = to_i(start, default_start)?;
    let mut e = to_i(stop, default_stop)?;
    if s < 0 {
        s += len_i;
    }
    if e < 0 && !(stop.is_none() && step < 0) {
        e += len_i;
    }
    s = s.clamp(if step > 0 { 0 } else { -1 }, if step > 0 { len_i } else { len_i - 1 });
    e = e.clamp(if step > 0 { 0 } else { -1 }, if step > 0 { len_i } else { len_i - 1 });
    Ok((s, e))
}

fn slice_value(
    container: &Value,
    start: Option<Value>,
    stop: Option<Value>,
    step: Option<Value>,
) -> Result<Value, Error> {
    let step = resolve_slice_step(step)?;

    match container {
        Value::List(items) => {
            let items = items.borrow();
            let (s, e) = resolve_slice_bounds(items.len(), &start, &stop, step)?;
            Ok(Value::list(collect_sliced(&items, s, e, step)))
        }
        Value::Tuple(items) => {
            let (s, e) = resolve_slice_bounds(items.len(), &start, &stop, step)?;
            Ok(Value::tuple(collect_sliced(&items, s, e, step)))
        }
        Value::Str(text) => {
            let chars: Vec<char> = text.chars().collect();
            let (s, e) = resolve_slice_bounds(chars.len(), &start, &stop, step)?;
            let sliced = collect_sliced(&chars, s, e, step);
            Ok(Value::Str(sliced.into_iter().collect()))
        }
        other => Err(Error::type_err(format!("'{}' is not sliceable", other.type_name()))),
    }
}

/// Slice assignment (`a[i:j] = other_list`), list-like containers only.
/// Follows Python-list-assignment semantics: the replacement may be
/// shorter or longer than the slice it replaces, resizing the target.
pub(crate) fn assign_slice(
    container: &Value,
    start: Option<Value>,
    stop: Option<Value>,
    step: Option<Value>,
    value: Value,
) -> Result<(), Error> {
    let step_i = resolve_slice_step(step)?;
    if step_i != 1 {
        return Err(Error::runtime("extended slice assignment (step other than 1) is not supported"));
    }
    match container {
        Value::List(items) => {
            let replacement = value.iterable_items()?;
            let mut items = items.borrow_mut();
            let (s, e) = resolve_slice_bounds(items.len(), &start, &stop, step_i)?;
            let s = s as usize;
            let e = (e.max(s as i64)) as usize;
            items.splice(s..e, replacement);
            Ok(())
        }
        other => Err(Error::type_err(format!("'{}' does not support slice assignment", other.type_name()))),
    }
}

/// Item assignment (`container[key] = value`) for the mutable collection
/// kinds: list index replace, dict key upsert.
pub(crate) fn assign_subscript(container: &Value, key: Value, value: Value) -> Result<(), Error> {
    match container {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let idx = normalize_index(&key, items.len())?;
            items[idx] = value;
            Ok(())
        }
        Value::Dict(entries) => {
            let mut entries = entries.borrow_mut();
            if let Some(entry) = entries.iter_mut().find(|(k, _)| Value::values_equal(k, &key)) {
                entry.1 = value;
            } else {
                entries.push((key, value));
            }
            Ok(())
        }
        other => Err(Error::type_err(format!("'{}' does not support item assignment", other.type_name()))),
    }
}

fn collect_sliced<T: Clone>(items: &[T], start: i64, stop: i64, step: i64) -> Vec<T> {
    let mut out = Vec::new();
    if step > 0 {
        let mut i = start;
        while i < stop {
            if let Some(v) = items.get(i as usize) {
                out.push(v.clone());
            }
            i += step;
        }
    } else {
        let mut i = start;
        while i > stop {
            if i >= 0 {
                if let Some(v) = items.get(i as usize) {
                    out.push(v.clone());
                }
            }
            i += step;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn interp() -> Interpreter {
        Interpreter::new(vec![])
    }

    #[test]
    fn arithmetic_respects_integer_and_float_contamination() {
        let r = apply_binary(BinaryOp::Add, Value::Integer(2), Value::Integer(3)).unwrap();
        assert!(matches!(r, Value::Integer(5)));
        let r = apply_binary(BinaryOp::Add, Value::Integer(2), Value::Float(3.0)).unwrap();
        assert!(matches!(r, Value::Float(v) if v == 5.0));
    }

    #[test]
    fn division_by_zero_is_a_value_error() {
        let err = apply_binary(BinaryOp::Div, Value::Integer(1), Value::Integer(0)).unwrap_err();
        assert!(matches!(err, Error::Value { .. }));
    }

    #[test]
    fn string_multiply_repeats() {
        let r = apply_binary(BinaryOp::Mul, Value::Str("ab".into()), Value::Integer(3)).unwrap();
        assert_eq!(r.to_string(), "ababab");
    }

    #[test]
    fn enhanced_bool_coercion_recognises_affirmative_tokens() {
        assert!(coerce_to_bool(&Value::Str("definitely".into())));
        assert!(!coerce_to_bool(&Value::Str("nope".into())));
    }

    #[test]
    fn negative_index_wraps_from_the_end() {
        let list = Value::list(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        let v = index_value(&list, &Value::Integer(-1)).unwrap();
        assert!(matches!(v, Value::Integer(3)));
    }

    #[test]
    fn slice_step_zero_is_an_error() {
        let list = Value::list(vec![Value::Integer(1), Value::Integer(2)]);
        let err = slice_value(&list, None, None, Some(Value::Integer(0))).unwrap_err();
        assert!(matches!(err, Error::Value { .. }));
    }

    #[test]
    fn identifier_literal_round_trip_through_interpreter() {
        let ctx = Context::new(false);
        ctx.set_in_scope(ScopeName::Local, "x", Value::Integer(41));
        let interp = interp();
        let v = interp.eval_qualified(&ctx, "local.x").unwrap();
        assert!(matches!(v, Value::Integer(41)));
    }
}
