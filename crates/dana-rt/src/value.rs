//! The runtime `Value` tagged union (§3.1).
//!
//! Broader than `dana_core::LiteralValue`: collections, functions, struct
//! instances, and foreign objects only come into existence at evaluation
//! time, so they live here rather than in `dana-core` (which the compiler
//! also depends on, and which must not depend back on the runtime or the
//! AST).

use crate::error::Error;
use crate::registry::Function;
use crate::struct_system::StructInstance;
use dana_core::LiteralValue;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Anything the embedding host owns and exposes attributes/methods for.
/// Dana never constructs one directly; a `HostFunction` or the module
/// loader's host-module bridge hands one back.
pub trait ForeignObject: fmt::Debug {
    fn type_name(&self) -> &str;
    fn get_attr(&self, _name: &str) -> Option<Value> {
        None
    }
}

#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<Vec<Value>>),
    /// An association list rather than a `HashMap`: Dana values (floats
    /// among them) aren't natively hashable, and Dana programs are short
    /// and interactive (§1), so linear key lookup is the right tradeoff.
    Dict(Rc<RefCell<Vec<(Value, Value)>>>),
    Set(Rc<RefCell<Vec<Value>>>),
    Function(Function),
    Struct(Rc<RefCell<StructInstance>>),
    Foreign(Rc<dyn ForeignObject>),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(items))
    }

    pub fn dict(entries: Vec<(Value, Value)>) -> Self {
        Value::Dict(Rc::new(RefCell::new(entries)))
    }

    pub fn set(items: Vec<Value>) -> Self {
        Value::Set(Rc::new(RefCell::new(items)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bool(_) => "bool",
            Value::None => "none",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Set(_) => "set",
            Value::Function(_) => "function",
            Value::Struct(s) => {
                // Leak-free: struct names outlive the sandbox, but we can't
                // return a borrowed &str from a RefCell, so callers needing
                // the real name use `Value::struct_type_name` instead.
                let _ = s;
                "struct"
            }
            Value::Foreign(_) => "foreign",
        }
    }

    pub fn struct_type_name(&self) -> Option<String> {
        match self {
            Value::Struct(s) => Some(s.borrow().ty.name.clone()),
            _ => None,
        }
    }

    /// Plain truthiness used by `if`/`while`/`and`/`or` — *not* the enhanced
    /// string-token coercion of §4.H, which only applies in an explicit
    /// boolean context.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::None => false,
            Value::List(l) => !l.borrow().is_empty(),
            Value::Tuple(t) => !t.is_empty(),
            Value::Dict(d) => !d.borrow().is_empty(),
            Value::Set(s) => !s.borrow().is_empty(),
            Value::Function(_) | Value::Struct(_) | Value::Foreign(_) => true,
        }
    }

    pub fn values_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Integer(x), Value::Integer(y)) => x == y,
            (Value::Integer(x), Value::Float(y)) | (Value::Float(y), Value::Integer(x)) => {
                (*x as f64) == *y
            }
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::None, Value::None) => true,
            (Value::List(x), Value::List(y)) => {
                let (x, y) = (x.borrow(), y.borrow());
                x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| Value::values_equal(a, b))
            }
            (Value::Tuple(x), Value::Tuple(y)) => {
                x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| Value::values_equal(a, b))
            }
            (Value::Set(x), Value::Set(y)) => {
                let (x, y) = (x.borrow(), y.borrow());
                x.len() == y.len()
                    && x.iter()
                        .all(|a| y.iter().any(|b| Value::values_equal(a, b)))
            }
            (Value::Dict(x), Value::Dict(y)) => {
                let (x, y) = (x.borrow(), y.borrow());
                x.len() == y.len() && x.iter().all(|(k, v)| {
                    y.iter()
                        .any(|(k2, v2)| Value::values_equal(k, k2) && Value::values_equal(v, v2))
                })
            }
            (Value::Struct(x), Value::Struct(y)) => Rc::ptr_eq(x, y),
            (Value::Foreign(x), Value::Foreign(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }

    /// The element sequence a `for`/`list(...)` walks: list/tuple/set items
    /// in stored order, dict keys, or a string's characters.
    pub fn iterable_items(&self) -> Result<Vec<Value>, Error> {
        match self {
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Tuple(items) => Ok(items.as_ref().clone()),
            Value::Set(items) => Ok(items.borrow().clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::Dict(entries) => Ok(entries.borrow().iter().map(|(k, _)| k.clone()).collect()),
            other => Err(Error::type_err(format!("'{}' object is not iterable", other.type_name()))),
        }
    }
}

impl From<LiteralValue> for Value {
    fn from(lit: LiteralValue) -> Self {
        match lit {
            LiteralValue::Integer(i) => Value::Integer(i),
            LiteralValue::Float(f) => Value::Float(f),
            LiteralValue::Str(s) => Value::Str(s),
            LiteralValue::Bool(b) => Value::Bool(b),
            LiteralValue::None => Value::None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::None => write!(f, "None"),
            Value::List(items) => {
                let items = items.borrow();
                write!(f, "[{}]", items.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))
            }
            Value::Tuple(items) => {
                write!(f, "({})", items.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))
            }
            Value::Dict(entries) => {
                let entries = entries.borrow();
                write!(
                    f,
                    "{{{}}}",
                    entries
                        .iter()
                        .map(|(k, v)| format!("{k}: {v}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Value::Set(items) => {
                let items = items.borrow();
                write!(f, "{{{}}}", items.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))
            }
            Value::Function(_) => write!(f, "<function>"),
            Value::Struct(s) => write!(f, "{}", s.borrow()),
            Value::Foreign(obj) => write!(f, "<foreign {}>", obj.type_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_and_float_compare_by_numeric_value() {
        assert!(Value::values_equal(&Value::Integer(2), &Value::Float(2.0)));
    }

    #[test]
    fn empty_collections_are_falsy() {
        assert!(!Value::list(vec![]).truthy());
        assert!(Value::list(vec![Value::Integer(1)]).truthy());
    }

    #[test]
    fn display_renders_lists_python_style() {
        let v = Value::list(vec![Value::Integer(1), Value::Str("a".into())]);
        assert_eq!(v.to_string(), "[1, a]");
    }
}
