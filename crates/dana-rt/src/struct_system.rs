//! Struct System (Component G, §3.3 / §4.G).
//!
//! A sandbox-global registry of nominal record types, plus the instances
//! constructed from them. Method-sugar rewriting (`obj.m(a)` → `m(obj, a)`)
//! happens in the expression executor, not here, since it needs the
//! receiver's runtime type at dispatch time.

use crate::error::Error;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct StructType {
    pub name: String,
    pub field_order: Vec<String>,
    pub fields: HashMap<String, String>,
}

impl StructType {
    pub fn new(name: String, field_order: Vec<String>, fields: HashMap<String, String>) -> Self {
        Self {
            name,
            field_order,
            fields,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StructInstance {
    pub ty: Rc<StructType>,
    pub values: HashMap<String, Value>,
}

impl StructInstance {
    pub fn get_field(&self, name: &str) -> Result<Value, Error> {
        self.values.get(name).cloned().ok_or_else(|| Error::Attribute {
            type_name: self.ty.name.clone(),
            attr: name.to_string(),
            available: self.ty.field_order.join(", "),
        })
    }

    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), Error> {
        if !self.ty.fields.contains_key(name) {
            return Err(Error::Attribute {
                type_name: self.ty.name.clone(),
                attr: name.to_string(),
                available: self.ty.field_order.join(", "),
            });
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }
}

impl fmt::Display for StructInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.ty.name)?;
        for (i, field) in self.ty.field_order.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let v = self.values.get(field).cloned().unwrap_or(Value::None);
            write!(f, "{field}={v}")?;
        }
        write!(f, ")")
    }
}

/// Sandbox-global registry of declared struct types. Name collisions at
/// registration are rejected, matching §3.3 ("name collisions fail at
/// registration").
#[derive(Debug, Default)]
pub struct StructRegistry {
    types: HashMap<String, Rc<StructType>>,
}

impl StructRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, ty: StructType) -> Result<(), Error> {
        if self.types.contains_key(&ty.name) {
            return Err(Error::value(format!("struct '{}' is already defined", ty.name)));
        }
        self.types.insert(ty.name.clone(), Rc::new(ty));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Rc<StructType>> {
        self.types.get(name).cloned()
    }

    /// Validate and construct an instance from keyword arguments, enforcing
    /// that the field set matches exactly (§3.3, §8 boundary behaviour).
    pub fn construct(&self, name: &str, fields: HashMap<String, Value>) -> Result<StructInstance, Error> {
        let ty = self
            .get(name)
            .ok_or_else(|| Error::name(name, self.types.keys().cloned().collect()))?;

        let missing: Vec<String> = ty
            .field_order
            .iter()
            .filter(|f| !fields.contains_key(*f))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(Error::StructMissingFields {
                name: ty.name.clone(),
                fields: missing.join(", "),
            });
        }

        let extra: Vec<String> = fields
            .keys()
            .filter(|f| !ty.fields.contains_key(*f))
            .cloned()
            .collect();
        if !extra.is_empty() {
            return Err(Error::StructUnknownFields {
                name: ty.name.clone(),
                fields: extra.join(", "),
            });
        }

        Ok(StructInstance { ty, values: fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_type() -> StructType {
        let mut fields = HashMap::new();
        fields.insert("x".to_string(), "int".to_string());
        fields.insert("y".to_string(), "int".to_string());
        StructType::new("Point".to_string(), vec!["x".to_string(), "y".to_string()], fields)
    }

    #[test]
    fn construct_validates_missing_fields() {
        let mut reg = StructRegistry::new();
        reg.register(point_type()).unwrap();
        let mut fields = HashMap::new();
        fields.insert("x".to_string(), Value::Integer(1));
        let err = reg.construct("Point", fields).unwrap_err();
        assert!(matches!(err, Error::StructMissingFields { .. }));
    }

    #[test]
    fn construct_validates_extra_fields() {
        let mut reg = StructRegistry::new();
        reg.register(point_type()).unwrap();
        let mut fields = HashMap::new();
        fields.insert("x".to_string(), Value::Integer(1));
        fields.insert("y".to_string(), Value::Integer(2));
        fields.insert("z".to_string(), Value::Integer(3));
        let err = reg.construct("Point", fields).unwrap_err();
        assert!(matches!(err, Error::StructUnknownFields { .. }));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg = StructRegistry::new();
        reg.register(point_type()).unwrap();
        assert!(reg.register(point_type()).is_err());
    }

    #[test]
    fn field_order_is_preserved_for_display() {
        let mut reg = StructRegistry::new();
        reg.register(point_type()).unwrap();
        let mut fields = HashMap::new();
        fields.insert("x".to_string(), Value::Integer(3));
        fields.insert("y".to_string(), Value::Integer(4));
        let instance = reg.construct("Point", fields).unwrap();
        assert_eq!(instance.to_string(), "Point(x=3, y=4)");
    }
}
