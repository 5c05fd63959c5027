//! Structural shape checking for job input objects.
//!
//! Independent of the concurrency core. A shape lists named properties (with a type
//! name) and methods (with overload signatures); a candidate satisfies a shape when it
//! carries every listed member.

mod checker;
mod signature;

use serde_json::{Map, Value};

use crate::jobs::ArgumentBinding;

pub use checker::{ShapeChecker, StructuralShapeChecker};
pub use signature::MethodSignature;

/// A named data member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyShape {
    /// Member name, matched case-insensitively.
    pub name: String,
    /// Type name, matched exactly.
    pub type_name: String,
}

/// A callable member and its overloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodShape {
    /// Member name, matched case-insensitively.
    pub name: String,
    /// Accepted parameter lists.
    pub overloads: Vec<MethodSignature>,
}

/// Member listing of an object or of an expected contract.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectShape {
    /// Shape name used in mismatch errors.
    pub name: String,
    /// Data members.
    pub properties: Vec<PropertyShape>,
    /// Callable members.
    pub methods: Vec<MethodShape>,
}

impl ObjectShape {
    /// Empty shape called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.properties.push(PropertyShape {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    /// Add a method with its overloads.
    #[must_use]
    pub fn with_method(mut self, name: impl Into<String>, overloads: Vec<MethodSignature>) -> Self {
        self.methods.push(MethodShape {
            name: name.into(),
            overloads,
        });
        self
    }

    /// Property-only shape of a JSON object; each value contributes its JSON type name.
    #[must_use]
    pub fn from_json(name: impl Into<String>, object: &Map<String, Value>) -> Self {
        let mut shape = Self::new(name);
        for (key, value) in object {
            shape = shape.with_property(key.clone(), json_type_name(value));
        }
        shape
    }

    /// Shape of the object carried by a binding. Named parameters and scalar objects
    /// produce properties; anything else has no members.
    #[must_use]
    pub fn from_binding(binding: &ArgumentBinding) -> Self {
        match binding {
            ArgumentBinding::Named(map) | ArgumentBinding::Scalar(Value::Object(map)) => {
                Self::from_json("input", map)
            }
            ArgumentBinding::Scalar(_) | ArgumentBinding::Positional(_) => Self::new("input"),
        }
    }
}

/// JSON type name used for inferred property types.
#[must_use]
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
