//! Typed element properties.
//!
//! Every element kind declares the properties it understands as a list of
//! [`PropertySpec`]s. Writes are checked against that declaration: unknown
//! names and values of the wrong type are rejected instead of being ignored.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// A property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A floating-point value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
}

impl PropertyValue {
    /// The type of this value.
    pub fn kind(&self) -> PropertyType {
        match self {
            PropertyValue::String(_) => PropertyType::String,
            PropertyValue::Integer(_) => PropertyType::Integer,
            PropertyValue::Float(_) => PropertyType::Float,
            PropertyValue::Bool(_) => PropertyType::Bool,
        }
    }

    /// Get as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a u64.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|i| u64::try_from(i).ok())
    }

    /// Get as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "\"{s}\""),
            PropertyValue::Integer(i) => write!(f, "{i}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl From<&std::path::Path> for PropertyValue {
    fn from(v: &std::path::Path) -> Self {
        PropertyValue::String(v.to_string_lossy().into_owned())
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Integer(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Integer(i64::from(v))
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        PropertyValue::Integer(i64::from(v))
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

/// The declared type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// UTF-8 string.
    String,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyType::String => "string",
            PropertyType::Integer => "integer",
            PropertyType::Float => "float",
            PropertyType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Declaration of one property an element kind recognizes.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    /// Property name.
    pub name: &'static str,
    /// Value type.
    pub kind: PropertyType,
    /// Value used when nothing was set.
    pub default: Option<PropertyValue>,
    /// Whether the property must be set before the element leaves Null.
    pub required: bool,
    /// One-line description.
    pub blurb: &'static str,
}

impl PropertySpec {
    fn new(name: &'static str, kind: PropertyType, blurb: &'static str) -> Self {
        Self {
            name,
            kind,
            default: None,
            required: false,
            blurb,
        }
    }

    /// Declare a string property.
    pub fn string(name: &'static str, blurb: &'static str) -> Self {
        Self::new(name, PropertyType::String, blurb)
    }

    /// Declare an integer property.
    pub fn integer(name: &'static str, blurb: &'static str) -> Self {
        Self::new(name, PropertyType::Integer, blurb)
    }

    /// Declare a float property.
    pub fn float(name: &'static str, blurb: &'static str) -> Self {
        Self::new(name, PropertyType::Float, blurb)
    }

    /// Declare a boolean property.
    pub fn boolean(name: &'static str, blurb: &'static str) -> Self {
        Self::new(name, PropertyType::Bool, blurb)
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<PropertyValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark the property as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// The property record of one element.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    specs: Vec<PropertySpec>,
    values: HashMap<&'static str, PropertyValue>,
}

impl Properties {
    /// Create a record from the declared specs.
    pub fn new(specs: Vec<PropertySpec>) -> Self {
        Self {
            specs,
            values: HashMap::new(),
        }
    }

    /// The declared specs.
    pub fn specs(&self) -> &[PropertySpec] {
        &self.specs
    }

    /// Look up a declaration.
    pub fn spec(&self, name: &str) -> Option<&PropertySpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// Set a value after checking it against the declaration.
    pub(crate) fn set(&mut self, element: &str, name: &str, value: PropertyValue) -> Result<()> {
        let invalid = |reason: String| Error::InvalidProperty {
            element: element.to_string(),
            property: name.to_string(),
            reason,
        };

        let spec = self
            .spec(name)
            .ok_or_else(|| invalid("no such property".to_string()))?;
        if spec.kind != value.kind() {
            return Err(invalid(format!(
                "expected {}, got {}",
                spec.kind,
                value.kind()
            )));
        }

        let key = spec.name;
        self.values.insert(key, value);
        Ok(())
    }

    /// The current value, falling back to the declared default.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values
            .get(name)
            .or_else(|| self.spec(name).and_then(|s| s.default.as_ref()))
    }

    /// Get a string property.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropertyValue::as_str)
    }

    /// Get an integer property.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PropertyValue::as_i64)
    }

    /// Get a boolean property.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(PropertyValue::as_bool)
    }

    /// Whether the value was explicitly set.
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Name of the first required property that has no value.
    pub fn missing_required(&self) -> Option<&'static str> {
        self.specs
            .iter()
            .find(|s| s.required && !self.values.contains_key(s.name))
            .map(|s| s.name)
    }
}
