//! Parameter schemas and validation.
//!
//! Each plugin declares a static [`ParamSchema`]. Validation reads raw JSON
//! arguments from configuration, applies defaults, coerces values to the
//! declared types and checks constraints, producing normalized [`Params`] or
//! a field-level [`ParamError`] before any execution logic runs.
//!
//! Validation is pure: the same schema and input always yield the same
//! output, and re-validating normalized output (via [`Params::to_raw`]) is a
//! no-op.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParamError;
use crate::values::json_type_name;

/// Raw arguments as supplied by configuration.
pub type RawParams = serde_json::Map<String, Value>;

/// How validation treats keys the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Unknown keys are ignored for forward compatibility
    #[default]
    Lenient,
    /// Unknown keys fail with [`ParamError::Unknown`]
    Strict,
}

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// `true` or `false`
    Bool,
    /// Whole number; integral floats are accepted
    Integer,
    /// Any finite number
    Float,
    /// Free text
    String,
    /// A string that must compile as a regular expression
    Regex,
    /// Array of finite numbers
    FloatList,
}

impl ParamType {
    fn name(&self) -> &'static str {
        match self {
            ParamType::Bool => "boolean",
            ParamType::Integer => "integer",
            ParamType::Float => "float",
            ParamType::String => "string",
            ParamType::Regex => "regex",
            ParamType::FloatList => "list of floats",
        }
    }
}

/// A constraint on a parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "constraint", rename_all = "snake_case")]
pub enum Constraint {
    /// Inclusive numeric bounds; applies to each element of a list
    Range {
        /// Lower bound
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        /// Upper bound
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// String must be one of the listed values
    OneOf {
        /// Accepted values
        values: Vec<String>,
    },
    /// String or list must not be empty
    NonEmpty,
}

/// A normalized parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String or regex source
    Str(String),
    /// List of floats
    FloatList(Vec<f64>),
}

impl ParamValue {
    /// Converts back into the raw JSON form.
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::Int(i) => Value::from(*i),
            ParamValue::Float(f) => Value::from(*f),
            ParamValue::Str(s) => Value::String(s.clone()),
            ParamValue::FloatList(list) => Value::Array(list.iter().map(|f| Value::from(*f)).collect()),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "boolean",
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Str(_) => "string",
            ParamValue::FloatList(_) => "list of floats",
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(value: Vec<f64>) -> Self {
        ParamValue::FloatList(value)
    }
}

/// Declaration of a single parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    /// Parameter name as it appears in configuration
    pub name: &'static str,
    /// Declared type
    #[serde(rename = "type")]
    pub param_type: ParamType,
    /// Whether the parameter must be supplied when there is no default
    pub required: bool,
    /// Value used when the parameter is absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
    /// Constraints checked after coercion
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    /// Short description for documentation
    pub description: &'static str,
}

impl ParamSpec {
    /// Declares an optional parameter without a default.
    pub fn new(name: &'static str, param_type: ParamType) -> Self {
        Self {
            name,
            param_type,
            required: false,
            default: None,
            constraints: Vec::new(),
            description: "",
        }
    }

    /// Marks the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    pub fn default_value(mut self, value: impl Into<ParamValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Adds inclusive numeric bounds.
    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.constraints.push(Constraint::Range { min, max });
        self
    }

    /// Adds an inclusive lower bound.
    pub fn at_least(self, min: f64) -> Self {
        self.range(Some(min), None)
    }

    /// Adds inclusive lower and upper bounds.
    pub fn between(self, min: f64, max: f64) -> Self {
        self.range(Some(min), Some(max))
    }

    /// Restricts a string to the listed values.
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.constraints.push(Constraint::OneOf {
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    /// Rejects empty strings and lists.
    pub fn non_empty(mut self) -> Self {
        self.constraints.push(Constraint::NonEmpty);
        self
    }

    /// Sets the documentation text.
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    fn type_error(&self, value: &Value) -> ParamError {
        ParamError::Type {
            field: self.name.to_string(),
            expected: self.param_type.name().to_string(),
            found: json_type_name(value).to_string(),
        }
    }

    /// Coerces a raw value to the declared type.
    fn coerce(&self, value: &Value) -> Result<ParamValue, ParamError> {
        match (self.param_type, value) {
            (ParamType::Bool, Value::Bool(b)) => Ok(ParamValue::Bool(*b)),
            (ParamType::Integer, Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Ok(ParamValue::Int(i));
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                        Ok(ParamValue::Int(f as i64))
                    }
                    _ => Err(ParamError::Type {
                        field: self.name.to_string(),
                        expected: self.param_type.name().to_string(),
                        found: format!("non-integral number {}", n),
                    }),
                }
            }
            (ParamType::Float, Value::Number(n)) => n
                .as_f64()
                .map(ParamValue::Float)
                .ok_or_else(|| self.type_error(value)),
            (ParamType::String, Value::String(s)) => Ok(ParamValue::Str(s.clone())),
            (ParamType::Regex, Value::String(s)) => match Regex::new(s) {
                Ok(_) => Ok(ParamValue::Str(s.clone())),
                Err(e) => Err(ParamError::range(self.name, format!("invalid regex: {}", e))),
            },
            (ParamType::FloatList, Value::Array(items)) => items
                .iter()
                .map(|item| item.as_f64().ok_or_else(|| self.type_error(item)))
                .collect::<Result<Vec<f64>, ParamError>>()
                .map(ParamValue::FloatList),
            _ => Err(self.type_error(value)),
        }
    }

    fn check_bound(&self, v: f64, min: Option<f64>, max: Option<f64>) -> Result<(), ParamError> {
        if let Some(min) = min
            && v < min
        {
            return Err(ParamError::range(self.name, format!("{} must be >= {}", v, min)));
        }
        if let Some(max) = max
            && v > max
        {
            return Err(ParamError::range(self.name, format!("{} must be <= {}", v, max)));
        }
        Ok(())
    }

    /// Checks constraints against a coerced value.
    fn check(&self, value: &ParamValue) -> Result<(), ParamError> {
        for constraint in &self.constraints {
            match (constraint, value) {
                (Constraint::Range { min, max }, ParamValue::Int(i)) => {
                    self.check_bound(*i as f64, *min, *max)?
                }
                (Constraint::Range { min, max }, ParamValue::Float(f)) => {
                    self.check_bound(*f, *min, *max)?
                }
                (Constraint::Range { min, max }, ParamValue::FloatList(list)) => {
                    for f in list {
                        self.check_bound(*f, *min, *max)?;
                    }
                }
                (Constraint::OneOf { values }, ParamValue::Str(s)) => {
                    if !values.iter().any(|v| v == s) {
                        return Err(ParamError::range(
                            self.name,
                            format!("'{}' must be one of {:?}", s, values),
                        ));
                    }
                }
                (Constraint::NonEmpty, ParamValue::Str(s)) if s.is_empty() => {
                    return Err(ParamError::range(self.name, "must not be empty"));
                }
                (Constraint::NonEmpty, ParamValue::FloatList(list)) if list.is_empty() => {
                    return Err(ParamError::range(self.name, "must not be empty"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Declared parameters of a plugin, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParamSchema {
    fields: Vec<ParamSpec>,
}

impl ParamSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method adding a field.
    pub fn field(mut self, spec: ParamSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Declared fields.
    pub fn fields(&self) -> &[ParamSpec] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true if no parameters are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validates raw arguments and returns normalized parameters.
    ///
    /// Explicit JSON `null` is treated the same as an absent key.
    ///
    /// # Errors
    /// - [`ParamError::Unknown`] for undeclared keys in strict mode
    /// - [`ParamError::MissingRequired`] for required fields without value or default
    /// - [`ParamError::Type`] when a value cannot be coerced
    /// - [`ParamError::Range`] when a constraint is violated
    pub fn validate(&self, raw: &RawParams, mode: ValidationMode) -> Result<Params, ParamError> {
        if mode == ValidationMode::Strict
            && let Some(unknown) = raw.keys().find(|key| self.get(key).is_none())
        {
            return Err(ParamError::Unknown {
                field: unknown.clone(),
            });
        }

        let mut params = Params::default();
        for spec in &self.fields {
            let value = match raw.get(spec.name).filter(|v| !v.is_null()) {
                Some(raw_value) => spec.coerce(raw_value)?,
                None => match &spec.default {
                    Some(default) => default.clone(),
                    None if spec.required => {
                        return Err(ParamError::MissingRequired {
                            field: spec.name.to_string(),
                        });
                    }
                    None => continue,
                },
            };
            spec.check(&value)?;
            params.values.insert(spec.name.to_string(), value);
        }
        Ok(params)
    }
}

/// Normalized parameters produced by validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method inserting a value; intended for tests and programmatic use.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Looks up a value.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Number of parameters present.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no parameters are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Converts back into raw arguments.
    pub fn to_raw(&self) -> RawParams {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    fn required(&self, name: &str) -> Result<&ParamValue, ParamError> {
        self.values.get(name).ok_or_else(|| ParamError::MissingRequired {
            field: name.to_string(),
        })
    }

    fn mismatch(name: &str, expected: &str, found: &ParamValue) -> ParamError {
        ParamError::Type {
            field: name.to_string(),
            expected: expected.to_string(),
            found: found.type_name().to_string(),
        }
    }

    /// Reads a boolean parameter.
    pub fn bool(&self, name: &str) -> Result<bool, ParamError> {
        match self.required(name)? {
            ParamValue::Bool(b) => Ok(*b),
            other => Err(Self::mismatch(name, "boolean", other)),
        }
    }

    /// Reads an integer parameter.
    pub fn int(&self, name: &str) -> Result<i64, ParamError> {
        match self.required(name)? {
            ParamValue::Int(i) => Ok(*i),
            other => Err(Self::mismatch(name, "integer", other)),
        }
    }

    /// Reads a float parameter; integers are widened.
    pub fn float(&self, name: &str) -> Result<f64, ParamError> {
        match self.required(name)? {
            ParamValue::Float(f) => Ok(*f),
            ParamValue::Int(i) => Ok(*i as f64),
            other => Err(Self::mismatch(name, "float", other)),
        }
    }

    /// Reads an optional float parameter.
    pub fn opt_float(&self, name: &str) -> Result<Option<f64>, ParamError> {
        if self.values.contains_key(name) {
            self.float(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads a string parameter.
    pub fn str(&self, name: &str) -> Result<&str, ParamError> {
        match self.required(name)? {
            ParamValue::Str(s) => Ok(s),
            other => Err(Self::mismatch(name, "string", other)),
        }
    }

    /// Reads a regex parameter and compiles it.
    pub fn regex(&self, name: &str) -> Result<Regex, ParamError> {
        let pattern = self.str(name)?;
        Regex::new(pattern).map_err(|e| ParamError::range(name, format!("invalid regex: {}", e)))
    }

    /// Reads a list-of-floats parameter.
    pub fn float_list(&self, name: &str) -> Result<&[f64], ParamError> {
        match self.required(name)? {
            ParamValue::FloatList(list) => Ok(list),
            other => Err(Self::mismatch(name, "list of floats", other)),
        }
    }
}

#[cfg(test)]
mod tests;
