use super::Value;
use crate::{
    log::{Error, INVALID_REGISTRY},
    value::ValueUnit,
};
use serde::Serialize;
use std::collections::HashMap;

/// Resolved properties of other elements, keyed by selector and then by
/// property name.
///
/// # Examples
///
/// ```
/// use chtl::{PropertyRegistry, Value, ValueUnit};
/// use serde_json::json;
///
/// let registry = PropertyRegistry::from_json(&json!({
///     "box": { "width": "100px", "visible": true },
/// }))
/// .unwrap();
///
/// assert_eq!(
///     registry.get("box", "width"),
///     Some(&Value::Number(ValueUnit::new(100.0, "px")))
/// );
/// ```
#[derive(Debug, Default, PartialEq, Clone, Serialize)]
pub struct PropertyRegistry {
    selectors: HashMap<String, HashMap<String, Value>>,
}

impl PropertyRegistry {
    /// Create a new, empty [`PropertyRegistry`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the resolved value of a property.
    pub fn insert<S, P, V>(&mut self, selector: S, property: P, value: V)
    where
        S: Into<String>,
        P: Into<String>,
        V: Into<Value>,
    {
        self.selectors
            .entry(selector.into())
            .or_default()
            .insert(property.into(), value.into());
    }

    /// Insert the resolved value of a property.
    ///
    /// Returns the [`PropertyRegistry`], so additional methods may be chained.
    pub fn with<S, P, V>(mut self, selector: S, property: P, value: V) -> Self
    where
        S: Into<String>,
        P: Into<String>,
        V: Into<Value>,
    {
        self.insert(selector, property, value);

        self
    }

    /// Return the value of the property, if the selector has it.
    pub fn get(&self, selector: &str, property: &str) -> Option<&Value> {
        self.selectors.get(selector)?.get(property)
    }

    /// Return the number of selectors.
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Return true if the registry has no selectors.
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Create a new [`PropertyRegistry`] from a JSON object of objects,
    /// `{ "selector": { "property": "100px" } }`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the JSON does not have that shape, or a
    /// property is not a string, number or boolean.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, Error> {
        let mut registry = Self::new();

        for (selector, properties) in as_object(json, "the registry")? {
            for (property, value) in as_object(properties, &format!("selector `{selector}`"))? {
                let value = from_json_value(value, &format!("{selector}.{property}"))?;
                registry.insert(selector.as_str(), property.as_str(), value);
            }
        }

        Ok(registry)
    }
}

/// Values of bare names used in an expression, such as the properties of
/// the element being styled.
#[derive(Debug, Default, PartialEq, Clone, Serialize)]
pub struct LocalContext {
    names: HashMap<String, Value>,
}

impl LocalContext {
    /// Create a new, empty [`LocalContext`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the value of a name.
    pub fn insert<N, V>(&mut self, name: N, value: V)
    where
        N: Into<String>,
        V: Into<Value>,
    {
        self.names.insert(name.into(), value.into());
    }

    /// Insert the value of a name.
    ///
    /// Returns the [`LocalContext`], so additional methods may be chained.
    pub fn with<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<Value>,
    {
        self.insert(name, value);

        self
    }

    /// Return the value of the name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.names.get(name)
    }

    /// Create a new [`LocalContext`] from a JSON object, `{ "width": "10px" }`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the JSON is not an object, or a value is not
    /// a string, number or boolean.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, Error> {
        let mut local = Self::new();
        for (name, value) in as_object(json, "the local context")? {
            local.insert(name.as_str(), from_json_value(value, name)?);
        }

        Ok(local)
    }
}

/// Return the entries of a JSON object.
fn as_object<'a>(
    json: &'a serde_json::Value,
    what: &str,
) -> Result<&'a serde_json::Map<String, serde_json::Value>, Error> {
    json.as_object().ok_or_else(|| {
        Error::build(INVALID_REGISTRY).with_help(format!("{what} must be a JSON object"))
    })
}

/// Convert one JSON value into a [`Value`].
fn from_json_value(json: &serde_json::Value, path: &str) -> Result<Value, Error> {
    match json {
        serde_json::Value::String(text) => Ok(Value::parse(text)),
        serde_json::Value::Bool(bo) => Ok(Value::Bool(*bo)),
        serde_json::Value::Number(nu) => match nu.as_f64() {
            Some(magnitude) => Ok(Value::from(ValueUnit::unitless(magnitude))),
            None => Err(invalid_value(path)),
        },
        _ => Err(invalid_value(path)),
    }
}

fn invalid_value(path: &str) -> Error {
    Error::build(INVALID_REGISTRY).with_help(format!(
        "`{path}` must be a string, a number or a boolean"
    ))
}
