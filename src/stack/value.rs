//! Property values, literal or deferred
//!
//! A [`Value`] is what a property holds while the stack is being composed. It is either
//! already concrete ([`Value::Literal`]), a container of further values, a
//! [`Reference`] to an attribute of another resource that does not exist yet, or a
//! [`Value::Join`] that concatenates resolved parts into one string.
//!
//! Nothing is resolved implicitly. References stay references until the resolver walks
//! the property tree during synthesis and swaps each one for the target's computed
//! attribute, producing a [`Literal`].
//!
//! # Wire Form
//!
//! In stack definition files a value is plain JSON/YAML, with two intrinsic forms:
//!
//! ```yaml
//! KmsMasterKeyId: { "Fn::GetAtt": [key, arn] }
//! Resource: { "Fn::Join": ["", [{ "Fn::GetAtt": [bucket, arn] }, "/*"]] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::SynthError;

const GET_ATT: &str = "Fn::GetAtt";
const JOIN: &str = "Fn::Join";

/// A fully concrete value.
///
/// Serializes untagged, so a resolved property map renders as ordinary JSON/YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// JSON null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer or float, kept in its exact JSON representation
    Number(Number),
    /// String
    String(String),
    /// Ordered list
    List(Vec<Literal>),
    /// Map with keys in ascending order
    Map(BTreeMap<String, Literal>),
}

impl Literal {
    /// String payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Build a literal from arbitrary JSON. Intrinsic forms are not interpreted.
    #[must_use]
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => Self::Number(n),
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            JsonValue::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from_json(v))).collect())
            }
        }
    }

    /// Convert to JSON.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Number(n) => JsonValue::Number(n.clone()),
            Self::String(s) => JsonValue::String(s.clone()),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => {
                JsonValue::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }

    /// Text used when this literal is a part of a [`Value::Join`].
    ///
    /// Scalars render as their JSON text (strings unquoted). Lists and maps have no
    /// string form and return `None`.
    #[must_use]
    pub fn join_text(&self) -> Option<String> {
        match self {
            Self::Null => Some(String::new()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::List(_) | Self::Map(_) => None,
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

/// A deferred pointer at another resource's attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    /// Logical id of the node that will produce the attribute
    pub target: String,
    /// Attribute name, one of the target type's exposed attributes
    pub attribute: String,
}

impl Reference {
    /// Create a reference. Prefer [`ResourceNode::reference`](super::ResourceNode::reference),
    /// which checks the attribute against the target's type.
    pub fn new(target: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.attribute)
    }
}

/// A property value, possibly containing deferred references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "JsonValue", into = "JsonValue")]
pub enum Value {
    /// Concrete value
    Literal(Literal),
    /// List whose items may hold references
    List(Vec<Value>),
    /// Map whose values may hold references
    Map(BTreeMap<String, Value>),
    /// Attribute of another resource
    Reference(Reference),
    /// String concatenation of the resolved parts
    Join {
        /// Inserted between consecutive parts
        separator: String,
        /// Parts to concatenate
        parts: Vec<Value>,
    },
}

impl Value {
    /// Plain literal from JSON. `Fn::` keys are kept as ordinary map keys.
    #[must_use]
    pub fn literal(json: JsonValue) -> Self {
        Self::Literal(Literal::from_json(json))
    }

    /// Concatenate `parts` with no separator.
    pub fn concat(parts: impl IntoIterator<Item = Value>) -> Self {
        Self::Join {
            separator: String::new(),
            parts: parts.into_iter().collect(),
        }
    }

    /// Concatenate `parts` with `separator` between them.
    pub fn join(separator: impl Into<String>, parts: impl IntoIterator<Item = Value>) -> Self {
        Self::Join {
            separator: separator.into(),
            parts: parts.into_iter().collect(),
        }
    }

    /// List of values.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Map of values.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Whether any reference occurs anywhere inside this value.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        let mut found = false;
        self.visit_references(&mut |_| found = true);
        found
    }

    /// Call `visit` for every reference in the tree, depth first, in property order.
    pub fn visit_references<'a>(&'a self, visit: &mut impl FnMut(&'a Reference)) {
        match self {
            Self::Literal(_) => {}
            Self::Reference(reference) => visit(reference),
            Self::List(items) | Self::Join { parts: items, .. } => {
                for item in items {
                    item.visit_references(visit);
                }
            }
            Self::Map(map) => {
                for value in map.values() {
                    value.visit_references(visit);
                }
            }
        }
    }

    /// Every reference in the tree.
    #[must_use]
    pub fn references(&self) -> Vec<&Reference> {
        let mut refs = Vec::new();
        self.visit_references(&mut |r| refs.push(r));
        refs
    }

    /// Parse the wire form, interpreting `Fn::GetAtt` and `Fn::Join`.
    pub fn from_json(json: JsonValue) -> Result<Self, SynthError> {
        match json {
            JsonValue::Array(items) => {
                Ok(Self::List(items.into_iter().map(Self::from_json).collect::<Result<_, _>>()?))
            }
            JsonValue::Object(map) => {
                if map.len() == 1 {
                    if let Some(args) = map.get(GET_ATT) {
                        return parse_get_att(args);
                    }
                    if let Some(args) = map.get(JOIN) {
                        return parse_join(args);
                    }
                }
                let entries = map
                    .into_iter()
                    .map(|(k, v)| Ok((k, Self::from_json(v)?)))
                    .collect::<Result<BTreeMap<_, _>, SynthError>>()?;
                Ok(Self::Map(entries))
            }
            scalar => Ok(Self::Literal(Literal::from_json(scalar))),
        }
    }

    /// Render the wire form.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Literal(literal) => literal.to_json(),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => {
                JsonValue::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            Self::Reference(reference) => {
                let mut obj = Map::new();
                obj.insert(
                    GET_ATT.to_string(),
                    JsonValue::Array(vec![
                        JsonValue::String(reference.target.clone()),
                        JsonValue::String(reference.attribute.clone()),
                    ]),
                );
                JsonValue::Object(obj)
            }
            Self::Join { separator, parts } => {
                let mut obj = Map::new();
                obj.insert(
                    JOIN.to_string(),
                    JsonValue::Array(vec![
                        JsonValue::String(separator.clone()),
                        JsonValue::Array(parts.iter().map(Self::to_json).collect()),
                    ]),
                );
                JsonValue::Object(obj)
            }
        }
    }
}

fn parse_get_att(args: &JsonValue) -> Result<Value, SynthError> {
    let invalid = || SynthError::InvalidDefinition {
        reason: format!("{GET_ATT} expects [target, attribute] or \"target.attribute\", got {args}"),
    };

    match args {
        JsonValue::Array(items) if items.len() == 2 => {
            let target = items[0].as_str().ok_or_else(invalid)?;
            let attribute = items[1].as_str().ok_or_else(invalid)?;
            Ok(Value::Reference(Reference::new(target, attribute)))
        }
        JsonValue::String(dotted) => {
            let (target, attribute) = dotted.split_once('.').ok_or_else(invalid)?;
            Ok(Value::Reference(Reference::new(target, attribute)))
        }
        _ => Err(invalid()),
    }
}

fn parse_join(args: &JsonValue) -> Result<Value, SynthError> {
    let invalid = || SynthError::InvalidDefinition {
        reason: format!("{JOIN} expects [separator, [parts...]], got {args}"),
    };

    let JsonValue::Array(items) = args else {
        return Err(invalid());
    };
    let [separator, JsonValue::Array(parts)] = items.as_slice() else {
        return Err(invalid());
    };
    let separator = separator.as_str().ok_or_else(invalid)?;
    let parts =
        parts.iter().cloned().map(Value::from_json).collect::<Result<Vec<_>, SynthError>>()?;
    Ok(Value::join(separator, parts))
}

impl TryFrom<JsonValue> for Value {
    type Error = SynthError;

    fn try_from(json: JsonValue) -> Result<Self, Self::Error> {
        Self::from_json(json)
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        value.to_json()
    }
}

impl From<Literal> for Value {
    fn from(value: Literal) -> Self {
        Self::Literal(value)
    }
}

impl From<Reference> for Value {
    fn from(value: Reference) -> Self {
        Self::Reference(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Literal(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Literal(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Literal(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Literal(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Literal(value.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Self::Map(value)
    }
}
