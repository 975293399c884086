//! Parameter values, declarations, and type inference.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// A single string value.
    String,
    /// An ordered sequence of strings.
    Array,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Array => write!(f, "array"),
        }
    }
}

/// A parameter's runtime value: either a string or an array of strings.
///
/// The type tag is optional so that values built programmatically can defer
/// to [`ParamValue::resolved_type`], which infers it from the payload.
/// Values read from a document always carry the tag of their shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamValue {
    /// Explicit type, if known.
    pub kind: Option<ParamType>,
    /// String payload.
    pub string_val: String,
    /// Array payload.
    pub array_val: Vec<String>,
}

impl ParamValue {
    /// Creates a string-typed value.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            kind: Some(ParamType::String),
            string_val: value.into(),
            array_val: Vec::new(),
        }
    }

    /// Creates an array-typed value.
    #[must_use]
    pub fn array<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: Some(ParamType::Array),
            string_val: String::new(),
            array_val: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a value without a type tag.
    #[must_use]
    pub fn untyped(string_val: impl Into<String>, array_val: Vec<String>) -> Self {
        Self {
            kind: None,
            string_val: string_val.into(),
            array_val,
        }
    }

    /// Infers a type from the payload alone.
    ///
    /// A non-empty array wins, then a non-empty string. With neither the
    /// type stays unresolved and the caller has to reject the value.
    #[must_use]
    pub fn infer_type(&self) -> Option<ParamType> {
        if !self.array_val.is_empty() {
            Some(ParamType::Array)
        } else if !self.string_val.is_empty() {
            Some(ParamType::String)
        } else {
            None
        }
    }

    /// Returns the explicit type, falling back to inference.
    #[must_use]
    pub fn resolved_type(&self) -> Option<ParamType> {
        self.kind.or_else(|| self.infer_type())
    }

    /// Returns the strings that may carry embedded expressions.
    ///
    /// Only the payload selected by the resolved type is returned; an
    /// unresolved value contributes nothing.
    #[must_use]
    pub fn scannable_strings(&self) -> Vec<&str> {
        match self.resolved_type() {
            Some(ParamType::String) => vec![self.string_val.as_str()],
            Some(ParamType::Array) => self.array_val.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.resolved_type() {
            Some(ParamType::Array) => self.array_val.serialize(serializer),
            _ => serializer.serialize_str(&self.string_val),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawParamValue {
    String(String),
    Array(Vec<String>),
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawParamValue::deserialize(deserializer)? {
            RawParamValue::String(s) => Self::string(s),
            RawParamValue::Array(values) => Self::array(values),
        })
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::array(values)
    }
}

/// A concrete parameter binding: name plus value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Parameter value.
    pub value: ParamValue,
}

impl Param {
    /// Creates a new parameter binding.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A declared parameter: name, type, description and optional default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: String,
    /// Declared type, if any.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ParamType>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
}

impl ParamSpec {
    /// Creates a declaration with the given name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind),
            description: String::new(),
            default: None,
        }
    }

    /// Creates a declaration from a concrete binding.
    ///
    /// The bound value becomes the default and the type is inferred from it
    /// when the value carries none.
    #[must_use]
    pub fn from_param(param: &Param) -> Self {
        Self {
            name: param.name.clone(),
            kind: param.value.resolved_type(),
            description: String::new(),
            default: Some(param.value.clone()),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<ParamValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Returns the declared type, falling back to the default's type.
    #[must_use]
    pub fn resolved_type(&self) -> Option<ParamType> {
        self.kind
            .or_else(|| self.default.as_ref().and_then(ParamValue::resolved_type))
    }

    /// Returns true when the default, if any, has the declared shape.
    #[must_use]
    pub fn default_matches_type(&self) -> bool {
        match (self.kind, &self.default) {
            (Some(kind), Some(default)) => match default.resolved_type() {
                Some(actual) => actual == kind,
                // An empty payload fits either shape.
                None => true,
            },
            _ => true,
        }
    }
}
