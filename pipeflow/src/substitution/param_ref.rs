//! Parameter references: `params.<name>` and `params.<name>[*]`.

use super::expressions::scan_all;
use crate::core::{Param, ParamType};

const PARAMS_PART: &str = "params";

/// A reference to a pipeline parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamRef {
    /// Referenced parameter name.
    pub name: String,
    /// True for the whole-array form `[*]`.
    pub whole_array: bool,
}

impl ParamRef {
    /// Parses the body of a scanned expression.
    #[must_use]
    pub fn parse(expression: &str) -> Option<Self> {
        let rest = expression.strip_prefix(PARAMS_PART)?.strip_prefix('.')?;
        let (name, whole_array) = match rest.strip_suffix("[*]") {
            Some(name) => (name, true),
            None => (rest, false),
        };
        if name.is_empty() || name.contains(['.', '[', ']']) {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            whole_array,
        })
    }
}

/// Renders the reference literal a nested scope uses to read a parameter.
///
/// String parameters become `$(params.<name>)`; array parameters become the
/// whole-array form `$(params.<name>[*])`.
#[must_use]
pub fn param_template(name: &str, kind: ParamType) -> String {
    match kind {
        ParamType::String => format!("$({PARAMS_PART}.{name})"),
        ParamType::Array => format!("$({PARAMS_PART}.{name}[*])"),
    }
}

/// Parameter references embedded in a parameter binding.
#[must_use]
pub fn param_refs_in_param(param: &Param) -> Vec<ParamRef> {
    scan_all(param.value.scannable_strings())
        .iter()
        .filter_map(|e| ParamRef::parse(e))
        .collect()
}

/// Parameter references embedded in arbitrary strings.
#[must_use]
pub fn param_refs_in<'a, I>(texts: I) -> Vec<ParamRef>
where
    I: IntoIterator<Item = &'a str>,
{
    scan_all(texts)
        .iter()
        .filter_map(|e| ParamRef::parse(e))
        .collect()
}
