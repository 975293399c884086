//! Scope-local parameter declarations.

use crate::core::{Param, ParamSpec, ParamType, ParamValue};
use crate::substitution::param_template;
use std::collections::BTreeMap;

/// The parameters visible at one nesting level of a specification.
///
/// A scope is a value. Every `with_*` method returns a new scope and leaves
/// the receiver untouched, so a nested level can never leak declarations
/// back into its parent or into a concurrently resolving run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamScope {
    specs: BTreeMap<String, ParamSpec>,
}

impl ParamScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope from declarations.
    #[must_use]
    pub fn from_specs<'a, I>(specs: I) -> Self
    where
        I: IntoIterator<Item = &'a ParamSpec>,
    {
        Self::new().with_param_specs(specs)
    }

    /// Returns a copy with each binding declared, its value as the default.
    ///
    /// The type is taken from the value, inferred from its payload when the
    /// value carries none. A value with neither payload stays untyped.
    #[must_use]
    pub fn with_params<'a, I>(&self, params: I) -> Self
    where
        I: IntoIterator<Item = &'a Param>,
    {
        let mut specs = self.specs.clone();
        for param in params {
            specs.insert(param.name.clone(), ParamSpec::from_param(param));
        }
        Self { specs }
    }

    /// Returns a copy with the declarations inserted as given.
    #[must_use]
    pub fn with_param_specs<'a, I>(&self, declared: I) -> Self
    where
        I: IntoIterator<Item = &'a ParamSpec>,
    {
        let mut specs = self.specs.clone();
        for spec in declared {
            specs.insert(spec.name.clone(), spec.clone());
        }
        Self { specs }
    }

    /// The bindings a nested scope should see, sorted by name.
    ///
    /// Overrides are emitted as given. Every other declaration is emitted as
    /// a reference back to this scope: `$(params.<name>)` for strings and
    /// `["$(params.<name>[*])"]` for arrays. Untyped declarations render as
    /// strings.
    #[must_use]
    pub fn effective_params(&self, overrides: &[Param]) -> Vec<Param> {
        let mut out: BTreeMap<&str, Param> = overrides
            .iter()
            .map(|p| (p.name.as_str(), p.clone()))
            .collect();

        for (name, spec) in &self.specs {
            if out.contains_key(name.as_str()) {
                continue;
            }
            let value = match spec.resolved_type() {
                Some(ParamType::Array) => {
                    ParamValue::array([param_template(name, ParamType::Array)])
                }
                Some(ParamType::String) | None => {
                    ParamValue::string(param_template(name, ParamType::String))
                }
            };
            out.insert(name.as_str(), Param::new(name.clone(), value));
        }

        out.into_values().collect()
    }

    /// The declarations in this scope, sorted by name.
    #[must_use]
    pub fn effective_param_specs(&self) -> Vec<ParamSpec> {
        self.specs.values().cloned().collect()
    }

    /// Returns the declaration for a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.specs.get(name)
    }

    /// Returns true if the name is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Returns the number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns true if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Declared names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn foo_bar() -> ParamScope {
        ParamScope::from_specs(&[
            ParamSpec::new("foo", ParamType::String),
            ParamSpec::new("bar", ParamType::Array),
        ])
    }

    #[test]
    fn test_override_wins_and_rest_are_templated() {
        let out = foo_bar().effective_params(&[Param::new("foo", "x")]);

        assert_eq!(
            out,
            vec![
                Param::new("bar", ParamValue::array(["$(params.bar[*])"])),
                Param::new("foo", "x"),
            ]
        );
    }

    #[test]
    fn test_without_overrides_everything_is_templated() {
        let out = foo_bar().effective_params(&[]);
        assert_eq!(out[0].value, ParamValue::array(["$(params.bar[*])"]));
        assert_eq!(out[1].value, ParamValue::string("$(params.foo)"));
    }

    #[test]
    fn test_override_unknown_to_scope_is_kept() {
        let out = ParamScope::new().effective_params(&[Param::new("extra", "v")]);
        assert_eq!(out, vec![Param::new("extra", "v")]);
    }

    #[test]
    fn test_output_is_sorted_and_stable() {
        let scope = ParamScope::from_specs(&[
            ParamSpec::new("zeta", ParamType::String),
            ParamSpec::new("alpha", ParamType::String),
            ParamSpec::new("mid", ParamType::Array),
        ]);
        let overrides = [Param::new("mid", ParamValue::array(["1"]))];

        let first = scope.effective_params(&overrides);
        let names: Vec<&str> = first.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
        assert_eq!(first, scope.effective_params(&overrides));
    }

    #[test]
    fn test_with_params_infers_type_and_sets_default() {
        let scope = ParamScope::new().with_params(&[
            Param::new("list", ParamValue::untyped("", vec!["a".to_string()])),
            Param::new("text", ParamValue::untyped("hi", Vec::new())),
            Param::new("empty", ParamValue::untyped("", Vec::new())),
        ]);

        let list = scope.get("list").unwrap();
        assert_eq!(list.kind, Some(ParamType::Array));
        assert_eq!(list.default, Some(ParamValue::untyped("", vec!["a".to_string()])));
        assert_eq!(scope.get("text").unwrap().kind, Some(ParamType::String));
        assert_eq!(scope.get("empty").unwrap().kind, None);
    }

    #[test]
    fn test_scopes_are_copied_not_shared() {
        let parent = foo_bar();
        let child = parent.with_params(&[Param::new("foo", ParamValue::array(["a"]))]);

        assert_eq!(parent.get("foo").unwrap().kind, Some(ParamType::String));
        assert_eq!(child.get("foo").unwrap().kind, Some(ParamType::Array));

        let grandchild = child.with_param_specs(&[ParamSpec::new("baz", ParamType::String)]);
        assert!(!child.contains("baz"));
        assert_eq!(grandchild.len(), 3);
    }

    #[test]
    fn test_effective_param_specs_are_unchanged() {
        let spec = ParamSpec::new("foo", ParamType::String)
            .with_description("the foo")
            .with_default("d");
        let scope = ParamScope::new().with_param_specs(std::iter::once(&spec));

        assert_eq!(scope.effective_param_specs(), vec![spec]);
    }

    #[test]
    fn test_untyped_entry_renders_as_string_template() {
        let scope = ParamScope::new().with_params(&[Param::new("p", ParamValue::untyped("", Vec::new()))]);
        let out = scope.effective_params(&[]);
        assert_eq!(out[0].value, ParamValue::string("$(params.p)"));
    }
}
