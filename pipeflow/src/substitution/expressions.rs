//! Scanning of `$(...)` reference expressions embedded in strings.

use std::sync::LazyLock;

use regex::Regex;

// A dotted path, optionally followed by an `[N]` or `[*]` selector.
static EXPRESSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\(([_a-zA-Z0-9.\-]+(?:\[(?:[0-9]+|\*)\])?)\)")
        .unwrap_or_else(|e| panic!("invalid expression pattern: {e}"))
});

/// Returns the body of every `$(...)` expression in `text`, in order.
///
/// An empty result is not an error: it means the value does not derive from
/// anything else.
#[must_use]
pub fn scan(text: &str) -> Vec<String> {
    EXPRESSION_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Scans several strings and concatenates the results.
#[must_use]
pub fn scan_all<'a, I>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    texts.into_iter().flat_map(scan).collect()
}

/// Returns true if `text` contains at least one expression.
#[must_use]
pub fn contains_expression(text: &str) -> bool {
    EXPRESSION_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_single_expression() {
        assert_eq!(
            scan("$(tasks.build.results.image)"),
            vec!["tasks.build.results.image".to_string()]
        );
    }

    #[test]
    fn test_scan_multiple_expressions() {
        let found = scan("$(params.registry)/app@$(tasks.build.results.digest)");
        assert_eq!(found, vec!["params.registry", "tasks.build.results.digest"]);
    }

    #[test]
    fn test_scan_no_reference() {
        assert!(scan("no-reference-here").is_empty());
        assert!(scan("$notanexpression").is_empty());
        assert!(scan("$()").is_empty());
        assert!(!contains_expression("plain"));
    }

    #[test]
    fn test_scan_keeps_selector() {
        assert_eq!(scan("$(params.flags[*])"), vec!["params.flags[*]"]);
        assert_eq!(
            scan("$(tasks.a.results.list[2])"),
            vec!["tasks.a.results.list[2]"]
        );
    }

    #[test]
    fn test_scan_all_over_array() {
        let values = ["--tag=$(tasks.a.results.tag)", "static", "$(tasks.b.results.x)"];
        assert_eq!(
            scan_all(values),
            vec!["tasks.a.results.tag", "tasks.b.results.x"]
        );
    }
}
