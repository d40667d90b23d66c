//! Placeholder substitution for embedded templates

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap());

/// Substitutes `{{key}}` placeholders with variable values.
///
/// Unknown keys are left in place.
pub fn substitute(content: &str, vars: &HashMap<&str, String>) -> String {
    TEMPLATE_RE
        .replace_all(content, |caps: &regex::Captures| {
            let key = caps[1].trim();
            vars.get(key)
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string()
}
