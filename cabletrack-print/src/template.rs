//! `{{ name }}` placeholder substitution for label templates.
//!
//! Values are looked up in a JSON object. Strings are inserted verbatim,
//! numbers and booleans as their JSON text, and `null` or absent keys render
//! as nothing. Anything that does not look like a placeholder is left alone,
//! so printer command syntax passes through untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// Data handed to a template
pub type TemplateData = serde_json::Map<String, Value>;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Render `template` against `data`
///
/// # Examples
///
/// ```
/// use cabletrack_print::template::{render, TemplateData};
/// use serde_json::json;
///
/// let mut data = TemplateData::new();
/// data.insert("number".into(), json!("CAT6001"));
/// assert_eq!(render("QRCODE 20,20,M,6,A,0,\"{{ number }}\"", &data), "QRCODE 20,20,M,6,A,0,\"CAT6001\"");
/// ```
pub fn render(template: &str, data: &TemplateData) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            data.get(&caps[1]).map(value_text).unwrap_or_default()
        })
        .into_owned()
}

/// Names of every placeholder referenced by `template`, in order of appearance
pub fn placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(pairs: &[(&str, Value)]) -> TemplateData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_strings_and_numbers() {
        let d = data(&[("number", json!("CAT6001")), ("meters", json!(305))]);
        let out = render("TEXT 10,10,\"3\",0,1,1,\"{{number}} / {{ meters }} m\"", &d);
        assert_eq!(out, "TEXT 10,10,\"3\",0,1,1,\"CAT6001 / 305 m\"");
    }

    #[test]
    fn test_render_missing_and_null_are_empty() {
        let d = data(&[("notes", Value::Null)]);
        assert_eq!(render("[{{ notes }}][{{ absent }}]", &d), "[][]");
    }

    #[test]
    fn test_render_leaves_non_placeholders() {
        let d = data(&[("x", json!(true))]);
        assert_eq!(render("{{ 1bad }} { x } {{x}}", &d), "{{ 1bad }} { x } true");
    }

    #[test]
    fn test_placeholders_in_order() {
        assert_eq!(
            placeholders("{{ a }} text {{b}} {{ a }}"),
            vec!["a".to_string(), "b".to_string(), "a".to_string()]
        );
    }
}
