use crate::parser::is_word;
use crate::types::{ValidationReport, VarType};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Range;

/// Runtime variable store handed in by the caller.
pub type Variables = serde_json::Map<String, Value>;

/// Every `{name}` placeholder in `text`, with its byte range.
pub(crate) fn placeholders(text: &str) -> Vec<(Range<usize>, &str)> {
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(open) = text[from..].find('{').map(|i| from + i) {
        let after = open + 1;
        let name_len = text[after..]
            .find(|c: char| !is_word(c))
            .unwrap_or(text.len() - after);
        let close = after + name_len;
        if name_len > 0 && text[close..].starts_with('}') {
            out.push((open..close + 1, &text[after..close]));
            from = close + 1;
        } else {
            from = after;
        }
    }
    out
}

/// Text form of a variable value as the runtime displays it.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replace `{name}` with the value of `name`; unknown names stay as written.
pub fn interpolate_variables(text: &str, vars: &Variables) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (range, name) in placeholders(text) {
        let Some(value) = vars.get(name) else {
            continue;
        };
        out.push_str(&text[last..range.start]);
        out.push_str(&stringify(value));
        last = range.end;
    }
    out.push_str(&text[last..]);
    out
}

/// Compare each variable named in `schema` against its runtime type.
pub fn validate_variable_types(
    vars: &Variables,
    schema: &BTreeMap<String, VarType>,
) -> ValidationReport {
    let mut errors = Vec::new();
    for (name, expected) in schema {
        match vars.get(name) {
            None => errors.push(format!("variable \"{name}\" is missing (expected {expected})")),
            Some(value) => {
                let actual = VarType::of(value);
                if actual != *expected {
                    errors.push(format!(
                        "variable \"{name}\" should be {expected} but is {actual}"
                    ));
                }
            }
        }
    }
    ValidationReport::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: Value) -> Variables {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn finds_placeholders() {
        let found: Vec<_> = placeholders("{a} and {{b}} but not {c d} or {}")
            .into_iter()
            .map(|(_, name)| name)
            .collect();
        assert_eq!(found, vec!["a", "b"]);
    }

    #[test]
    fn interpolation_leaves_unknown_names() {
        assert_eq!(interpolate_variables("Hi {name}", &Variables::new()), "Hi {name}");
        assert_eq!(
            interpolate_variables("Hi {name}", &vars(json!({"name": "Ann"}))),
            "Hi Ann"
        );
    }

    #[test]
    fn interpolation_stringifies_values() {
        let v = vars(json!({"n": 3, "ok": true, "none": null, "list": [1, 2]}));
        assert_eq!(
            interpolate_variables("{n}/{ok}/{none}/{list}/{missing}", &v),
            "3/true/null/[1,2]/{missing}"
        );
    }

    #[test]
    fn type_mismatches_are_reported_not_raised() {
        let v = vars(json!({"score": "ten", "name": "Ann", "flags": {}}));
        let schema = BTreeMap::from([
            ("flags".to_string(), VarType::Object),
            ("lives".to_string(), VarType::Number),
            ("name".to_string(), VarType::String),
            ("score".to_string(), VarType::Number),
        ]);
        let report = validate_variable_types(&v, &schema);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![
                "variable \"lives\" is missing (expected number)".to_string(),
                "variable \"score\" should be number but is string".to_string(),
            ]
        );
    }

    #[test]
    fn matching_types_are_valid() {
        let v = vars(json!({"score": 1.5, "done": false}));
        let schema = BTreeMap::from([
            ("done".to_string(), VarType::Boolean),
            ("score".to_string(), VarType::Number),
        ]);
        assert!(validate_variable_types(&v, &schema).valid);
    }
}
