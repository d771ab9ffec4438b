//! Field values as seen by the validators
//!
//! Records expose their fields as JSON values. `Null` stands for an absent
//! value; every other variant is present.

pub use serde_json::Value;

/// Returns whether a value counts as empty for required-field checks.
///
/// Empty means `Null`, or a string that is blank after trimming.
/// Zero, `false` and collections of any length are not empty.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Returns the JSON type name for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_and_blank_strings_are_empty() {
        assert!(is_empty(&Value::Null));
        assert!(is_empty(&json!("")));
        assert!(is_empty(&json!("   \t\n")));
    }

    #[test]
    fn test_falsy_values_are_not_empty() {
        assert!(!is_empty(&json!(0)));
        assert!(!is_empty(&json!(0.0)));
        assert!(!is_empty(&json!(false)));
        assert!(!is_empty(&json!([])));
        assert!(!is_empty(&json!([1, 2])));
        assert!(!is_empty(&json!({})));
        assert!(!is_empty(&json!(" x ")));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(type_name(&json!(1)), "int");
        assert_eq!(type_name(&json!(1.5)), "float");
        assert_eq!(type_name(&json!("a")), "string");
        assert_eq!(type_name(&Value::Null), "null");
    }
}
