//! Payload shape validation.
//!
//! Pure structural checks on the submitted `data` object: no I/O, no
//! semantic inspection of field names or string content. Any 4-key,
//! all-string object passes.

use serde_json::Value;
use std::fmt;

/// Number of fields a submitted record must carry.
pub const REQUIRED_FIELDS: usize = 4;

/// Why a payload was rejected.
///
/// Checks apply in order and short-circuit on the first failure, so a
/// payload that is not an object is never reported for its field count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotAnObject,
    WrongFieldCount { count: usize },
    FieldNotString { field: String },
}

impl Rejection {
    /// Machine-stable reason tag, used for telemetry labels.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::NotAnObject => "not_an_object",
            Rejection::WrongFieldCount { .. } => "wrong_field_count",
            Rejection::FieldNotString { .. } => "field_not_string",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotAnObject => write!(f, "Payload must be a JSON object"),
            Rejection::WrongFieldCount { .. } => {
                write!(f, "Payload must contain exactly {REQUIRED_FIELDS} fields")
            }
            Rejection::FieldNotString { field } => {
                write!(f, "Field '{field}' must be a string")
            }
        }
    }
}

/// Validate the shape of a submitted `data` object.
pub fn validate(data: &Value) -> Result<(), Rejection> {
    let Some(map) = data.as_object() else {
        return Err(Rejection::NotAnObject);
    };

    if map.len() != REQUIRED_FIELDS {
        return Err(Rejection::WrongFieldCount { count: map.len() });
    }

    for (key, value) in map {
        if !value.is_string() {
            return Err(Rejection::FieldNotString { field: key.clone() });
        }
    }

    Ok(())
}

/// Whether a `data` field should be treated as missing.
///
/// Empty strings, empty containers, zero, false, and null all count as
/// missing, not as candidates for shape validation.
pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_four_string_fields_accepted() {
        let data = json!({"a": "1", "b": "2", "c": "3", "d": "4"});
        assert_eq!(validate(&data), Ok(()));
    }

    #[test]
    fn test_arbitrary_keys_accepted() {
        let data = json!({"句读": "x", "": "y", "a b": "z", "0": ""});
        assert_eq!(validate(&data), Ok(()));
    }

    #[test]
    fn test_non_object_rejected() {
        for data in [json!([1, 2, 3]), json!("text"), json!(42), json!(null)] {
            let rejection = validate(&data).unwrap_err();
            assert_eq!(rejection, Rejection::NotAnObject);
            assert_eq!(rejection.reason(), "not_an_object");
        }
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        let three = json!({"a": "1", "b": "2", "c": "3"});
        let five = json!({"a": "1", "b": "2", "c": "3", "d": "4", "e": "5"});

        for data in [three, five] {
            let rejection = validate(&data).unwrap_err();
            assert_eq!(rejection.reason(), "wrong_field_count");
        }
    }

    #[test]
    fn test_non_string_value_identifies_field() {
        let data = json!({"a": "1", "b": 2, "c": "3", "d": "4"});
        let rejection = validate(&data).unwrap_err();
        assert_eq!(
            rejection,
            Rejection::FieldNotString {
                field: "b".to_string()
            }
        );
        assert_eq!(rejection.to_string(), "Field 'b' must be a string");
    }

    #[test]
    fn test_non_string_reported_even_with_other_violations_pending() {
        // Count is checked first; with count satisfied, any non-string value
        // is reported no matter what the other fields hold.
        let data = json!({"a": null, "b": "2", "c": [1], "d": "4"});
        let rejection = validate(&data).unwrap_err();
        assert_eq!(rejection.reason(), "field_not_string");
    }

    #[test]
    fn test_shape_check_order() {
        // A 3-field object with a non-string value fails on count first.
        let data = json!({"a": 1, "b": "2", "c": "3"});
        assert_eq!(
            validate(&data).unwrap_err(),
            Rejection::WrongFieldCount { count: 3 }
        );
    }

    #[test]
    fn test_missing_data_detection() {
        assert!(is_missing(None));
        assert!(is_missing(Some(&json!(null))));
        assert!(is_missing(Some(&json!(false))));
        assert!(is_missing(Some(&json!(0))));
        assert!(is_missing(Some(&json!(""))));
        assert!(is_missing(Some(&json!([]))));
        assert!(is_missing(Some(&json!({}))));

        assert!(!is_missing(Some(&json!({"a": "1"}))));
        assert!(!is_missing(Some(&json!("x"))));
        assert!(!is_missing(Some(&json!(true))));
    }
}
