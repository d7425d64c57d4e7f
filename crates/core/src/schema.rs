//! Argument validation against the JSON-schema subset tools declare.
//!
//! Supported keywords: `type` (object at the top level), `properties`,
//! `required`, per-property `type`, `enum`, `minimum` and `maximum`.
//! Anything else in a schema is accepted without checking.

use serde_json::Value;

/// Check `args` against `schema`, returning a description of the first
/// violation found.
pub fn validate(schema: &Value, args: &Value) -> Result<(), String> {
    if let Some(expected) = schema.get("type").and_then(Value::as_str)
        && !type_matches(expected, args)
    {
        return Err(format!("expected arguments of type {expected}, got {}", type_name(args)));
    }

    let Some(obj) = args.as_object() else {
        return Ok(());
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            match obj.get(key) {
                None | Some(Value::Null) => {
                    return Err(format!("missing required argument '{key}'"));
                }
                Some(_) => {}
            }
        }
    }

    let Some(props) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (key, value) in obj {
        // Optional arguments sent as null are treated as absent.
        if value.is_null() {
            continue;
        }
        let Some(prop) = props.get(key) else {
            continue;
        };
        validate_property(key, prop, value)?;
    }

    Ok(())
}

fn validate_property(key: &str, prop: &Value, value: &Value) -> Result<(), String> {
    if let Some(expected) = prop.get("type").and_then(Value::as_str)
        && !type_matches(expected, value)
    {
        return Err(format!(
            "argument '{key}' must be of type {expected}, got {}",
            type_name(value)
        ));
    }

    if let Some(allowed) = prop.get("enum").and_then(Value::as_array)
        && !allowed.contains(value)
    {
        return Err(format!("argument '{key}' must be one of {}", Value::Array(allowed.clone())));
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = prop.get("minimum").and_then(Value::as_f64)
            && n < min
        {
            return Err(format!("argument '{key}' must be >= {min}, got {n}"));
        }
        if let Some(max) = prop.get("maximum").and_then(Value::as_f64)
            && n > max
        {
            return Err(format!("argument '{key}' must be <= {max}, got {n}"));
        }
    }

    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shell_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": { "type": "string" },
                "timeout": { "type": "integer", "minimum": 1, "maximum": 600 },
                "mode": { "type": "string", "enum": ["fast", "slow"] }
            },
            "required": ["command"]
        })
    }

    #[test]
    fn accepts_valid_arguments() {
        assert!(validate(&shell_schema(), &json!({"command": "ls", "timeout": 5})).is_ok());
    }

    #[test]
    fn rejects_missing_required() {
        let err = validate(&shell_schema(), &json!({"timeout": 5})).unwrap_err();
        assert!(err.contains("command"));
    }

    #[test]
    fn rejects_string_for_integer() {
        let err = validate(&shell_schema(), &json!({"command": "ls", "timeout": "5"})).unwrap_err();
        assert!(err.contains("timeout"));
        assert!(err.contains("integer"));
    }

    #[test]
    fn rejects_float_for_integer() {
        assert!(validate(&shell_schema(), &json!({"command": "ls", "timeout": 2.5})).is_err());
    }

    #[test]
    fn enforces_range() {
        assert!(validate(&shell_schema(), &json!({"command": "ls", "timeout": 0})).is_err());
        assert!(validate(&shell_schema(), &json!({"command": "ls", "timeout": 601})).is_err());
    }

    #[test]
    fn enforces_enum() {
        assert!(validate(&shell_schema(), &json!({"command": "ls", "mode": "fast"})).is_ok());
        assert!(validate(&shell_schema(), &json!({"command": "ls", "mode": "warp"})).is_err());
    }

    #[test]
    fn rejects_non_object_arguments() {
        assert!(validate(&shell_schema(), &json!(["ls"])).is_err());
    }

    #[test]
    fn null_optional_is_ignored() {
        assert!(validate(&shell_schema(), &json!({"command": "ls", "timeout": null})).is_ok());
    }
}
