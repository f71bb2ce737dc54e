//! Single-field lookup and coercion inside an analysis document

use crate::error::FieldError;
use crate::types::{TargetFieldSpec, ValueType};
use serde_json::{Number, Value};

/// Extract and coerce one value from `doc` as described by `spec`
///
/// Every dot-separated segment of `spec.path` is looked up as an object
/// key; array nodes also accept a numeric index. The leaf is then coerced
/// to `spec.value_type`.
pub fn extract_value(doc: &Value, spec: &TargetFieldSpec) -> Result<Value, FieldError> {
    let leaf = resolve(doc, &spec.path)?;
    coerce(leaf, spec.value_type, &spec.path)
}

/// Walk `path` down from `doc`
pub fn resolve<'a>(doc: &'a Value, path: &str) -> Result<&'a Value, FieldError> {
    let mut node = doc;
    for segment in path.split('.') {
        let next = match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        node = next.ok_or_else(|| FieldError::PathNotFound {
            path: path.to_string(),
            segment: segment.to_string(),
        })?;
    }
    Ok(node)
}

fn coerce(leaf: &Value, value_type: ValueType, path: &str) -> Result<Value, FieldError> {
    match value_type {
        ValueType::String => Ok(Value::String(stringify(leaf))),
        ValueType::Float => {
            let value = as_float(leaf).ok_or_else(|| mismatch(path, "float", leaf))?;
            Number::from_f64(value)
                .map(Value::Number)
                .ok_or_else(|| mismatch(path, "float", leaf))
        }
        ValueType::Integer => {
            let value = as_float(leaf)
                .map(f64::round)
                .filter(|v| v.is_finite() && *v >= i64::MIN as f64 && *v <= i64::MAX as f64)
                .ok_or_else(|| mismatch(path, "integer", leaf))?;
            Ok(Value::from(value as i64))
        }
        ValueType::Passthrough => match leaf {
            Value::Array(_) | Value::Object(_) => Err(mismatch(path, "scalar", leaf)),
            scalar => Ok(scalar.clone()),
        },
    }
}

fn stringify(leaf: &Value) -> String {
    match leaf {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_float(leaf: &Value) -> Option<f64> {
    match leaf {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn mismatch(path: &str, expected: &'static str, leaf: &Value) -> FieldError {
    let mut found = leaf.to_string();
    if found.chars().count() > 40 {
        found = found.chars().take(37).collect::<String>() + "...";
    }
    FieldError::TypeCoercion {
        path: path.to_string(),
        expected,
        found,
    }
}
