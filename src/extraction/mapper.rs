//! Whole-table extraction

use super::path::extract_value;
use crate::error::{Result, XtractorError};
use crate::types::{ExtractionResult, TargetTable};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Extract every field of `table` from `doc`
///
/// Fields that cannot be resolved or coerced become explicit nulls, so the
/// result always carries exactly the keys of `table`.
pub fn extract(doc: &Value, table: &TargetTable) -> ExtractionResult {
    let mut result = ExtractionResult::new();
    for spec in table.iter() {
        let value = match extract_value(doc, spec) {
            Ok(value) => value,
            Err(e) => {
                debug!("{}: {}", spec.key, e);
                Value::Null
            }
        };
        result.set(spec.key.clone(), value);
    }
    result
}

/// Load an analysis document from disk
pub fn load_document(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(XtractorError::not_found("Output file", path));
    }

    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| XtractorError::InvalidDocument {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TargetFieldSpec, ValueType};
    use serde_json::json;

    fn table() -> TargetTable {
        vec![
            TargetFieldSpec::new("bpm", "rhythm.bpm", ValueType::Integer, true),
            TargetFieldSpec::new("missing", "a.b.x", ValueType::Float, true),
            TargetFieldSpec::new("gender", "highlevel.gender.value", ValueType::String, false),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_missing_field_does_not_affect_others() {
        let doc = json!({
            "rhythm": {"bpm": 127.6},
            "a": {"b": {"c": 3.7}},
            "highlevel": {"gender": {"value": "male"}}
        });

        let result = extract(&doc, &table());

        assert_eq!(result.len(), 3);
        assert_eq!(result.get("bpm"), Some(&json!(128)));
        assert_eq!(result.get("missing"), Some(&Value::Null));
        assert_eq!(result.get("gender"), Some(&json!("male")));
    }

    #[test]
    fn test_bad_non_ascii_field_does_not_affect_others() {
        let doc = json!({
            "tags": {"title": format!("{}é and some more tail text", "a".repeat(35))},
            "rhythm": {"bpm": 120.0}
        });
        let table: TargetTable = vec![
            TargetFieldSpec::new("bpm", "rhythm.bpm", ValueType::Integer, true),
            TargetFieldSpec::new("t", "tags.title", ValueType::Float, false),
        ]
        .into_iter()
        .collect();

        let result = extract(&doc, &table);

        assert_eq!(result.get("bpm"), Some(&json!(120)));
        assert_eq!(result.get("t"), Some(&Value::Null));
    }

    #[test]
    fn test_key_set_matches_table_on_empty_document() {
        let result = extract(&json!({}), &table());
        let keys: Vec<_> = result.keys().collect();
        assert_eq!(keys, vec!["bpm", "missing", "gender"]);
        assert_eq!(result.present().count(), 0);
    }

    #[test]
    fn test_load_document_errors() {
        let dir = tempfile::TempDir::new().unwrap();

        let missing = dir.path().join("nope.json");
        assert!(matches!(
            load_document(&missing),
            Err(XtractorError::NotFound { .. })
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{\"rhythm\": ").unwrap();
        assert!(matches!(
            load_document(&broken),
            Err(XtractorError::InvalidDocument { .. })
        ));

        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"rhythm": {"bpm": 90.0}}"#).unwrap();
        assert_eq!(load_document(&good).unwrap()["rhythm"]["bpm"], json!(90.0));
    }
}
