//! Core data types for xtractor
//!
//! These types represent the domain model and flow through the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Field holding the MusicBrainz recording id of an item
pub const TRACK_ID_FIELD: &str = "mb_trackid";

// =============================================================================
// Target field tables
// =============================================================================

/// Target type of an extracted value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Float,
    Integer,
    Passthrough,
}

/// Declarative description of one field to pull out of an analysis document
#[derive(Debug, Clone, PartialEq)]
pub struct TargetFieldSpec {
    /// Item field the value is written to
    pub key: String,
    /// Dot-separated path inside the document (e.g. "rhythm.bpm")
    pub path: String,
    pub value_type: ValueType,
    /// Items missing this field are selected for analysis
    pub required: bool,
}

impl TargetFieldSpec {
    pub fn new(
        key: impl Into<String>,
        path: impl Into<String>,
        value_type: ValueType,
        required: bool,
    ) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
            value_type,
            required,
        }
    }
}

/// Ordered table of target fields with unique keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetTable {
    fields: Vec<TargetFieldSpec>,
}

impl TargetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a spec, replacing (in place) any spec with the same key
    pub fn insert(&mut self, spec: TargetFieldSpec) {
        match self.fields.iter_mut().find(|f| f.key == spec.key) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
    }

    /// Merge two tables key-wise; `high` wins on collision
    pub fn merged(low: &TargetTable, high: &TargetTable) -> TargetTable {
        let mut table = low.clone();
        for spec in high.iter() {
            table.insert(spec.clone());
        }
        table
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetFieldSpec> {
        self.fields.iter()
    }

    pub fn get(&self, key: &str) -> Option<&TargetFieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Keys of all required fields, in table order
    pub fn required_keys(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.key.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<TargetFieldSpec> for TargetTable {
    fn from_iter<I: IntoIterator<Item = TargetFieldSpec>>(iter: I) -> Self {
        let mut table = TargetTable::new();
        for spec in iter {
            table.insert(spec);
        }
        table
    }
}

// =============================================================================
// Extraction results
// =============================================================================

/// Field values extracted from one analysis document
///
/// Holds exactly one entry per target field; fields that could not be
/// extracted are present as `Value::Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    entries: Vec<(String, Value)>,
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// `None` means the key was never attempted, `Some(Null)` means absent
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Overlay `other` on top of this result
    pub fn merge(mut self, other: ExtractionResult) -> ExtractionResult {
        for (key, value) in other.entries {
            self.set(key, value);
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries carrying an actual value
    pub fn present(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.iter().filter(|(_, v)| !v.is_null())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Library items
// =============================================================================

/// One media entry of the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    /// Source audio file
    pub path: PathBuf,
    /// Flexible attributes; a missing or null entry means "unset"
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Item {
    pub fn new(id: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    pub fn is_set(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Field value rendered as text, if set
    pub fn get_str(&self, field: &str) -> Option<String> {
        self.get(field).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// MusicBrainz recording id, if the item carries a non-empty one
    pub fn track_id(&self) -> Option<&str> {
        self.get(TRACK_ID_FIELD)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// =============================================================================
// Supported formats
// =============================================================================

/// Audio formats picked up by the library import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Flac,
    Ogg,
    Mp4,
    Wav,
    Aiff,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "flac" => Some(AudioFormat::Flac),
            "ogg" | "oga" => Some(AudioFormat::Ogg),
            "m4a" | "mp4" => Some(AudioFormat::Mp4),
            "wav" => Some(AudioFormat::Wav),
            "aiff" | "aif" => Some(AudioFormat::Aiff),
            _ => None,
        }
    }
}
