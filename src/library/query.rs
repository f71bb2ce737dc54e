//! Item queries
//!
//! A query is a list of terms that must all match:
//! - `field:value` matches items whose field contains `value`
//!   (case-insensitive)
//! - `field:` matches items where the field is unset
//! - a bare word matches the path, title, artist or album

use crate::error::{Result, XtractorError};
use crate::types::Item;

/// Fields searched by bare words besides the path
const DEFAULT_SEARCH_FIELDS: [&str; 3] = ["title", "artist", "album"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Term {
    Field { field: String, needle: String },
    Unset(String),
    Any(String),
}

/// Parsed item query; the empty query matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    terms: Vec<Term>,
}

impl Query {
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut terms = Vec::new();
        for arg in args {
            let arg = arg.as_ref().trim();
            if arg.is_empty() {
                continue;
            }
            let term = match arg.split_once(':') {
                Some(("", _)) => {
                    return Err(XtractorError::Query(format!(
                        "'{}' has an empty field name",
                        arg
                    )))
                }
                Some((field, "")) => Term::Unset(field.to_string()),
                Some((field, value)) => Term::Field {
                    field: field.to_string(),
                    needle: value.to_lowercase(),
                },
                None => Term::Any(arg.to_lowercase()),
            };
            terms.push(term);
        }
        Ok(Self { terms })
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.terms.iter().all(|term| term.matches(item))
    }
}

impl Term {
    fn matches(&self, item: &Item) -> bool {
        match self {
            Term::Field { field, needle } => field_value(item, field)
                .map(|v| v.to_lowercase().contains(needle.as_str()))
                .unwrap_or(false),
            Term::Unset(field) => field_value(item, field).is_none(),
            Term::Any(needle) => {
                item.path.to_string_lossy().to_lowercase().contains(needle.as_str())
                    || DEFAULT_SEARCH_FIELDS.iter().any(|field| {
                        item.get_str(field)
                            .map(|v| v.to_lowercase().contains(needle.as_str()))
                            .unwrap_or(false)
                    })
            }
        }
    }
}

fn field_value(item: &Item, field: &str) -> Option<String> {
    match field {
        "path" => Some(item.path.to_string_lossy().into_owned()),
        "id" => Some(item.id.to_string()),
        _ => item.get_str(field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item() -> Item {
        let mut item = Item::new(7, "/music/Daft Punk/Around the World.flac");
        item.set("artist", json!("Daft Punk"));
        item.set("title", json!("Around the World"));
        item.set("bpm", json!(121));
        item
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let query = Query::parse::<&str>(&[]).unwrap();
        assert!(query.is_empty());
        assert!(query.matches(&item()));
        assert!(Query::parse(&[""]).unwrap().is_empty());
    }

    #[test]
    fn test_field_terms() {
        assert!(Query::parse(&["artist:daft"]).unwrap().matches(&item()));
        assert!(Query::parse(&["bpm:121"]).unwrap().matches(&item()));
        assert!(!Query::parse(&["artist:justice"]).unwrap().matches(&item()));
        assert!(!Query::parse(&["genre:house"]).unwrap().matches(&item()));
        assert!(Query::parse(&["id:7"]).unwrap().matches(&item()));
    }

    #[test]
    fn test_unset_term() {
        assert!(Query::parse(&["genre:"]).unwrap().matches(&item()));
        assert!(!Query::parse(&["bpm:"]).unwrap().matches(&item()));
    }

    #[test]
    fn test_terms_are_anded() {
        assert!(Query::parse(&["world", "artist:punk"]).unwrap().matches(&item()));
        assert!(!Query::parse(&["world", "artist:justice"]).unwrap().matches(&item()));
    }

    #[test]
    fn test_empty_field_name_is_an_error() {
        assert!(matches!(
            Query::parse(&[":house"]),
            Err(XtractorError::Query(_))
        ));
    }
}
