//! Reading and writing audio file tags
//!
//! Uses lofty for ID3v2 (MP3), Vorbis comments (FLAC/Ogg), MP4 atoms and
//! AIFF/WAV chunks.

use crate::error::{Result, XtractorError};
use crate::types::TRACK_ID_FIELD;
use lofty::{Accessor, ItemKey, ItemValue, Probe, Tag, TagExt, TagItem, TaggedFileExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Read the library fields xtractor cares about from a file's tags
///
/// On error (corrupt tags, unreadable file), returns no fields.
pub fn read_fields(path: &Path) -> BTreeMap<String, Value> {
    match read_fields_inner(path) {
        Ok(fields) => fields,
        Err(e) => {
            warn!("Failed to read tags from {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

fn read_fields_inner(
    path: &Path,
) -> std::result::Result<BTreeMap<String, Value>, lofty::error::LoftyError> {
    let tagged_file = Probe::open(path)?.read()?;
    let mut fields = BTreeMap::new();

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        debug!("No tags found in {}", path.display());
        return Ok(fields);
    };

    let text_fields = [
        ("title", tag.title()),
        ("artist", tag.artist()),
        ("album", tag.album()),
        ("genre", tag.genre()),
        (TRACK_ID_FIELD, tag.get_string(&ItemKey::MusicBrainzRecordingId).map(Into::into)),
    ];
    for (field, value) in text_fields {
        if let Some(value) = value {
            fields.insert(field.to_string(), Value::String(value.into_owned()));
        }
    }
    if let Some(year) = tag.year() {
        fields.insert("year".to_string(), Value::from(year));
    }

    Ok(fields)
}

/// Write `fields` into the file's primary tag, creating it if needed
pub fn write_fields<'a, I>(path: &Path, fields: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let tag_error = |reason: String| XtractorError::TagWrite {
        path: path.to_path_buf(),
        reason,
    };

    let mut tagged_file = Probe::open(path)
        .and_then(|probe| probe.read())
        .map_err(|e| tag_error(e.to_string()))?;

    if tagged_file.primary_tag().is_none() {
        let tag_type = tagged_file.primary_tag_type();
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file
        .primary_tag_mut()
        .ok_or_else(|| tag_error("file format has no writable tag".to_string()))?;

    let mut written = 0;
    for (field, value) in fields {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let inserted = match item_key(field) {
            // custom fields have no mapping in any tag format
            ItemKey::Unknown(key) => {
                tag.insert_unchecked(TagItem::new(ItemKey::Unknown(key), ItemValue::Text(text)));
                true
            }
            // ID3v2 only has an integer BPM frame
            ItemKey::Bpm => {
                tag.insert_text(ItemKey::Bpm, text)
                    || value.as_f64().map_or(false, |bpm| {
                        tag.insert_text(ItemKey::IntegerBpm, (bpm.round() as i64).to_string())
                    })
            }
            key => tag.insert_text(key, text),
        };
        if inserted {
            written += 1;
        } else {
            debug!("{} cannot hold field '{}'", path.display(), field);
        }
    }

    tag.save_to_path(path).map_err(|e| tag_error(e.to_string()))?;
    debug!("Wrote {} tag fields to {}", written, path.display());
    Ok(())
}

/// Tag item for a library field
fn item_key(field: &str) -> ItemKey {
    match field {
        "title" => ItemKey::TrackTitle,
        "artist" => ItemKey::TrackArtist,
        "album" => ItemKey::AlbumTitle,
        "bpm" => ItemKey::Bpm,
        "initial_key" => ItemKey::InitialKey,
        "genre" => ItemKey::Genre,
        TRACK_ID_FIELD => ItemKey::MusicBrainzRecordingId,
        other => ItemKey::Unknown(other.to_uppercase()),
    }
}
