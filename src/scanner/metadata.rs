use lofty::file::TaggedFileExt;
use lofty::prelude::*;
use lofty::tag::{ItemValue, Tag};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use super::ScanError;

/// Tag data as read from a file, before normalization.
///
/// `raw` maps lower-cased format-native keys (e.g. `date`, `musicbrainz_albumid`)
/// to their text values. The typed fields come from lofty's accessors, which
/// already understand each tag format's conventions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTagSet {
    pub raw: BTreeMap<String, String>,
    pub artist: String,
    pub album: String,
    pub title: String,
    pub genre: String,
    pub disc: Option<u32>,
    pub track: Option<u32>,
}

impl RawTagSet {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Read the tags of an audio file.
///
/// Failing to open or parse the file is an error; a parsable file that
/// carries no tag at all yields an empty set.
pub fn read_tags(path: &Path) -> Result<RawTagSet, ScanError> {
    let mut file = File::open(path)?;
    let tagged_file = lofty::read_from(&mut file).map_err(|e| ScanError::Metadata {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    // Try primary tag, then fall back
    let tag = match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        Some(t) => t,
        None => {
            log::debug!("No tags in {}", path.display());
            return Ok(RawTagSet::default());
        }
    };

    Ok(from_tag(tag))
}

/// Flatten one lofty tag. Keys are the format-native names, lower-cased;
/// binary items such as cover art are dropped.
fn from_tag(tag: &Tag) -> RawTagSet {
    let tag_type = tag.tag_type();
    let mut raw = BTreeMap::new();
    for item in tag.items() {
        let Some(key) = item.key().map_key(tag_type, true) else {
            continue;
        };
        let value = match item.value() {
            ItemValue::Text(s) | ItemValue::Locator(s) => s.clone(),
            ItemValue::Binary(_) => continue,
        };
        raw.entry(key.to_lowercase())
            .and_modify(|existing: &mut String| {
                // Multi-valued keys (several ARTIST= lines) are joined
                existing.push_str("; ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    RawTagSet {
        raw,
        artist: tag.artist().map(|s| s.to_string()).unwrap_or_default(),
        album: tag.album().map(|s| s.to_string()).unwrap_or_default(),
        title: tag.title().map(|s| s.to_string()).unwrap_or_default(),
        genre: tag.genre().map(|s| s.to_string()).unwrap_or_default(),
        disc: tag.disk(),
        track: tag.track(),
    }
}
