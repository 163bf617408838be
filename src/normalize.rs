//! Turn raw tag data into a [`CanonicalRecord`].
//!
//! Normalization never fails. A sub-field that cannot be parsed keeps its
//! default and produces a [`NormalizeWarning`]; the raw value is still kept
//! in `tags`.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::db::models::{CanonicalRecord, ReleaseDate};
use crate::scanner::metadata::RawTagSet;

/// Raw tag fields promoted onto the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagField {
    Venue,
    AcousticIdFingerprint,
    MusicBrainzArtistId,
    MusicBrainzReleaseGroupId,
    MusicBrainzReleaseId,
    Set,
}

/// Raw key aliases, matched case-insensitively. Vorbis-style keys first,
/// then the ID3v2 TXXX descriptions lofty reports for the same data.
const TAG_ALIASES: &[(&str, TagField)] = &[
    ("venue", TagField::Venue),
    ("acoustid_fingerprint", TagField::AcousticIdFingerprint),
    ("musicbrainz_artistid", TagField::MusicBrainzArtistId),
    ("musicbrainz_releasegroupid", TagField::MusicBrainzReleaseGroupId),
    ("musicbrainz_albumid", TagField::MusicBrainzReleaseId),
    ("set", TagField::Set),
    ("acoustid fingerprint", TagField::AcousticIdFingerprint),
    ("musicbrainz artist id", TagField::MusicBrainzArtistId),
    ("musicbrainz release group id", TagField::MusicBrainzReleaseGroupId),
    ("musicbrainz album id", TagField::MusicBrainzReleaseId),
];

/// Raw keys holding the recording date, in priority order.
const DATE_KEYS: &[&str] = &["date", "tdrc", "year"];

static ID_CLEANUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,_ ]+").unwrap());

/// A soft parse failure. The record is still produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeWarning {
    UnparsedDate { value: String },
    UnparsedSet { value: String },
}

impl fmt::Display for NormalizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparsedDate { value } => write!(f, "unable to parse date {value:?}"),
            Self::UnparsedSet { value } => write!(f, "unable to parse set # {value:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub record: CanonicalRecord,
    pub warnings: Vec<NormalizeWarning>,
}

/// Build the canonical record for `base_filename` from its raw tags.
pub fn normalize(base_filename: &str, tags: &RawTagSet) -> Normalized {
    let track = tags.track.unwrap_or(0);
    let mut warnings = Vec::new();

    let mut record = CanonicalRecord {
        id: derive_id(&tags.artist, &tags.album, base_filename, track),
        filename: base_filename.to_string(),
        album: tags.album.clone(),
        artist: tags.artist.clone(),
        title: tags.title.clone(),
        disc: tags.disc.unwrap_or(0),
        track,
        genre: split_genre(&tags.genre),
        ..Default::default()
    };

    if let Some(value) = DATE_KEYS.iter().find_map(|k| tags.get(k)) {
        match value.parse::<ReleaseDate>() {
            Ok(date) => record.date = Some(date),
            Err(_) => warnings.push(NormalizeWarning::UnparsedDate {
                value: value.to_string(),
            }),
        }
    }

    for (key, value) in &tags.raw {
        record.tags.insert(key.clone(), value.clone());

        let Some(field) = lookup_alias(key) else {
            continue;
        };
        match field {
            TagField::Venue => record.venue = value.clone(),
            TagField::AcousticIdFingerprint => record.acoustic_id_fingerprint = value.clone(),
            TagField::MusicBrainzArtistId => record.music_brainz.artist_id = value.clone(),
            TagField::MusicBrainzReleaseGroupId => {
                record.music_brainz.release_group_id = value.clone()
            }
            TagField::MusicBrainzReleaseId => record.music_brainz.release_id = value.clone(),
            TagField::Set => match value.trim().parse() {
                Ok(n) => record.set = n,
                Err(_) => warnings.push(NormalizeWarning::UnparsedSet {
                    value: value.clone(),
                }),
            },
        }
    }

    Normalized { record, warnings }
}

fn lookup_alias(key: &str) -> Option<TagField> {
    TAG_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(key))
        .map(|(_, field)| *field)
}

/// `artist_album_filename_NNNN`, with runs of commas, underscores and spaces
/// collapsed to `-`, lower-cased.
pub fn derive_id(artist: &str, album: &str, filename: &str, track: u32) -> String {
    let id = format!("{artist}_{album}_{filename}_{track:04}");
    ID_CLEANUP_RE.replace_all(&id, "-").to_lowercase()
}

/// Split on `;`, falling back to `,` when that yields a single token.
///
/// A string using both delimiters with different meanings ("Rock, Alternative;
/// Live") is split on `;` only.
pub fn split_genre(raw: &str) -> Vec<String> {
    let mut parts: Vec<&str> = raw.split(';').collect();
    if parts.len() <= 1 {
        parts = raw.split(',').collect();
    }
    parts
        .into_iter()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(String::from)
        .collect()
}
