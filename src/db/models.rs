use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Normalized metadata for one audio file, stored as a document keyed by `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub id: String,
    pub filename: String,
    pub album: String,
    pub artist: String,
    pub title: String,
    pub date: Option<ReleaseDate>,
    pub disc: u32,
    pub track: u32,
    pub set: u32,
    pub genre: Vec<String>,
    pub venue: String,
    pub acoustic_id_fingerprint: String,
    pub music_brainz: MusicBrainz,
    /// Every raw tag seen in the file, promoted or not.
    pub tags: BTreeMap<String, String>,
}

/// MusicBrainz identifiers carried in the file's tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicBrainz {
    /// Unique id of the artist or band, e.g. Rush is
    /// "534ee493-bfac-4575-a44a-0ae41e2c3fe4".
    pub artist_id: String,

    /// What most people would call an "album". Roll the Bones has the
    /// release group id "e188de4e-6d15-3ca3-be49-fa13c67a03c0".
    pub release_group_id: String,

    /// One specific edition of an album. The first US CD of Roll the Bones
    /// (1991-09-03) is "50e551bd-5d24-37e5-913d-07c25cd85e8e", while the 12"
    /// vinyl is "52bf9926-dc7f-40b9-9a08-d5f0c98f8a63".
    pub release_id: String,
}

/// A recording date as precise as the tag allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseDate {
    Full(NaiveDate),
    Year(i32),
}

impl ReleaseDate {
    pub fn year(&self) -> i32 {
        match self {
            Self::Full(d) => d.year(),
            Self::Year(y) => *y,
        }
    }
}

impl fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Year(y) => write!(f, "{y:04}"),
        }
    }
}

impl FromStr for ReleaseDate {
    type Err = String;

    /// Full `YYYY-MM-DD` first, then a bare four-digit year.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if is_padded_date(s) {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Ok(Self::Full(d));
            }
        }
        if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(y) = s.parse() {
                return Ok(Self::Year(y));
            }
        }
        Err(format!("unrecognized date {s:?}"))
    }
}

/// Exactly `DDDD-DD-DD`. chrono alone would accept `1991-9-3` or a signed year.
fn is_padded_date(s: &str) -> bool {
    s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}

impl Serialize for ReleaseDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReleaseDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_date() {
        let d: ReleaseDate = "1991-09-03".parse().unwrap();
        assert_eq!(d, ReleaseDate::Full(NaiveDate::from_ymd_opt(1991, 9, 3).unwrap()));
        assert_eq!(d.year(), 1991);
        assert_eq!(d.to_string(), "1991-09-03");
    }

    #[test]
    fn test_parse_year_only() {
        let d: ReleaseDate = "1991".parse().unwrap();
        assert_eq!(d, ReleaseDate::Year(1991));
        assert_eq!(d.to_string(), "1991");
    }

    #[test]
    fn test_parse_rejects_other_formats() {
        assert!("not-a-date".parse::<ReleaseDate>().is_err());
        assert!("09/03/1991".parse::<ReleaseDate>().is_err());
        assert!("1991-09".parse::<ReleaseDate>().is_err());
        assert!("91".parse::<ReleaseDate>().is_err());
        assert!("".parse::<ReleaseDate>().is_err());
        assert!("1991-9-3".parse::<ReleaseDate>().is_err());
        assert!("1991-09-3".parse::<ReleaseDate>().is_err());
        assert!("+1991-09-03".parse::<ReleaseDate>().is_err());
        assert!("1991-02-30".parse::<ReleaseDate>().is_err());
    }

    #[test]
    fn test_record_json_shape() {
        let record = CanonicalRecord {
            id: "rush-roll-the-bones-song.flac-0004".into(),
            date: Some(ReleaseDate::Year(1991)),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "rush-roll-the-bones-song.flac-0004");
        assert_eq!(json["date"], "1991");
        assert_eq!(json["music_brainz"]["release_id"], "");

        let back: CanonicalRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
