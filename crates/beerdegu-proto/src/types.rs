//! Domain types carried inside envelope payloads.
//!
//! The server renders missing rating fields as either `null` or `""`, and
//! notes as integers or numeric strings depending on the endpoint. The
//! deserializers here normalize all of those into one shape.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};

use crate::errors::ProtocolError;

/// Server-assigned user identifier.
pub type UserId = u64;

/// Server-assigned beer identifier.
pub type BeerId = u64;

/// Lifecycle stage of a room.
///
/// Ordered by progression: `Waiting < Starting < InProgress < Finished`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomState {
    /// Host is assembling participants and beers.
    #[default]
    Waiting,
    /// Host has announced the start.
    Starting,
    /// Participants are rating beers.
    InProgress,
    /// Results are available.
    Finished,
}

impl RoomState {
    /// Wire name of the stage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Starting => "STARTING",
            Self::InProgress => "IN_PROGRESS",
            Self::Finished => "FINISHED",
        }
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RoomState {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WAITING" => Ok(Self::Waiting),
            "STARTING" => Ok(Self::Starting),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "FINISHED" => Ok(Self::Finished),
            _ => Err(ProtocolError::UnknownRoomState(s.to_string())),
        }
    }
}

/// A room participant as reported by the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// User ID.
    pub id: UserId,
    /// Name shown in the participant list.
    #[serde(rename = "username")]
    pub display_name: String,
}

/// A chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Username of the author, as rendered by the server.
    #[serde(rename = "user")]
    pub author: String,
    /// Message body.
    #[serde(rename = "message")]
    pub text: String,
}

/// A beer in the room catalog.
///
/// Only the fields the session relies on are typed. Everything else the
/// server sends (brewery, style, hops, ABV...) is kept verbatim in
/// `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeerItem {
    /// Beer ID.
    pub id: BeerId,
    /// Beer name.
    pub name: String,
    /// Remaining descriptive fields.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl BeerItem {
    /// Create a catalog entry without metadata.
    pub fn new(id: BeerId, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), metadata: Map::new() }
    }
}

/// Rating note, always within `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Note(u8);

impl Note {
    /// Lowest accepted note.
    pub const MIN: u8 = 1;
    /// Highest accepted note.
    pub const MAX: u8 = 10;

    /// Validate a raw note.
    pub fn new(value: u8) -> Result<Self, ProtocolError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ProtocolError::NoteOutOfRange(u64::from(value)))
        }
    }

    /// Raw value.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u64> for Note {
    type Error = ProtocolError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| ProtocolError::NoteOutOfRange(value))
            .and_then(Self::new)
    }
}

impl<'de> Deserialize<'de> for Note {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u64::deserialize(deserializer)?;
        Self::try_from(raw).map_err(de::Error::custom)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant's rating for one beer, saved or in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDraft {
    /// Color notes.
    #[serde(default, deserialize_with = "text_or_null")]
    pub color: String,
    /// Foam notes.
    #[serde(default, deserialize_with = "text_or_null")]
    pub foam: String,
    /// Smell notes.
    #[serde(default, deserialize_with = "text_or_null")]
    pub smell: String,
    /// Taste notes.
    #[serde(default, deserialize_with = "text_or_null")]
    pub taste: String,
    /// Free-text opinion.
    #[serde(default, deserialize_with = "text_or_null")]
    pub opinion: String,
    /// Overall note. `None` until the participant picks one.
    #[serde(default, deserialize_with = "note_or_blank")]
    pub note: Option<Note>,
}

impl RatingDraft {
    /// Apply a single field edit.
    pub fn apply(&mut self, field: DraftField) {
        match field {
            DraftField::Color(value) => self.color = value,
            DraftField::Foam(value) => self.foam = value,
            DraftField::Smell(value) => self.smell = value,
            DraftField::Taste(value) => self.taste = value,
            DraftField::Opinion(value) => self.opinion = value,
            DraftField::Note(value) => self.note = value,
        }
    }
}

/// A single edit to a [`RatingDraft`] field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftField {
    /// Replace the color notes.
    Color(String),
    /// Replace the foam notes.
    Foam(String),
    /// Replace the smell notes.
    Smell(String),
    /// Replace the taste notes.
    Taste(String),
    /// Replace the opinion.
    Opinion(String),
    /// Pick or clear the note.
    Note(Option<Note>),
}

/// Beer reference used in aggregate results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeerSummary {
    /// Beer name.
    #[serde(default, deserialize_with = "text_or_null")]
    pub name: String,
    /// Brewery name.
    #[serde(default, deserialize_with = "text_or_null")]
    pub brewery: String,
    /// Style name.
    #[serde(default, deserialize_with = "text_or_null")]
    pub style: String,
}

/// Room-wide average for one beer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Rated beer.
    pub beer: BeerSummary,
    /// Mean note. `None` if nobody picked a note. The backend renders it
    /// as a decimal string such as `"7.50"`; plain numbers are accepted too.
    #[serde(default, deserialize_with = "decimal_or_blank")]
    pub average_rating: Option<f64>,
}

/// One of the caller's own submitted ratings.
///
/// Decoding is lenient the same way [`RatingDraft`] is: `null` text fields
/// become empty strings and a blank note becomes `None`. Fields this client
/// does not model are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRating {
    /// Beer the rating belongs to, as rendered by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beer: Option<Value>,
    /// Rating fields.
    #[serde(flatten)]
    pub rating: RatingDraft,
    /// Remaining server fields, e.g. the rating ID or author.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn text_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn note_or_blank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Note>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNote {
        Number(u64),
        Text(String),
    }

    let raw = match Option::<RawNote>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(RawNote::Text(text)) if text.trim().is_empty() => return Ok(None),
        Some(RawNote::Text(text)) => text.trim().parse::<u64>().map_err(de::Error::custom)?,
        Some(RawNote::Number(value)) => value,
    };

    Note::try_from(raw).map(Some).map_err(de::Error::custom)
}

fn decimal_or_blank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDecimal {
        Number(f64),
        Text(String),
    }

    let text = match Option::<RawDecimal>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(RawDecimal::Number(value)) => return Ok(Some(value)),
        Some(RawDecimal::Text(text)) => text,
    };

    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>().map(Some).map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn note_bounds() {
        assert!(Note::new(0).is_err());
        assert_eq!(Note::new(1).map(Note::get).ok(), Some(1));
        assert_eq!(Note::new(10).map(Note::get).ok(), Some(10));
        assert!(Note::new(11).is_err());
        assert!(Note::try_from(300u64).is_err());
    }

    #[test]
    fn draft_accepts_blank_and_null_fields() {
        let draft: RatingDraft = serde_json::from_value(json!({
            "color": null,
            "foam": "",
            "smell": "hoppy",
            "note": ""
        }))
        .unwrap();

        assert_eq!(draft.color, "");
        assert_eq!(draft.smell, "hoppy");
        assert_eq!(draft.taste, "");
        assert_eq!(draft.note, None);
    }

    #[test]
    fn draft_note_from_number_or_string() {
        let numeric: RatingDraft = serde_json::from_value(json!({ "note": 7 })).unwrap();
        let text: RatingDraft = serde_json::from_value(json!({ "note": "8" })).unwrap();

        assert_eq!(numeric.note.map(Note::get), Some(7));
        assert_eq!(text.note.map(Note::get), Some(8));
    }

    #[test]
    fn draft_rejects_out_of_range_note() {
        let result = serde_json::from_value::<RatingDraft>(json!({ "note": 11 }));
        assert!(result.is_err());
    }

    #[test]
    fn average_rating_from_decimal_string_or_number() {
        let decode = |value: Value| serde_json::from_value::<AggregateResult>(json!({
            "beer": { "name": "Komes" },
            "average_rating": value
        }));

        assert_eq!(decode(json!("7.50")).unwrap().average_rating, Some(7.5));
        assert_eq!(decode(json!(6)).unwrap().average_rating, Some(6.0));
        assert_eq!(decode(json!(null)).unwrap().average_rating, None);
        assert_eq!(decode(json!("")).unwrap().average_rating, None);
        assert!(decode(json!("lots")).is_err());
    }

    #[test]
    fn user_rating_normalizes_nulls_and_keeps_unknown_fields() {
        let rating: UserRating = serde_json::from_value(json!({
            "id": 12,
            "beer": { "id": 3, "name": "Komes" },
            "color": null,
            "taste": "roasty",
            "note": "9",
            "created_at": "2024-05-01T18:00:00Z"
        }))
        .unwrap();

        assert_eq!(rating.rating.color, "");
        assert_eq!(rating.rating.taste, "roasty");
        assert_eq!(rating.rating.note.map(Note::get), Some(9));
        assert_eq!(rating.extra.get("id"), Some(&json!(12)));
        assert!(rating.extra.contains_key("created_at"));
        assert!(!rating.extra.contains_key("taste"));
        assert!(!rating.extra.contains_key("beer"));
    }

    #[test]
    fn room_state_wire_names() {
        assert_eq!(serde_json::to_value(RoomState::InProgress).unwrap(), json!("IN_PROGRESS"));
        assert_eq!("finished".parse::<RoomState>().ok(), Some(RoomState::Finished));
        assert!("LATER".parse::<RoomState>().is_err());
        assert!(RoomState::Waiting < RoomState::Finished);
    }

    #[test]
    fn beer_item_keeps_unknown_fields() {
        let beer: BeerItem = serde_json::from_value(json!({
            "id": 3,
            "name": "Komes",
            "IBU": 30,
            "brewery": { "name": "Fortuna" }
        }))
        .unwrap();

        assert_eq!(beer.id, 3);
        assert_eq!(beer.metadata.get("IBU"), Some(&json!(30)));
        assert!(beer.metadata.contains_key("brewery"));
    }
}
