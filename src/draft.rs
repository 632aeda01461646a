//! Draft model: per-client notes, the traffic-light status, and the stored
//! JSON codec.
//!
//! DESIGN
//! ======
//! `Draft` is the in-memory truth for one client. The stored form is read
//! through a lenient wire struct so drafts written by older app versions
//! (numeric ids, flat media fields, the single-string `analysis` field) and
//! partially corrupted entries still load. Writes always use the current
//! format.

#[cfg(test)]
#[path = "draft_test.rs"]
mod draft_test;

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize};

/// Prefix of every persisted draft key.
pub const STORAGE_KEY_PREFIX: &str = "feedback_draft_";

/// Storage key holding the draft for `client_id`.
#[must_use]
pub fn storage_key(client_id: &str) -> String {
    format!("{STORAGE_KEY_PREFIX}{client_id}")
}

// =============================================================================
// IDS
// =============================================================================

/// Identifier of one note, unique within its own list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Older drafts stored `Date.now()` numbers; imported media uses strings.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Int(n) => Self(n.to_string()),
            Raw::Float(f) => Self(f.to_string()),
        })
    }
}

pub(crate) fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// Timestamp-based id generator. Strictly increasing within one source, so
/// two notes added in the same millisecond still get distinct ids.
#[derive(Debug, Default, Clone)]
pub struct IdSource {
    last_ms: i64,
}

impl IdSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id not rejected by `taken`.
    pub fn next(&mut self, taken: impl Fn(&NoteId) -> bool) -> NoteId {
        let mut candidate = now_ms().max(self.last_ms + 1);
        while taken(&NoteId(candidate.to_string())) {
            candidate += 1;
        }
        self.last_ms = candidate;
        NoteId(candidate.to_string())
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// Overall client status for the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLight {
    #[default]
    Green,
    Yellow,
    Red,
}

impl TrafficLight {
    pub const ALL: [Self; 3] = [Self::Green, Self::Yellow, Self::Red];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }

    /// Parse a stored value, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

// =============================================================================
// NOTES
// =============================================================================

/// The three note lists of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteSection {
    Highlights,
    Analysis,
    Actions,
}

impl NoteSection {
    pub const ALL: [Self; 3] = [Self::Highlights, Self::Analysis, Self::Actions];
}

/// A plain text note (analysis or action item).
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
    #[serde(other)]
    Other,
}

impl MediaType {
    /// Parse a stored `mediaType`. A blank value means the note has no media.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" => None,
            "photo" => Some(Self::Photo),
            "video" => Some(Self::Video),
            _ => Some(Self::Other),
        }
    }
}

/// Media attached to a highlight by another capture flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub id: NoteId,
    pub text: String,
    pub media: Option<MediaRef>,
}

// =============================================================================
// DRAFT
// =============================================================================

/// In-progress, unsent notes for one client.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub client_id: String,
    pub highlights: Vec<Highlight>,
    pub analysis_notes: Vec<Note>,
    pub action_items: Vec<Note>,
    pub status: TrafficLight,
}

impl Draft {
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            highlights: Vec::new(),
            analysis_notes: Vec::new(),
            action_items: Vec::new(),
            status: TrafficLight::default(),
        }
    }

    /// True when all three lists are empty. Status alone does not count.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty() && self.analysis_notes.is_empty() && self.action_items.is_empty()
    }

    /// Total number of notes across the three lists.
    #[must_use]
    pub fn content_count(&self) -> usize {
        self.highlights.len() + self.analysis_notes.len() + self.action_items.len()
    }

    #[must_use]
    pub fn contains(&self, section: NoteSection, id: &NoteId) -> bool {
        match section {
            NoteSection::Highlights => self.highlights.iter().any(|h| &h.id == id),
            NoteSection::Analysis => self.analysis_notes.iter().any(|n| &n.id == id),
            NoteSection::Actions => self.action_items.iter().any(|n| &n.id == id),
        }
    }

    /// Texts of one section in display order.
    #[must_use]
    pub fn texts(&self, section: NoteSection) -> Vec<&str> {
        match section {
            NoteSection::Highlights => self.highlights.iter().map(|h| h.text.as_str()).collect(),
            NoteSection::Analysis => self.analysis_notes.iter().map(|n| n.text.as_str()).collect(),
            NoteSection::Actions => self.action_items.iter().map(|n| n.text.as_str()).collect(),
        }
    }

    /// Append a text-only note to the end of `section`.
    pub fn push(&mut self, section: NoteSection, id: NoteId, text: String) {
        match section {
            NoteSection::Highlights => self.highlights.push(Highlight { id, text, media: None }),
            NoteSection::Analysis => self.analysis_notes.push(Note { id, text }),
            NoteSection::Actions => self.action_items.push(Note { id, text }),
        }
    }

    /// Remove the note with `id` from `section`. Returns whether anything changed.
    pub fn remove(&mut self, section: NoteSection, id: &NoteId) -> bool {
        let before = self.len(section);
        match section {
            NoteSection::Highlights => self.highlights.retain(|h| &h.id != id),
            NoteSection::Analysis => self.analysis_notes.retain(|n| &n.id != id),
            NoteSection::Actions => self.action_items.retain(|n| &n.id != id),
        }
        self.len(section) != before
    }

    #[must_use]
    pub fn len(&self, section: NoteSection) -> usize {
        match section {
            NoteSection::Highlights => self.highlights.len(),
            NoteSection::Analysis => self.analysis_notes.len(),
            NoteSection::Actions => self.action_items.len(),
        }
    }

    /// Encode in the current stored format.
    ///
    /// # Errors
    ///
    /// Returns an error if a media `compareData` value cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let out = DraftOut {
            client_id: &self.client_id,
            highlights: self
                .highlights
                .iter()
                .map(|h| NoteOut { id: &h.id, text: &h.text, media: h.media.as_ref() })
                .collect(),
            analysis_notes: self.analysis_notes.iter().map(NoteOut::plain).collect(),
            action_items: self.action_items.iter().map(NoteOut::plain).collect(),
            traffic_light: self.status,
        };
        serde_json::to_string(&out)
    }

    /// Decode a stored draft for `client_id`, defaulting anything missing.
    ///
    /// The key, not the stored body, decides which client a draft belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error when `raw` is not JSON or not shaped like a draft
    /// object at the top level.
    pub fn from_json(client_id: &str, raw: &str, ids: &mut IdSource) -> Result<Self, serde_json::Error> {
        let stored: StoredDraft = serde_json::from_str(raw)?;
        Ok(stored.into_draft(client_id, ids))
    }
}

// =============================================================================
// WIRE FORMAT
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DraftOut<'a> {
    client_id: &'a str,
    highlights: Vec<NoteOut<'a>>,
    analysis_notes: Vec<NoteOut<'a>>,
    action_items: Vec<NoteOut<'a>>,
    traffic_light: TrafficLight,
}

#[derive(Serialize)]
struct NoteOut<'a> {
    id: &'a NoteId,
    text: &'a str,
    #[serde(flatten)]
    media: Option<&'a MediaRef>,
}

impl<'a> NoteOut<'a> {
    fn plain(note: &'a Note) -> Self {
        Self { id: &note.id, text: &note.text, media: None }
    }
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct StoredDraft {
    highlights: Option<serde_json::Value>,
    analysis_notes: Option<serde_json::Value>,
    /// Pre-list format: the whole analysis as one string.
    analysis: Option<serde_json::Value>,
    action_items: Option<serde_json::Value>,
    traffic_light: Option<serde_json::Value>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct StoredNote {
    id: Option<NoteId>,
    text: Option<String>,
    media_type: Option<String>,
    thumbnail: Option<String>,
    source_media_url: Option<String>,
    exercise_name: Option<String>,
    compare_data: Option<serde_json::Value>,
}

impl StoredNote {
    fn into_media(self) -> Option<MediaRef> {
        Some(MediaRef {
            media_type: MediaType::parse(self.media_type.as_deref()?)?,
            thumbnail: self.thumbnail,
            source_media_url: self.source_media_url,
            exercise_name: self.exercise_name,
            compare_data: self.compare_data.filter(|v| !v.is_null()),
        })
    }
}

impl StoredDraft {
    fn into_draft(self, client_id: &str, ids: &mut IdSource) -> Draft {
        let mut draft = Draft::new(client_id);

        for note in stored_notes(self.highlights) {
            let taken = draft.highlights.iter().map(|h| &h.id).collect::<Vec<_>>();
            let Some((id, text)) = accept_note(&note, &taken, ids) else {
                continue;
            };
            draft.highlights.push(Highlight { id, text, media: note.into_media() });
        }

        let legacy_analysis = self
            .analysis
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(text) = legacy_analysis {
            let id = ids.next(|_| false);
            draft.analysis_notes.push(Note { id, text: text.to_owned() });
        } else {
            for note in stored_notes(self.analysis_notes) {
                let taken = draft.analysis_notes.iter().map(|n| &n.id).collect::<Vec<_>>();
                if let Some((id, text)) = accept_note(&note, &taken, ids) {
                    draft.analysis_notes.push(Note { id, text });
                }
            }
        }

        for note in stored_notes(self.action_items) {
            let taken = draft.action_items.iter().map(|n| &n.id).collect::<Vec<_>>();
            if let Some((id, text)) = accept_note(&note, &taken, ids) {
                draft.action_items.push(Note { id, text });
            }
        }

        draft.status = self
            .traffic_light
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(TrafficLight::parse)
            .unwrap_or_default();

        draft
    }
}

/// Entries of a stored list; anything that is not an array of objects
/// degrades to fewer (or zero) notes.
fn stored_notes(list: Option<serde_json::Value>) -> Vec<StoredNote> {
    let Some(serde_json::Value::Array(items)) = list else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<StoredNote>(item).ok())
        .collect()
}

/// Validate one stored note: blank text is dropped, a missing or duplicate
/// id is replaced with a fresh one.
fn accept_note(note: &StoredNote, taken: &[&NoteId], ids: &mut IdSource) -> Option<(NoteId, String)> {
    let text = note.text.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
    let id = match &note.id {
        Some(id) if !id.as_str().is_empty() && !taken.contains(&id) => id.clone(),
        _ => ids.next(|candidate| taken.contains(&candidate)),
    };
    Some((id, text.to_owned()))
}
