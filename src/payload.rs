//! Handoff payload composed from a draft.
//!
//! The receiving screen takes `{ highlights, analysis, actionItems,
//! trafficLight }`. Analysis notes collapse into one text block; text-only
//! highlights travel as bare strings, media highlights as objects carrying
//! their reference so the report can embed the photo.

#[cfg(test)]
#[path = "payload_test.rs"]
mod payload_test;

use serde::{Deserialize, Serialize};

use crate::draft::{Draft, Highlight, MediaType, NoteId, TrafficLight};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HighlightPayload {
    Text(String),
    Media(MediaHighlightPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaHighlightPayload {
    pub id: NoteId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_media_url: Option<String>,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_name: Option<String>,
    /// Always present on the wire; `null` when there is nothing to compare.
    #[serde(default)]
    pub compare_data: Option<serde_json::Value>,
}

impl From<&Highlight> for HighlightPayload {
    fn from(h: &Highlight) -> Self {
        match &h.media {
            None => Self::Text(h.text.clone()),
            Some(media) => Self::Media(MediaHighlightPayload {
                id: h.id.clone(),
                text: h.text.clone(),
                thumbnail: media.thumbnail.clone(),
                source_media_url: media.source_media_url.clone(),
                media_type: media.media_type,
                exercise_name: media.exercise_name.clone(),
                compare_data: media.compare_data.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffPayload {
    pub highlights: Vec<HighlightPayload>,
    pub analysis: String,
    pub action_items: Vec<String>,
    pub traffic_light: TrafficLight,
}

impl HandoffPayload {
    /// Compose from a draft. Callers decide whether an empty draft may be sent.
    #[must_use]
    pub fn from_draft(draft: &Draft) -> Self {
        Self {
            highlights: draft.highlights.iter().map(HighlightPayload::from).collect(),
            analysis: draft.analysis_notes.iter().map(|n| n.text.as_str()).collect::<Vec<_>>().join("\n"),
            action_items: draft.action_items.iter().map(|n| n.text.clone()).collect(),
            traffic_light: draft.status,
        }
    }
}

/// Everything the target screen needs: who the report is for and what to prefill.
#[derive(Debug, Clone, PartialEq)]
pub struct HandoffRequest {
    pub client_id: String,
    pub payload: HandoffPayload,
}

impl HandoffRequest {
    /// The payload as the JSON string passed as a navigation parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if a media `compareData` value cannot be serialized.
    pub fn prefill_data(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.payload)
    }
}
