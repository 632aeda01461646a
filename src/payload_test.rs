use serde_json::json;

use super::*;
use crate::draft::{MediaRef, NoteSection};

fn draft_with_text_notes() -> Draft {
    let mut draft = Draft::new("c1");
    draft.push(NoteSection::Highlights, NoteId::new("1"), "Great squat form".into());
    draft.push(NoteSection::Actions, NoteId::new("2"), "Increase deadlift weight".into());
    draft.status = TrafficLight::Yellow;
    draft
}

#[test]
fn text_only_payload_matches_wire_shape() {
    let payload = HandoffPayload::from_draft(&draft_with_text_notes());
    assert_eq!(
        serde_json::to_value(&payload).unwrap(),
        json!({
            "highlights": ["Great squat form"],
            "analysis": "",
            "actionItems": ["Increase deadlift weight"],
            "trafficLight": "yellow",
        })
    );
}

#[test]
fn analysis_notes_join_with_newlines() {
    let mut draft = Draft::new("c1");
    draft.push(NoteSection::Analysis, NoteId::new("1"), "Sleep is down".into());
    draft.push(NoteSection::Analysis, NoteId::new("2"), "Hit protein target".into());
    let payload = HandoffPayload::from_draft(&draft);
    assert_eq!(payload.analysis, "Sleep is down\nHit protein target");
}

#[test]
fn media_highlight_keeps_reference() {
    let mut draft = Draft::new("c1");
    draft.highlights.push(Highlight {
        id: NoteId::new("photo_4_1"),
        text: "Front pose".into(),
        media: Some(MediaRef {
            media_type: MediaType::Photo,
            thumbnail: Some("t.jpg".into()),
            source_media_url: Some("annotated.jpg".into()),
            exercise_name: Some("Progress photo".into()),
            compare_data: None,
        }),
    });
    let value = serde_json::to_value(HandoffPayload::from_draft(&draft)).unwrap();
    assert_eq!(
        value["highlights"][0],
        json!({
            "id": "photo_4_1",
            "text": "Front pose",
            "thumbnail": "t.jpg",
            "sourceMediaUrl": "annotated.jpg",
            "mediaType": "photo",
            "exerciseName": "Progress photo",
            "compareData": null,
        })
    );
}

#[test]
fn prefill_data_parses_back() {
    let request = HandoffRequest {
        client_id: "c1".into(),
        payload: HandoffPayload::from_draft(&draft_with_text_notes()),
    };
    let parsed: HandoffPayload = serde_json::from_str(&request.prefill_data().unwrap()).unwrap();
    assert_eq!(parsed, request.payload);
}

#[test]
fn media_highlight_omits_absent_fields() {
    let mut draft = Draft::new("c1");
    draft.highlights.push(Highlight {
        id: NoteId::new("video_2_7"),
        text: "Squat clip".into(),
        media: Some(MediaRef {
            media_type: MediaType::Video,
            thumbnail: None,
            source_media_url: None,
            exercise_name: None,
            compare_data: None,
        }),
    });
    let value = serde_json::to_value(HandoffPayload::from_draft(&draft)).unwrap();
    assert_eq!(
        value["highlights"][0],
        json!({
            "id": "video_2_7",
            "text": "Squat clip",
            "mediaType": "video",
            "compareData": null,
        })
    );
}
