use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use super::*;
use crate::handoff::{ChannelHandoff, ComposeNavigation};
use crate::store::MemoryStore;
use crate::widget::Notice;

// =============================================================================
// Helpers
// =============================================================================

struct Harness {
    bubble: FeedbackBubble,
    store: Arc<MemoryStore>,
    nav: mpsc::Receiver<ComposeNavigation>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn harness_with_store(store: Arc<MemoryStore>) -> Harness {
    init_tracing();
    let (handoff, nav) = ChannelHandoff::new(4);
    let bubble =
        FeedbackBubble::new(store.clone(), Arc::new(handoff), BubbleConfig::default(), Viewport::new(390.0, 844.0));
    Harness { bubble, store, nav }
}

fn harness() -> Harness {
    harness_with_store(Arc::new(MemoryStore::new()))
}

async fn stored(store: &MemoryStore, client_id: &str) -> Option<String> {
    store.get(&format!("feedback_draft_{client_id}")).await.unwrap()
}

// =============================================================================
// End to end
// =============================================================================

#[tokio::test]
async fn send_feedback_hands_off_and_deletes_draft() {
    let mut h = harness();
    h.bubble.set_active_client(Some("c1"), "Jane").await;
    h.bubble.set_input(NoteSection::Highlights, "Great squat form").await;
    h.bubble.submit_note(NoteSection::Highlights).await;
    h.bubble.add_note(NoteSection::Actions, "Increase deadlift weight").await;
    h.bubble.set_status(TrafficLight::Yellow).await;
    h.bubble.flush().await.unwrap();
    assert!(stored(&h.store, "c1").await.is_some());

    let request = h.bubble.send_feedback().await.unwrap();
    assert_eq!(request.client_id, "c1");
    assert_eq!(
        serde_json::to_value(&request.payload).unwrap(),
        json!({
            "highlights": ["Great squat form"],
            "analysis": "",
            "actionItems": ["Increase deadlift weight"],
            "trafficLight": "yellow",
        })
    );

    let nav = h.nav.recv().await.unwrap();
    assert_eq!(nav.client_id, "c1");
    let prefill: serde_json::Value = serde_json::from_str(&nav.prefill_data).unwrap();
    assert_eq!(prefill["trafficLight"], "yellow");

    h.bubble.flush().await.unwrap();
    assert_eq!(stored(&h.store, "c1").await, None);
    assert_eq!(h.bubble.state().await, WidgetState::Collapsed);
    assert!(h.bubble.draft().await.is_empty());
}

#[tokio::test]
async fn clear_removes_stored_entry() {
    let h = harness();
    h.bubble.set_active_client(Some("c1"), "Jane").await;
    h.bubble.add_note(NoteSection::Highlights, "Great squat form").await;
    assert!(h.bubble.is_pulsing().await);

    h.bubble.clear().await;
    h.bubble.flush().await.unwrap();
    assert_eq!(stored(&h.store, "c1").await, None);
    assert!(h.bubble.draft().await.is_empty());
    assert!(!h.bubble.is_pulsing().await);
}

#[tokio::test]
async fn legacy_analysis_string_loads_as_one_note() {
    let store = Arc::new(MemoryStore::new());
    store
        .set("feedback_draft_c1", json!({ "highlights": [], "analysis": "Good week", "actionItems": [] }).to_string())
        .await
        .unwrap();
    let h = harness_with_store(store);
    h.bubble.set_active_client(Some("c1"), "Jane").await;

    let draft = h.bubble.draft().await;
    assert_eq!(draft.texts(NoteSection::Analysis), vec!["Good week"]);
    assert!(!draft.analysis_notes[0].id.as_str().is_empty());
    assert_eq!(draft.status, TrafficLight::Green);
}

#[tokio::test]
async fn drafts_are_isolated_per_client() {
    let h = harness();
    h.bubble.set_active_client(Some("a"), "Ann").await;
    h.bubble.add_note(NoteSection::Highlights, "note for A").await;

    h.bubble.set_active_client(Some("b"), "Ben").await;
    assert!(h.bubble.draft().await.is_empty());
    h.bubble.add_note(NoteSection::Actions, "note for B").await;

    h.bubble.set_active_client(Some("a"), "Ann").await;
    let draft = h.bubble.draft().await;
    assert_eq!(draft.client_id, "a");
    assert_eq!(draft.texts(NoteSection::Highlights), vec!["note for A"]);
    assert!(draft.action_items.is_empty());
}

#[tokio::test]
async fn empty_draft_is_never_written() {
    let h = harness();
    h.bubble.set_active_client(Some("c1"), "Jane").await;
    h.bubble.set_status(TrafficLight::Red).await;
    h.bubble.add_note(NoteSection::Analysis, "   ").await;
    h.bubble.flush().await.unwrap();
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn removing_last_note_deletes_stored_entry() {
    let h = harness();
    h.bubble.set_active_client(Some("c1"), "Jane").await;
    h.bubble.add_note(NoteSection::Actions, "Walk daily").await;
    let id = h.bubble.draft().await.action_items[0].id.clone();
    h.bubble.remove_note(NoteSection::Actions, &id).await;
    h.bubble.remove_note(NoteSection::Actions, &id).await;
    h.bubble.flush().await.unwrap();
    assert_eq!(stored(&h.store, "c1").await, None);
}

// =============================================================================
// Handoff failures
// =============================================================================

#[tokio::test]
async fn empty_send_raises_notice_without_navigation() {
    let mut h = harness();
    h.bubble.set_active_client(Some("c1"), "Jane").await;
    h.bubble.tap().await;

    assert!(matches!(h.bubble.send_feedback().await, Err(SendError::EmptyDraft)));
    let snap = h.bubble.snapshot().await;
    assert_eq!(snap.notice, Some(Notice::EmptyDraft));
    assert_eq!(snap.state, WidgetState::Expanded);
    assert!(h.nav.try_recv().is_err());

    h.bubble.dismiss_notice().await;
    assert_eq!(h.bubble.snapshot().await.notice, None);
}

#[tokio::test]
async fn send_without_client_fails() {
    let h = harness();
    assert!(matches!(h.bubble.send_feedback().await, Err(SendError::NoActiveClient)));
}

#[tokio::test]
async fn failed_handoff_keeps_draft() {
    let Harness { bubble, store, nav } = harness();
    drop(nav);
    bubble.set_active_client(Some("c1"), "Jane").await;
    bubble.add_note(NoteSection::Highlights, "Great squat form").await;

    assert!(matches!(bubble.send_feedback().await, Err(SendError::Handoff(HandoffError::Closed))));
    bubble.flush().await.unwrap();
    assert_eq!(bubble.draft().await.content_count(), 1);
    assert!(stored(&store, "c1").await.is_some());
}

#[tokio::test]
async fn slow_handoff_does_not_block_the_bubble() {
    init_tracing();
    let (handoff, mut nav) = ChannelHandoff::new(1);
    let bubble = FeedbackBubble::new(
        Arc::new(MemoryStore::new()),
        Arc::new(handoff),
        BubbleConfig::default(),
        Viewport::new(390.0, 844.0),
    );
    bubble.set_active_client(Some("c1"), "Jane").await;
    bubble.add_note(NoteSection::Highlights, "first report").await;
    bubble.send_feedback().await.unwrap();

    // The navigation channel is full, so this send waits on the target.
    bubble.add_note(NoteSection::Highlights, "second report").await;
    let sender = bubble.clone();
    let pending = tokio::spawn(async move { sender.send_feedback().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snap = tokio::time::timeout(Duration::from_millis(500), bubble.snapshot()).await.unwrap();
    assert_eq!(snap.content_count, 1);
    let actions = tokio::time::timeout(Duration::from_millis(500), bubble.tick(16.0)).await;
    assert!(actions.is_ok());

    assert_eq!(nav.recv().await.unwrap().client_id, "c1");
    pending.await.unwrap().unwrap();
    assert_eq!(nav.recv().await.unwrap().client_id, "c1");
    assert!(bubble.draft().await.is_empty());
}

#[tokio::test]
async fn handoff_completion_ignores_newly_active_client() {
    init_tracing();
    let (handoff, mut nav) = ChannelHandoff::new(1);
    let store = Arc::new(MemoryStore::new());
    let bubble =
        FeedbackBubble::new(store.clone(), Arc::new(handoff), BubbleConfig::default(), Viewport::new(390.0, 844.0));
    bubble.set_active_client(Some("c1"), "Jane").await;
    bubble.add_note(NoteSection::Highlights, "fill the channel").await;
    bubble.send_feedback().await.unwrap();
    bubble.add_note(NoteSection::Highlights, "for Jane").await;

    let sender = bubble.clone();
    let pending = tokio::spawn(async move { sender.send_feedback().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    bubble.set_active_client(Some("c2"), "Bob").await;
    bubble.add_note(NoteSection::Actions, "for Bob").await;

    nav.recv().await.unwrap();
    pending.await.unwrap().unwrap();
    assert_eq!(bubble.draft().await.texts(NoteSection::Actions), vec!["for Bob"]);
    bubble.flush().await.unwrap();
    assert_eq!(stored(&store, "c1").await, None);
    assert!(stored(&store, "c2").await.is_some());
}

// =============================================================================
// Activation
// =============================================================================

#[tokio::test]
async fn reactivating_same_client_keeps_memory_draft() {
    let h = harness();
    h.bubble.set_active_client(Some("c1"), "Jane").await;
    h.bubble.add_note(NoteSection::Highlights, "in memory").await;
    h.bubble.flush().await.unwrap();
    h.store.set("feedback_draft_c1", "{}".into()).await.unwrap();

    h.bubble.set_active_client(Some("c1"), "Jane Doe").await;
    let snap = h.bubble.snapshot().await;
    assert_eq!(snap.content_count, 1);
    assert_eq!(snap.client.unwrap().display_name, "Jane Doe");
}

#[tokio::test]
async fn clearing_client_hides_bubble() {
    let h = harness();
    h.bubble.set_active_client(Some("c1"), "Jane").await;
    h.bubble.set_active_client(None, "").await;
    assert_eq!(h.bubble.state().await, WidgetState::Hidden);
    h.bubble.show_bubble().await;
    assert_eq!(h.bubble.state().await, WidgetState::Hidden);
}

#[tokio::test]
async fn hide_and_show_keep_draft() {
    let h = harness();
    h.bubble.set_active_client(Some("c1"), "Jane").await;
    h.bubble.add_note(NoteSection::Highlights, "kept").await;
    h.bubble.hide_bubble().await;
    assert_eq!(h.bubble.state().await, WidgetState::Hidden);
    assert!(!h.bubble.is_pulsing().await);
    h.bubble.show_bubble().await;
    assert_eq!(h.bubble.state().await, WidgetState::Collapsed);
    assert_eq!(h.bubble.draft().await.content_count(), 1);
}

// =============================================================================
// Gestures through the service
// =============================================================================

#[tokio::test]
async fn drag_release_returns_animation_and_suppresses_tap() {
    let h = harness();
    h.bubble.set_active_client(Some("c1"), "Jane").await;
    h.bubble.pointer_down(Region::Handle).await;
    h.bubble.pointer_move(Point::new(250.0, 0.0)).await;
    let actions = h.bubble.pointer_up(Point::new(250.0, 0.0)).await;
    assert!(actions.iter().any(|a| matches!(a, Action::Animate { .. })));

    assert!(h.bubble.tap().await.is_empty());
    assert_eq!(h.bubble.state().await, WidgetState::Collapsed);

    h.bubble.tick(5_000.0).await;
    assert_eq!(h.bubble.snapshot().await.position.x, 390.0 - 56.0 - 16.0);
}

#[tokio::test]
async fn pointer_cancel_reverts_position() {
    let h = harness();
    h.bubble.set_active_client(Some("c1"), "Jane").await;
    let before = h.bubble.snapshot().await.position;
    h.bubble.pointer_down(Region::Handle).await;
    h.bubble.pointer_move(Point::new(100.0, 100.0)).await;
    h.bubble.pointer_cancel().await;
    assert_eq!(h.bubble.snapshot().await.position, before);
}

#[tokio::test]
async fn tap_then_collapse() {
    let h = harness();
    h.bubble.set_active_client(Some("c1"), "Jane").await;
    h.bubble.tap().await;
    assert_eq!(h.bubble.state().await, WidgetState::Expanded);
    h.bubble.collapse().await;
    assert_eq!(h.bubble.state().await, WidgetState::Collapsed);
}

#[tokio::test]
async fn viewport_change_keeps_widget_on_screen() {
    let h = harness();
    h.bubble.set_active_client(Some("c1"), "Jane").await;
    h.bubble.set_viewport(320.0, 400.0).await;
    let snap = h.bubble.snapshot().await;
    assert!(snap.position.y + snap.size.height <= 400.0);
}
