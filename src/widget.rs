//! Widget core: the floating bubble's state machine.
//!
//! DESIGN
//! ======
//! `WidgetCore` holds everything the bubble knows (active client, draft,
//! input buffers, position, gesture and animation state) and is driven by
//! plain method calls. It performs no I/O. Handlers return `Action`s that
//! the host (normally `FeedbackBubble`) turns into storage writes, redraws
//! or notices, so the whole machine is testable without a runtime.
//!
//! STATES
//! ======
//! `Hidden` (no client or bubble hidden) -> `Collapsed` (handle) ->
//! `Expanded` (panel). The handle drags from anywhere; the panel only
//! from its header.

#[cfg(test)]
#[path = "widget_test.rs"]
mod widget_test;

use tracing::debug;

use crate::animation::{self, PositionMotion, SpringParams};
use crate::config::GestureConfig;
use crate::consts::{EXPAND_SPRING_FRICTION, EXPAND_SPRING_TENSION, RELEASE_SPRING_FRICTION, RELEASE_SPRING_TENSION};
use crate::draft::{Draft, Highlight, IdSource, NoteId, NoteSection, TrafficLight};
use crate::geometry::{Bounds, Point, Size, Viewport};
use crate::gesture::{self, DragState, Region};
use crate::payload::{HandoffPayload, HandoffRequest};

/// Shown in the panel header when the host passes no display name.
pub const FALLBACK_DISPLAY_NAME: &str = "Client";

/// Side effects requested by the core for the host to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Persist the full draft under the client's key.
    SaveDraft { client_id: String, draft: Draft },
    /// Remove the client's stored draft.
    DeleteDraft { client_id: String },
    /// Read the client's stored draft and feed it to `apply_loaded`.
    LoadDraft { client_id: String },
    /// A spring animation toward `to` has started.
    Animate { to: Point },
    /// Show an informational message.
    Notice(Notice),
    /// Visible state changed.
    RenderNeeded,
}

/// Informational messages for blocked user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Tried to send a report with no notes.
    EmptyDraft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Hidden,
    Collapsed,
    Expanded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveClient {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum ComposeError {
    #[error("no active client")]
    NoActiveClient,
    #[error("draft is empty")]
    EmptyDraft,
}

/// Text typed into each section's entry field but not yet added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteInputs {
    pub highlight: String,
    pub analysis: String,
    pub action: String,
}

impl NoteInputs {
    #[must_use]
    pub fn get(&self, section: NoteSection) -> &str {
        match section {
            NoteSection::Highlights => &self.highlight,
            NoteSection::Analysis => &self.analysis,
            NoteSection::Actions => &self.action,
        }
    }

    fn get_mut(&mut self, section: NoteSection) -> &mut String {
        match section {
            NoteSection::Highlights => &mut self.highlight,
            NoteSection::Analysis => &mut self.analysis,
            NoteSection::Actions => &mut self.action,
        }
    }
}

/// Everything a view layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSnapshot {
    pub state: WidgetState,
    pub client: Option<ActiveClient>,
    pub position: Point,
    pub size: Size,
    pub scale: f64,
    pub content_count: usize,
    pub draft: Draft,
    pub inputs: NoteInputs,
    pub notice: Option<Notice>,
}

pub struct WidgetCore {
    pub gesture: GestureConfig,
    viewport: Viewport,
    client: Option<ActiveClient>,
    visible: bool,
    expanded: bool,
    draft: Draft,
    inputs: NoteInputs,
    /// Committed (resting) position.
    position: Point,
    /// Displayed position; differs from `position` mid-drag or mid-spring.
    live: Point,
    motion: Option<PositionMotion>,
    drag: DragState,
    last_drag_end_ms: Option<u64>,
    pulse_elapsed_ms: f64,
    ids: IdSource,
    notice: Option<Notice>,
}

impl WidgetCore {
    #[must_use]
    pub fn new(gesture: GestureConfig, viewport: Viewport) -> Self {
        let position = viewport.initial_position();
        Self {
            gesture,
            viewport,
            client: None,
            visible: false,
            expanded: false,
            draft: Draft::new(""),
            inputs: NoteInputs::default(),
            position,
            live: position,
            motion: None,
            drag: DragState::Idle,
            last_drag_end_ms: None,
            pulse_elapsed_ms: 0.0,
            ids: IdSource::new(),
            notice: None,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn state(&self) -> WidgetState {
        match (&self.client, self.visible, self.expanded) {
            (None, _, _) | (_, false, _) => WidgetState::Hidden,
            (Some(_), true, false) => WidgetState::Collapsed,
            (Some(_), true, true) => WidgetState::Expanded,
        }
    }

    #[must_use]
    pub fn active_client(&self) -> Option<&ActiveClient> {
        self.client.as_ref()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        match &self.client {
            Some(c) if !c.display_name.trim().is_empty() => &c.display_name,
            _ => FALLBACK_DISPLAY_NAME,
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    #[must_use]
    pub fn input(&self, section: NoteSection) -> &str {
        self.inputs.get(section)
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Where the widget is drawn right now.
    #[must_use]
    pub fn position(&self) -> Point {
        self.live
    }

    /// Where the widget rests once any drag or spring finishes.
    #[must_use]
    pub fn committed_position(&self) -> Point {
        self.position
    }

    /// Current widget size; the panel size only while expanded.
    #[must_use]
    pub fn size(&self) -> Size {
        if self.expanded { self.viewport.expanded_size() } else { self.viewport.collapsed_size() }
    }

    #[must_use]
    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.motion.is_some()
    }

    /// Pulsing while collapsed, visible, and holding at least one note.
    #[must_use]
    pub fn is_pulsing(&self) -> bool {
        self.state() == WidgetState::Collapsed && !self.draft.is_empty()
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        if self.is_pulsing() { animation::pulse_scale(self.pulse_elapsed_ms) } else { 1.0 }
    }

    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.notice
    }

    #[must_use]
    pub fn snapshot(&self) -> WidgetSnapshot {
        WidgetSnapshot {
            state: self.state(),
            client: self.client.clone(),
            position: self.live,
            size: self.size(),
            scale: self.scale(),
            content_count: self.draft.content_count(),
            draft: self.draft.clone(),
            inputs: self.inputs.clone(),
            notice: self.notice,
        }
    }

    // --- Activation ---

    /// Bind the widget to a client and show it. `None` or an empty id unbinds
    /// and hides it. Switching to a different client starts from an empty
    /// draft and asks the host to load the stored one.
    pub fn set_active_client(&mut self, id: Option<&str>, display_name: &str) -> Vec<Action> {
        let Some(id) = id.filter(|id| !id.is_empty()) else {
            debug!("feedback bubble: active client cleared");
            self.abort_drag();
            self.client = None;
            self.visible = false;
            self.expanded = false;
            self.reset_draft("");
            return vec![Action::RenderNeeded];
        };

        self.visible = true;
        if let Some(client) = self.client.as_mut().filter(|c| c.id == id) {
            client.display_name = display_name.to_owned();
            return vec![Action::RenderNeeded];
        }

        debug!(client_id = %id, "feedback bubble: active client set");
        self.abort_drag();
        self.client = Some(ActiveClient { id: id.to_owned(), display_name: display_name.to_owned() });
        self.reset_draft(id);
        vec![Action::LoadDraft { client_id: id.to_owned() }, Action::RenderNeeded]
    }

    /// Install the draft loaded for `client_id`. Ignored if another client
    /// became active in the meantime.
    pub fn apply_loaded(&mut self, client_id: &str, draft: Option<Draft>) -> Vec<Action> {
        if self.client.as_ref().map(|c| c.id.as_str()) != Some(client_id) {
            return Vec::new();
        }
        let mut draft = draft.unwrap_or_else(|| Draft::new(client_id));
        draft.client_id = client_id.to_owned();
        self.draft = draft;
        vec![Action::RenderNeeded]
    }

    /// Make the bubble visible without changing the bound client.
    pub fn show_bubble(&mut self) -> Vec<Action> {
        self.visible = true;
        vec![Action::RenderNeeded]
    }

    /// Hide the bubble (and fold the panel) without unbinding the client.
    pub fn hide_bubble(&mut self) -> Vec<Action> {
        self.abort_drag();
        self.visible = false;
        self.expanded = false;
        vec![Action::RenderNeeded]
    }

    // --- Expand / collapse ---

    /// A tap on the collapsed handle. Ignored mid-drag and shortly after a
    /// drag release so letting go of the handle never opens it.
    pub fn tap(&mut self, now_ms: u64) -> Vec<Action> {
        if self.state() != WidgetState::Collapsed || self.drag.is_dragging() {
            return Vec::new();
        }
        if !gesture::tap_allowed(self.last_drag_end_ms, now_ms, self.gesture.tap_suppress_ms) {
            debug!(now_ms, "feedback bubble: tap suppressed after drag");
            return Vec::new();
        }
        self.expand()
    }

    fn expand(&mut self) -> Vec<Action> {
        self.drag = DragState::Idle;
        self.expanded = true;

        let target = Bounds::rest(self.viewport, self.size()).clamp(self.position);
        if target == self.position {
            return vec![Action::RenderNeeded];
        }
        self.position = target;
        self.start_motion(target, SpringParams::from_friction_tension(EXPAND_SPRING_FRICTION, EXPAND_SPRING_TENSION));
        vec![Action::Animate { to: target }, Action::RenderNeeded]
    }

    /// Fold the panel back into the handle (chevron).
    pub fn collapse(&mut self) -> Vec<Action> {
        if self.state() != WidgetState::Expanded {
            return Vec::new();
        }
        self.abort_drag();
        self.expanded = false;
        vec![Action::RenderNeeded]
    }

    // --- Viewport ---

    /// React to a screen size change (rotation, window resize).
    pub fn set_viewport(&mut self, width: f64, height: f64) -> Vec<Action> {
        let viewport = Viewport::new(width, height);
        if !viewport.is_usable() || viewport == self.viewport {
            return Vec::new();
        }
        self.viewport = viewport;
        self.abort_drag();
        self.position = Bounds::rest(viewport, self.size()).clamp(self.position);
        self.live = self.position;
        self.motion = None;
        vec![Action::RenderNeeded]
    }

    // --- Pointer input ---

    /// Press on the widget. Only the handle (collapsed) or the header
    /// (expanded) can start a drag.
    pub fn on_pointer_down(&mut self, region: Region) -> Vec<Action> {
        let draggable = matches!(
            (self.state(), region),
            (WidgetState::Collapsed, Region::Handle) | (WidgetState::Expanded, Region::Header)
        );
        self.drag = if draggable { DragState::Pending { origin: self.position } } else { DragState::Idle };
        Vec::new()
    }

    /// Pointer moved; `delta` is the cumulative displacement since the press.
    pub fn on_pointer_move(&mut self, delta: Point) -> Vec<Action> {
        let origin = match self.drag {
            DragState::Idle => return Vec::new(),
            DragState::Pending { origin } => {
                if !gesture::exceeds_threshold(delta, self.gesture.drag_threshold_px) {
                    return Vec::new();
                }
                self.drag = DragState::Dragging { origin };
                self.motion = None;
                origin
            }
            DragState::Dragging { origin } => origin,
        };

        self.live = Bounds::drag(self.viewport, self.size()).clamp(origin.offset(delta));
        vec![Action::RenderNeeded]
    }

    /// Pointer released. A drag snaps horizontally to the nearer edge and
    /// settles with a spring; a press that never became a drag does nothing
    /// here (the host reports it as a tap).
    pub fn on_pointer_up(&mut self, delta: Point, now_ms: u64) -> Vec<Action> {
        let (origin, flick) = match std::mem::take(&mut self.drag) {
            DragState::Dragging { origin } => (origin, false),
            // EDGE: a fast flick can release past the threshold with no move events.
            DragState::Pending { origin } if gesture::exceeds_threshold(delta, self.gesture.drag_threshold_px) => {
                (origin, true)
            }
            DragState::Pending { .. } | DragState::Idle => return Vec::new(),
        };

        let size = self.size();
        let rest = Bounds::rest(self.viewport, size);
        let end = origin.offset(delta);
        let target = Point::new(rest.snap_x(end.x, size.width, self.viewport.width), rest.clamp(end).y);

        if flick {
            self.live = Bounds::drag(self.viewport, size).clamp(end);
        }
        self.position = target;
        self.last_drag_end_ms = Some(now_ms);
        self.start_motion(target, SpringParams::from_friction_tension(RELEASE_SPRING_FRICTION, RELEASE_SPRING_TENSION));
        debug!(x = target.x, y = target.y, "feedback bubble: drag released");
        vec![Action::Animate { to: target }, Action::RenderNeeded]
    }

    /// Gesture taken away by the system: jump back to the committed position.
    pub fn on_pointer_cancel(&mut self) -> Vec<Action> {
        let was_dragging = self.drag.is_dragging();
        self.abort_drag();
        if was_dragging { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    fn abort_drag(&mut self) {
        if let DragState::Dragging { origin } = self.drag {
            self.position = origin;
            self.live = origin;
            self.motion = None;
        }
        self.drag = DragState::Idle;
    }

    fn start_motion(&mut self, target: Point, params: SpringParams) {
        let motion = PositionMotion::new(self.live, target, params);
        if motion.is_settled() {
            self.live = target;
            self.motion = None;
        } else {
            self.motion = Some(motion);
        }
    }

    // --- Frame clock ---

    /// Advance springs and the pulse by `dt_ms`.
    pub fn tick(&mut self, dt_ms: f64) -> Vec<Action> {
        let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
        let mut changed = false;

        if let Some(motion) = self.motion.as_mut() {
            self.live = motion.step(dt_ms);
            if motion.is_settled() {
                self.live = motion.target();
                self.motion = None;
            }
            changed = true;
        }

        if self.is_pulsing() {
            self.pulse_elapsed_ms += dt_ms;
            changed = true;
        } else {
            self.pulse_elapsed_ms = 0.0;
        }

        if changed { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    // --- Note entry ---

    /// Replace the text in a section's entry field.
    pub fn set_input(&mut self, section: NoteSection, text: &str) {
        text.clone_into(self.inputs.get_mut(section));
    }

    /// Add the section's entry field as a note and clear the field.
    pub fn submit_input(&mut self, section: NoteSection) -> Vec<Action> {
        let text = self.inputs.get(section).to_owned();
        let actions = self.add_note(section, &text);
        if !actions.is_empty() {
            self.inputs.get_mut(section).clear();
        }
        actions
    }

    /// Append a trimmed note. Blank text is ignored.
    pub fn add_note(&mut self, section: NoteSection, text: &str) -> Vec<Action> {
        let text = text.trim();
        if self.client.is_none() || text.is_empty() {
            return Vec::new();
        }
        let draft = &self.draft;
        let id = self.ids.next(|candidate| draft.contains(section, candidate));
        self.draft.push(section, id, text.to_owned());
        self.persist()
    }

    /// Attach a highlight produced by another capture flow (e.g. an
    /// annotated progress photo). A highlight whose id is already present
    /// is ignored.
    pub fn add_media_highlight(&mut self, mut highlight: Highlight) -> Vec<Action> {
        let trimmed = highlight.text.trim();
        if self.client.is_none() || trimmed.is_empty() {
            return Vec::new();
        }
        highlight.text = trimmed.to_owned();
        if highlight.id.as_str().is_empty() {
            let draft = &self.draft;
            highlight.id = self.ids.next(|candidate| draft.contains(NoteSection::Highlights, candidate));
        } else if self.draft.contains(NoteSection::Highlights, &highlight.id) {
            return Vec::new();
        }
        self.draft.highlights.push(highlight);
        self.persist()
    }

    /// Remove a note. Unknown ids are a no-op.
    pub fn remove_note(&mut self, section: NoteSection, id: &NoteId) -> Vec<Action> {
        if !self.draft.remove(section, id) {
            return Vec::new();
        }
        self.persist()
    }

    pub fn set_status(&mut self, status: TrafficLight) -> Vec<Action> {
        if self.client.is_none() || self.draft.status == status {
            return Vec::new();
        }
        self.draft.status = status;
        if self.draft.is_empty() {
            return vec![Action::RenderNeeded];
        }
        self.persist()
    }

    /// Save the draft, or delete the stored copy once nothing is left in it.
    fn persist(&self) -> Vec<Action> {
        let Some(client) = &self.client else {
            return Vec::new();
        };
        let write = if self.draft.is_empty() {
            Action::DeleteDraft { client_id: client.id.clone() }
        } else {
            Action::SaveDraft { client_id: client.id.clone(), draft: self.draft.clone() }
        };
        vec![write, Action::RenderNeeded]
    }

    /// Throw the draft away, stored copy included.
    pub fn clear(&mut self) -> Vec<Action> {
        let Some(client_id) = self.client.as_ref().map(|c| c.id.clone()) else {
            return Vec::new();
        };
        self.reset_draft(&client_id);
        vec![Action::DeleteDraft { client_id }, Action::RenderNeeded]
    }

    fn reset_draft(&mut self, client_id: &str) {
        self.draft = Draft::new(client_id);
        self.inputs = NoteInputs::default();
        self.notice = None;
        self.pulse_elapsed_ms = 0.0;
    }

    // --- Handoff ---

    /// Build the handoff request. An empty draft raises the `EmptyDraft`
    /// notice instead.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveClient` when unbound and `EmptyDraft` when there is
    /// nothing to send.
    pub fn compose(&mut self) -> Result<HandoffRequest, ComposeError> {
        let Some(client) = &self.client else {
            return Err(ComposeError::NoActiveClient);
        };
        if self.draft.is_empty() {
            self.notice = Some(Notice::EmptyDraft);
            return Err(ComposeError::EmptyDraft);
        }
        Ok(HandoffRequest { client_id: client.id.clone(), payload: HandoffPayload::from_draft(&self.draft) })
    }

    /// The target accepted the handoff: drop the draft and fold the panel.
    /// If another client became active meanwhile, only the sent client's
    /// stored draft is removed.
    pub fn complete_handoff(&mut self, client_id: &str) -> Vec<Action> {
        if self.client.as_ref().map(|c| c.id.as_str()) != Some(client_id) {
            return vec![Action::DeleteDraft { client_id: client_id.to_owned() }];
        }
        self.abort_drag();
        self.expanded = false;
        self.reset_draft(client_id);
        vec![Action::DeleteDraft { client_id: client_id.to_owned() }, Action::RenderNeeded]
    }

    pub fn dismiss_notice(&mut self) -> Vec<Action> {
        if self.notice.take().is_some() { vec![Action::RenderNeeded] } else { Vec::new() }
    }
}
