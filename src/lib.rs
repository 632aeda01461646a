//! Floating feedback bubble for a coaching app.
//!
//! A draggable handle that expands into a panel where a coach jots
//! highlights, analysis notes and action items for the client currently on
//! screen, picks a traffic-light status, and hands the finished report to
//! the message composer. Drafts persist per client across sessions. The
//! crate is headless: a view layer feeds it pointer events and frame ticks
//! and draws the [`widget::WidgetSnapshot`] it gets back.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`service`] | [`FeedbackBubble`], the async handle the view layer talks to |
//! | [`widget`] | Testable [`widget::WidgetCore`] state machine and its actions |
//! | [`draft`] | Draft model and the stored JSON codec |
//! | [`payload`] | Handoff payload sent to the composer |
//! | [`handoff`] | Handoff target trait and the channel implementation |
//! | [`store`] | Key-value store trait, memory and SQLite stores, draft writer |
//! | [`gesture`] | Press regions and the drag state machine |
//! | [`geometry`] | Points, sizes, viewport bounds and edge snapping |
//! | [`animation`] | Spring physics and the pulse curve |
//! | [`config`] | Environment-driven configuration |
//! | [`consts`] | Geometry, spring and pulse constants |

pub mod animation;
pub mod config;
pub mod consts;
pub mod draft;
pub mod geometry;
pub mod gesture;
pub mod handoff;
pub mod payload;
pub mod service;
pub mod store;
pub mod widget;

pub use config::BubbleConfig;
pub use draft::{Draft, Highlight, MediaRef, MediaType, NoteId, NoteSection, TrafficLight};
pub use handoff::{ChannelHandoff, ComposeNavigation, HandoffError, HandoffTarget};
pub use payload::{HandoffPayload, HandoffRequest};
pub use service::{FeedbackBubble, SendError};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreError};
pub use widget::{Action, Notice, WidgetSnapshot, WidgetState};
