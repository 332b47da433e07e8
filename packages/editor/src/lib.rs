//! # Pagecraft Editor
//!
//! Core document editing engine for the Pagecraft page builder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ gesture: pointer events → intents           │
//! │  - drag / pinch / tap / long press          │
//! │  - per-pointer state machine + timers       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ session: composition root                   │
//! │  - intents → mutation requests              │
//! │  - selection, context menu requests         │
//! │  - notifies the rendering layer             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ history: undo/redo + coalescing             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: component tree + mutations        │
//! └─────────────────────────────────────────────┘
//!                     ↕
//! ┌─────────────────────────────────────────────┐
//! │ codec: components ↔ URL-safe share string   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Document is the source of truth**: rendering reads snapshots only
//! 2. **Every edit is undoable**: the session is the only writer, and it
//!    writes through history
//! 3. **Ids, not references**: gestures and mutations name components by id
//!    and tolerate them disappearing
//! 4. **Failures are local**: bad input or stale ids never end the session
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagecraft_editor::{EditorConfig, EditorSession};
//!
//! let mut session = EditorSession::new("tab-1", EditorConfig::default());
//!
//! let hero = session.add_component("hero", None, None)?;
//! session.add_component("button", Some(&hero), None)?;
//!
//! session.undo();
//! session.redo();
//!
//! let link = session.share_link()?;
//! let reopened = EditorSession::open_link("tab-2", &link, EditorConfig::default())?;
//! ```

mod catalog;
mod codec;
mod component;
mod config;
mod document;
mod errors;
mod gesture;
mod history;
mod id_generator;
mod mutations;
mod session;

pub use catalog::{Catalog, ComponentTemplate, TemplateBody};
pub use codec::{decode, decode_document, encode};
pub use component::{Geometry, GeometryDelta, PlacedComponent, Properties};
pub use config::EditorConfig;
pub use document::{Change, Document, Patch};
pub use errors::{DocumentError, EditorError, MutationError};
pub use gesture::{
    GestureConfig, GestureMapper, Intent, Phase, Point, PointerEvent, PointerId, PointerKind,
};
pub use history::{History, HistoryEntry, MutationRequest, Outcome, Timestamp};
pub use id_generator::{session_seed, IdGenerator};
pub use mutations::Mutation;
pub use session::{ContextRequest, DocumentObserver, EditorSession};
