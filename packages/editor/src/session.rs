//! # Editor Session
//!
//! Composition root for one editing session.
//!
//! An `EditorSession` exclusively owns the document history and the
//! gesture mapper for its lifetime. Everything that changes the document
//! goes through it: direct user actions via [`EditorSession::apply`] and
//! its helpers, pointer input via [`EditorSession::handle_pointer`] and
//! [`EditorSession::tick`]. The rendering layer only ever sees `&Document`.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::ComponentTemplate;
use crate::codec;
use crate::component::{Geometry, GeometryDelta, Properties};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::errors::EditorError;
use crate::gesture::{GestureConfig, GestureMapper, Intent, Point, PointerEvent};
use crate::history::{History, MutationRequest, Outcome, Timestamp};
use crate::mutations::Mutation;

/// Receives read-only snapshots after every successful change
pub trait DocumentObserver {
    fn document_changed(&mut self, document: &Document, revision: u64);
}

/// A long press asked the UI for a contextual menu
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextRequest {
    pub target: Option<String>,
    pub position: Point,
}

/// Single-user editing session
pub struct EditorSession {
    /// Session identifier, also the seed for new component ids
    pub id: String,

    config: EditorConfig,
    history: History,
    gestures: GestureMapper,
    selection: Option<String>,
    context: Option<ContextRequest>,

    /// Increments on every successful apply/undo/redo
    revision: u64,

    /// Latest timestamp seen from input
    clock: Timestamp,

    /// Gestures ended because their target disappeared, not yet reported
    ended: Vec<Intent>,

    observers: Vec<Box<dyn DocumentObserver>>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("id", &self.id)
            .field("components", &self.history.document().len())
            .field("revision", &self.revision)
            .field("selection", &self.selection)
            .field("active_pointers", &self.gestures.active_pointers())
            .finish()
    }
}

impl EditorSession {
    /// Start a session on an empty document
    pub fn new(id: impl Into<String>, config: EditorConfig) -> Self {
        let id = id.into();
        let document = Document::new(&id);
        Self::from_document(id, document, config)
    }

    /// Start a session on an existing document
    pub fn from_document(id: impl Into<String>, document: Document, config: EditorConfig) -> Self {
        let id = id.into();
        info!(session = %id, components = document.len(), "editor session opened");

        let history =
            History::with_limits(document, config.history_depth, config.coalesce_window());
        let gestures = GestureMapper::new(GestureConfig::from(&config));

        Self {
            id,
            config,
            history,
            gestures,
            selection: None,
            context: None,
            revision: 0,
            clock: Timestamp::ZERO,
            ended: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Start a session from a share string
    pub fn open_link(
        id: impl Into<String>,
        link: &str,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        let id = id.into();
        let document = codec::decode_document(&id, link)?;
        Ok(Self::from_document(id, document, config))
    }

    /// Start a session from a share string, falling back to an empty document
    pub fn open_link_or_empty(id: impl Into<String>, link: &str, config: EditorConfig) -> Self {
        let id = id.into();
        match codec::decode_document(&id, link) {
            Ok(document) => Self::from_document(id, document, config),
            Err(err) => {
                warn!(error = %err, "shared document unreadable; starting empty");
                Self::new(id, config)
            }
        }
    }

    /// Tear the session down, returning the final document
    pub fn close(mut self) -> Document {
        self.gestures.cancel_all();
        info!(session = %self.id, revision = self.revision, "editor session closed");
        self.history.into_document()
    }

    pub fn document(&self) -> &Document {
        self.history.document()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn gestures(&self) -> &GestureMapper {
        &self.gestures
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn context_request(&self) -> Option<&ContextRequest> {
        self.context.as_ref()
    }

    /// Hand the pending context request to the UI
    pub fn take_context_request(&mut self) -> Option<ContextRequest> {
        self.context.take()
    }

    pub fn subscribe(&mut self, observer: Box<dyn DocumentObserver>) {
        self.observers.push(observer);
    }

    /// Select a component (ignored if it does not exist) or clear selection
    pub fn select(&mut self, id: Option<&str>) {
        self.selection = id
            .filter(|id| self.history.document().contains(id))
            .map(str::to_string);
    }

    // -----------------------------------------------------------------------
    // Direct user actions
    // -----------------------------------------------------------------------

    /// Apply a mutation as one undoable step
    pub fn apply(&mut self, mutation: Mutation) -> Result<Outcome, EditorError> {
        let outcome = self
            .history
            .apply(MutationRequest::new(mutation, self.clock))?;
        if outcome.recorded {
            self.after_change();
        }
        Ok(outcome)
    }

    pub fn add_component(
        &mut self,
        component_type: &str,
        parent_id: Option<&str>,
        index: Option<usize>,
    ) -> Result<String, EditorError> {
        let outcome = self.apply(Mutation::add(
            component_type,
            parent_id.map(str::to_string),
            index,
        ))?;
        // AddComponent always assigns an id
        Ok(outcome.created.unwrap_or_default())
    }

    /// Drop a palette template onto the canvas
    pub fn place_template(
        &mut self,
        template: &ComponentTemplate,
        parent_id: Option<&str>,
        index: Option<usize>,
    ) -> Result<String, EditorError> {
        let outcome = self.apply(template.instantiate(parent_id.map(str::to_string), index))?;
        Ok(outcome.created.unwrap_or_default())
    }

    pub fn remove_component(&mut self, id: &str) -> Result<(), EditorError> {
        self.apply(Mutation::RemoveComponent { id: id.to_string() })?;
        Ok(())
    }

    pub fn move_component(
        &mut self,
        id: &str,
        new_parent_id: Option<&str>,
        index: Option<usize>,
    ) -> Result<(), EditorError> {
        self.apply(Mutation::MoveComponent {
            id: id.to_string(),
            new_parent_id: new_parent_id.map(str::to_string),
            index,
        })?;
        Ok(())
    }

    pub fn reorder(&mut self, id: &str, index: usize) -> Result<(), EditorError> {
        self.apply(Mutation::Reorder {
            id: id.to_string(),
            index,
        })?;
        Ok(())
    }

    pub fn update_properties(&mut self, id: &str, patch: Properties) -> Result<(), EditorError> {
        self.apply(Mutation::UpdateProperties {
            id: id.to_string(),
            patch,
        })?;
        Ok(())
    }

    pub fn update_geometry(&mut self, id: &str, delta: GeometryDelta) -> Result<(), EditorError> {
        self.apply(Mutation::UpdateGeometry {
            id: id.to_string(),
            delta,
        })?;
        Ok(())
    }

    pub fn set_geometry(&mut self, id: &str, geometry: Geometry) -> Result<(), EditorError> {
        self.apply(Mutation::SetGeometry {
            id: id.to_string(),
            geometry,
        })?;
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo();
        if undone {
            self.after_change();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo();
        if redone {
            self.after_change();
        }
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Encode the current document for a share link
    pub fn share_link(&self) -> Result<String, EditorError> {
        codec::encode(&self.history.document().to_components())
    }

    // -----------------------------------------------------------------------
    // Pointer input
    // -----------------------------------------------------------------------

    /// Feed one raw pointer event; returns the intents it produced after
    /// they have been delivered, followed by any gestures that ended because
    /// their target was removed
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> Vec<Intent> {
        self.clock = self.clock.max(event.at);
        let intents = self.gestures.process(event);
        self.deliver(&intents);
        self.with_ended(intents)
    }

    /// Advance time so pending long presses can fire
    pub fn tick(&mut self, now: Timestamp) -> Vec<Intent> {
        self.clock = self.clock.max(now);
        let intents = self.gestures.tick(now);
        self.deliver(&intents);
        self.with_ended(intents)
    }

    /// `GestureEnded` intents for gestures canceled since the last pointer
    /// event or tick, e.g. by removing the dragged component
    pub fn take_ended_gestures(&mut self) -> Vec<Intent> {
        std::mem::take(&mut self.ended)
    }

    fn with_ended(&mut self, mut intents: Vec<Intent>) -> Vec<Intent> {
        intents.append(&mut self.ended);
        intents
    }

    fn deliver(&mut self, intents: &[Intent]) {
        for intent in intents {
            match intent {
                Intent::Drag {
                    gesture,
                    target,
                    delta,
                } => {
                    let mutation = Mutation::UpdateGeometry {
                        id: target.clone(),
                        delta: GeometryDelta::offset(delta.x, delta.y),
                    };
                    self.apply_gesture(mutation, format!("drag:{target}#{gesture}"));
                }

                Intent::Pinch {
                    gesture,
                    target,
                    scale,
                    offset,
                } => {
                    let Some(current) = self.history.document().get(target) else {
                        debug!(target = %target, "pinch on missing component dropped");
                        continue;
                    };
                    let geometry = current.geometry;
                    let delta = GeometryDelta {
                        dx: offset.x,
                        dy: offset.y,
                        dwidth: geometry.width * (scale - 1.0),
                        dheight: geometry.height * (scale - 1.0),
                    };
                    let mutation = Mutation::UpdateGeometry {
                        id: target.clone(),
                        delta,
                    };
                    self.apply_gesture(mutation, format!("pinch:{target}#{gesture}"));
                }

                Intent::Tap { target, .. } => {
                    self.context = None;
                    self.select(target.as_deref());
                }

                Intent::LongPress { target, position } => {
                    self.select(target.as_deref());
                    self.context = Some(ContextRequest {
                        target: self.selection.clone(),
                        position: *position,
                    });
                }

                Intent::GestureEnded { .. } => self.history.seal(),
            }
        }
    }

    /// Gesture mutations address components by id; a target that has since
    /// disappeared is dropped without error
    fn apply_gesture(&mut self, mutation: Mutation, key: String) {
        let request = MutationRequest::new(mutation, self.clock).coalescing(key);
        match self.history.apply(request) {
            Ok(outcome) if outcome.recorded => self.after_change(),
            Ok(_) => {}
            Err(err) => debug!(error = %err, "gesture intent dropped"),
        }
    }

    fn after_change(&mut self) {
        self.revision += 1;

        let document = self.history.document();
        let mut ended = self.gestures.retain_targets(|id| document.contains(id));
        if !ended.is_empty() {
            debug!(count = ended.len(), "gestures on removed components canceled");
            self.history.seal();
            self.ended.append(&mut ended);
        }

        let document = self.history.document();
        if self
            .selection
            .as_deref()
            .is_some_and(|id| !document.contains(id))
        {
            self.selection = None;
        }
        if self
            .context
            .as_ref()
            .and_then(|c| c.target.as_deref())
            .is_some_and(|id| !document.contains(id))
        {
            self.context = None;
        }

        for observer in &mut self.observers {
            observer.document_changed(document, self.revision);
        }
    }
}
