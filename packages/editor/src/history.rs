//! # Undo/Redo History
//!
//! Wraps the [`Document`] and records every successful mutation as an
//! invertible entry.
//!
//! ## Design
//!
//! - An entry stores the before/after snapshot of every component the
//!   mutation touched, so undo and redo are plain writes that cannot fail
//! - A failed mutation records nothing and leaves the document unchanged
//! - New entries clear the redo stack
//! - Requests carrying a coalescing key merge into the newest entry while it
//!   has the same key, is still open and was touched within the coalescing
//!   window. Pushing another entry, `seal()`, `undo()` and `redo()` all
//!   close the newest entry.
//! - The undo stack is bounded; the oldest entries are dropped first
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new(Document::new("session"));
//!
//! let request = MutationRequest::new(Mutation::add("button", None, None), now);
//! let outcome = history.apply(request)?;
//!
//! history.undo();
//! history.redo();
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use tracing::debug;

use crate::document::{Document, Patch};
use crate::errors::MutationError;
use crate::mutations::Mutation;

/// Monotonic time since an arbitrary origin (e.g. `performance.now()`)
pub type Timestamp = Duration;

pub const DEFAULT_MAX_DEPTH: usize = 100;
pub const DEFAULT_COALESCE_WINDOW: Duration = Duration::from_millis(1000);

/// A mutation plus the metadata history needs to record it
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub mutation: Mutation,

    /// Requests with equal keys may merge into one undo step
    pub coalesce_key: Option<String>,

    pub at: Timestamp,
}

impl MutationRequest {
    pub fn new(mutation: Mutation, at: Timestamp) -> Self {
        Self {
            mutation,
            coalesce_key: None,
            at,
        }
    }

    pub fn coalescing(mut self, key: impl Into<String>) -> Self {
        self.coalesce_key = Some(key.into());
        self
    }
}

/// One undoable step
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Name of the first mutation in this entry
    pub label: &'static str,
    pub coalesce_key: Option<String>,
    pub patch: Patch,
    /// Number of requests folded into this entry
    pub steps: usize,
    touched: Timestamp,
    open: bool,
}

impl HistoryEntry {
    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// What a successful [`History::apply`] did
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Id assigned by an `AddComponent`
    pub created: Option<String>,

    /// Merged into the previous entry instead of pushing a new one
    pub coalesced: bool,

    /// False when the mutation changed nothing and no entry was touched
    pub recorded: bool,
}

/// Document plus its undo (`past`) and redo (`future`) stacks
#[derive(Debug)]
pub struct History {
    document: Document,
    past: VecDeque<HistoryEntry>,
    future: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_depth: usize,

    coalesce_window: Duration,
}

impl History {
    /// Create a history with the default depth (100) and window (1s)
    pub fn new(document: Document) -> Self {
        Self::with_limits(document, DEFAULT_MAX_DEPTH, DEFAULT_COALESCE_WINDOW)
    }

    pub fn with_limits(document: Document, max_depth: usize, coalesce_window: Duration) -> Self {
        Self {
            document,
            past: VecDeque::new(),
            future: Vec::new(),
            max_depth,
            coalesce_window,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Apply a mutation and record it for undo
    pub fn apply(&mut self, request: MutationRequest) -> Result<Outcome, MutationError> {
        let label = request.mutation.name();
        let applied = self.document.apply(&request.mutation)?;

        if applied.patch.is_noop() {
            debug!(mutation = label, "mutation changed nothing; not recorded");
            return Ok(Outcome {
                created: applied.created,
                coalesced: false,
                recorded: false,
            });
        }

        if self.can_coalesce(&request) {
            if let Some(top) = self.past.back_mut() {
                top.patch.merge(applied.patch);
                top.touched = request.at;
                top.steps += 1;
                debug!(mutation = label, key = ?top.coalesce_key, steps = top.steps, "coalesced");
                return Ok(Outcome {
                    created: applied.created,
                    coalesced: true,
                    recorded: true,
                });
            }
        }

        self.push(HistoryEntry {
            label,
            coalesce_key: request.coalesce_key,
            patch: applied.patch,
            steps: 1,
            touched: request.at,
            open: true,
        });
        debug!(mutation = label, depth = self.past.len(), "recorded");

        Ok(Outcome {
            created: applied.created,
            coalesced: false,
            recorded: true,
        })
    }

    fn can_coalesce(&self, request: &MutationRequest) -> bool {
        let (Some(key), Some(top)) = (&request.coalesce_key, self.past.back()) else {
            return false;
        };
        top.open
            && top.coalesce_key.as_ref() == Some(key)
            && request.at.saturating_sub(top.touched) <= self.coalesce_window
    }

    fn push(&mut self, entry: HistoryEntry) {
        self.seal();
        self.past.push_back(entry);

        // Trim if exceeded max depth
        if self.max_depth > 0 {
            while self.past.len() > self.max_depth {
                self.past.pop_front();
            }
        }

        // New action invalidates the future
        self.future.clear();
    }

    /// Close the newest entry so nothing else merges into it
    pub fn seal(&mut self) {
        if let Some(top) = self.past.back_mut() {
            top.open = false;
        }
    }

    /// Undo the most recent entry. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(mut entry) = self.past.pop_back() else {
            return false;
        };

        self.document.write_inverse(&entry.patch);
        entry.open = false;
        debug!(label = entry.label, steps = entry.steps, "undo");
        self.future.push(entry);
        self.seal();
        true
    }

    /// Redo the most recently undone entry. Returns false if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.future.pop() else {
            return false;
        };

        self.document.write_forward(&entry.patch);
        debug!(label = entry.label, steps = entry.steps, "redo");
        self.seal();
        self.past.push_back(entry);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.past.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.future.len()
    }

    /// Label of the entry `undo()` would revert
    pub fn undo_label(&self) -> Option<&'static str> {
        self.past.back().map(|entry| entry.label)
    }

    /// Label of the entry `redo()` would reapply
    pub fn redo_label(&self) -> Option<&'static str> {
        self.future.last().map(|entry| entry.label)
    }

    /// Undo entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.past.iter()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Drop all undo/redo history, keeping the document as it is
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}
