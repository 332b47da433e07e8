//! # Gesture Mapping
//!
//! [`GestureMapper`] turns raw pointer events into semantic [`Intent`]s
//! (drag, pinch, tap, long press). It never touches the document; the
//! editor session turns intents into mutation requests.
//!
//! ## State machine (per pointer)
//!
//! ```text
//!          down                 moved past dead zone
//!  Idle ─────────▶ Pressed ─────────────────────────▶ Dragging
//!                   │  │                                 │
//!                   │  │ second pointer down             │ second pointer down
//!                   │  └──────────────▶ Pinching ◀───────┘
//!                   │ long-press deadline elapsed
//!                   ▼
//!            LongPressArmed
//!
//!  any phase ── up / cancel ──▶ Released (session dropped)
//! ```
//!
//! ## Invariants
//!
//! 1. After an up or cancel, the pointer has no session and no pending
//!    long-press deadline.
//! 2. Tap and drag never both emit for the same press: once the dead zone
//!    is crossed the release produces `GestureEnded`, not `Tap`.
//! 3. A long press only fires from `Pressed`; any exit from `Pressed`
//!    clears the deadline first.
//! 4. Targets are component ids, re-resolved by the consumer on delivery.
//!
//! Deadlines are checked on [`GestureMapper::tick`] and before every event,
//! so a deadline that elapsed before an event arrived fires first.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EditorConfig;
use crate::history::Timestamp;

pub type PointerId = u32;

/// Pinch baselines closer than this are treated as a zero-length span
const MIN_PINCH_SPAN: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

/// Canvas-space position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn minus(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

// ---------------------------------------------------------------------------
// Events and intents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Cancel,
}

/// One raw pointer/touch event
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: PointerId,
    pub kind: PointerKind,
    pub position: Point,
    /// Component under the pointer at press time (only read on `Down`)
    pub target: Option<String>,
    pub at: Timestamp,
}

impl PointerEvent {
    pub fn down(pointer_id: PointerId, position: Point, target: Option<&str>, at: Timestamp) -> Self {
        Self {
            pointer_id,
            kind: PointerKind::Down,
            position,
            target: target.map(str::to_string),
            at,
        }
    }

    pub fn moved(pointer_id: PointerId, position: Point, at: Timestamp) -> Self {
        Self::bare(pointer_id, PointerKind::Move, position, at)
    }

    pub fn up(pointer_id: PointerId, position: Point, at: Timestamp) -> Self {
        Self::bare(pointer_id, PointerKind::Up, position, at)
    }

    pub fn cancel(pointer_id: PointerId, at: Timestamp) -> Self {
        Self::bare(pointer_id, PointerKind::Cancel, Point::ZERO, at)
    }

    fn bare(pointer_id: PointerId, kind: PointerKind, position: Point, at: Timestamp) -> Self {
        Self {
            pointer_id,
            kind,
            position,
            target: None,
            at,
        }
    }
}

/// Semantic result of pointer input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Intent {
    /// Move `target` by `delta` (incremental since the previous drag intent)
    Drag {
        gesture: u64,
        target: String,
        delta: Point,
    },
    /// Scale `target` by `scale` and shift it by `offset` (both incremental)
    Pinch {
        gesture: u64,
        target: String,
        scale: f64,
        offset: Point,
    },
    /// Press and release without movement; `None` = empty canvas
    Tap {
        target: Option<String>,
        position: Point,
    },
    /// Stationary press held past the long-press delay
    LongPress {
        target: Option<String>,
        position: Point,
    },
    /// A drag or pinch on `target` finished (released or canceled)
    GestureEnded { gesture: u64, target: String },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds and timeouts for gesture recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Duration before a stationary press fires a long press (default: 500ms).
    pub long_press_delay: Duration,
    /// Euclidean travel (px) before a press becomes a drag (default: 4.0).
    pub drag_threshold: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_press_delay: Duration::from_millis(500),
            drag_threshold: 4.0,
        }
    }
}

impl From<&EditorConfig> for GestureConfig {
    fn from(config: &EditorConfig) -> Self {
        Self {
            long_press_delay: config.long_press_delay(),
            drag_threshold: config.drag_threshold,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-pointer state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pressed,
    Dragging,
    Pinching,
    LongPressArmed,
    Released,
}

#[derive(Debug, Clone)]
struct GestureSession {
    gesture: u64,
    target: Option<String>,
    start: Point,
    last: Point,
    phase: Phase,
    /// Pending long-press timer
    deadline: Option<Timestamp>,
    /// Other pointer of a pinch
    partner: Option<PointerId>,
}

// ---------------------------------------------------------------------------
// GestureMapper
// ---------------------------------------------------------------------------

/// Per-pointer gesture state machines
#[derive(Debug)]
pub struct GestureMapper {
    config: GestureConfig,
    sessions: BTreeMap<PointerId, GestureSession>,
    next_gesture: u64,
}

impl GestureMapper {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            sessions: BTreeMap::new(),
            next_gesture: 0,
        }
    }

    /// Process a raw event, returning the intents it produced (in order).
    pub fn process(&mut self, event: &PointerEvent) -> Vec<Intent> {
        let mut out = Vec::new();
        self.fire_due(event.at, &mut out);

        match event.kind {
            PointerKind::Down => self.on_down(event, &mut out),
            PointerKind::Move => self.on_move(event.pointer_id, event.position, &mut out),
            PointerKind::Up => self.release(event.pointer_id, Some(event.position), &mut out),
            PointerKind::Cancel => self.release(event.pointer_id, None, &mut out),
        }

        out
    }

    /// Fire long-press deadlines that have elapsed by `now`.
    pub fn tick(&mut self, now: Timestamp) -> Vec<Intent> {
        let mut out = Vec::new();
        self.fire_due(now, &mut out);
        out
    }

    /// End every gesture aimed at `component_id` (e.g. it was deleted).
    pub fn cancel_target(&mut self, component_id: &str) -> Vec<Intent> {
        self.retain_targets(|target| target != component_id)
    }

    /// End every gesture whose target fails `keep`.
    pub fn retain_targets(&mut self, keep: impl Fn(&str) -> bool) -> Vec<Intent> {
        let doomed: Vec<PointerId> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.target.as_deref().is_some_and(|t| !keep(t)))
            .map(|(id, _)| *id)
            .collect();

        let mut out = Vec::new();
        for pointer in doomed {
            self.release(pointer, None, &mut out);
        }
        out
    }

    /// Cancel all active pointers (focus loss, navigation away).
    pub fn cancel_all(&mut self) -> Vec<Intent> {
        let pointers: Vec<PointerId> = self.sessions.keys().copied().collect();
        let mut out = Vec::new();
        for pointer in pointers {
            self.release(pointer, None, &mut out);
        }
        out
    }

    /// Current phase of `pointer` (`Idle` when it has no session).
    pub fn phase(&self, pointer: PointerId) -> Phase {
        self.sessions
            .get(&pointer)
            .map(|s| s.phase)
            .unwrap_or(Phase::Idle)
    }

    pub fn active_pointers(&self) -> usize {
        self.sessions.len()
    }

    /// Number of armed long-press timers.
    pub fn pending_timers(&self) -> usize {
        self.sessions.values().filter(|s| s.deadline.is_some()).count()
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    fn new_gesture(&mut self) -> u64 {
        self.next_gesture += 1;
        self.next_gesture
    }
}

// ---------------------------------------------------------------------------
// Internal event handlers
// ---------------------------------------------------------------------------

impl GestureMapper {
    fn fire_due(&mut self, now: Timestamp, out: &mut Vec<Intent>) {
        for session in self.sessions.values_mut() {
            let due = session.deadline.is_some_and(|deadline| deadline <= now);
            if due && session.phase == Phase::Pressed {
                session.deadline = None;
                session.phase = Phase::LongPressArmed;
                out.push(Intent::LongPress {
                    target: session.target.clone(),
                    position: session.start,
                });
            }
        }
    }

    fn on_down(&mut self, event: &PointerEvent, out: &mut Vec<Intent>) {
        let pointer = event.pointer_id;

        // A second down for the same pointer supersedes the stale session
        if self.sessions.contains_key(&pointer) {
            self.release(pointer, None, out);
        }

        let partner = self
            .sessions
            .iter()
            .find(|(_, s)| {
                s.partner.is_none() && matches!(s.phase, Phase::Pressed | Phase::Dragging)
            })
            .map(|(id, _)| *id);

        let gesture = self.new_gesture();
        let mut session = GestureSession {
            gesture,
            target: event.target.clone(),
            start: event.position,
            last: event.position,
            phase: Phase::Pressed,
            deadline: Some(event.at + self.config.long_press_delay),
            partner: None,
        };

        if let Some(partner_id) = partner {
            if let Some(other) = self.sessions.get_mut(&partner_id) {
                if other.phase == Phase::Dragging {
                    if let Some(target) = other.target.clone() {
                        out.push(Intent::GestureEnded {
                            gesture: other.gesture,
                            target,
                        });
                    }
                }

                let target = other.target.clone().or_else(|| session.target.clone());
                other.phase = Phase::Pinching;
                other.deadline = None;
                other.partner = Some(pointer);
                other.gesture = gesture;
                other.target = target.clone();

                session.phase = Phase::Pinching;
                session.deadline = None;
                session.partner = Some(partner_id);
                session.target = target;
            }
        }

        debug!(pointer, gesture, phase = ?session.phase, "pointer down");
        self.sessions.insert(pointer, session);
    }

    fn on_move(&mut self, pointer: PointerId, position: Point, out: &mut Vec<Intent>) {
        let partner_last = self
            .sessions
            .get(&pointer)
            .and_then(|s| s.partner)
            .and_then(|p| self.sessions.get(&p))
            .map(|p| p.last);
        let threshold = self.config.drag_threshold;

        let Some(session) = self.sessions.get_mut(&pointer) else {
            return;
        };

        match session.phase {
            Phase::Pressed => {
                if session.start.distance(position) > threshold {
                    session.phase = Phase::Dragging;
                    session.deadline = None;
                    let delta = position.minus(session.last);
                    session.last = position;
                    if let Some(target) = session.target.clone() {
                        out.push(Intent::Drag {
                            gesture: session.gesture,
                            target,
                            delta,
                        });
                    }
                }
            }
            Phase::Dragging => {
                let delta = position.minus(session.last);
                session.last = position;
                if delta != Point::ZERO {
                    if let Some(target) = session.target.clone() {
                        out.push(Intent::Drag {
                            gesture: session.gesture,
                            target,
                            delta,
                        });
                    }
                }
            }
            Phase::Pinching => {
                let Some(anchor) = partner_last else {
                    session.last = position;
                    return;
                };
                let before = session.last.distance(anchor);
                let after = position.distance(anchor);
                let scale = if before > MIN_PINCH_SPAN {
                    after / before
                } else {
                    1.0
                };
                let offset = position.midpoint(anchor).minus(session.last.midpoint(anchor));
                session.last = position;

                if let Some(target) = session.target.clone() {
                    out.push(Intent::Pinch {
                        gesture: session.gesture,
                        target,
                        scale,
                        offset,
                    });
                }
            }
            Phase::LongPressArmed | Phase::Idle | Phase::Released => {}
        }
    }

    /// Drop the session for `pointer`. `position` is `Some` for a real
    /// release and `None` for a cancel.
    fn release(&mut self, pointer: PointerId, position: Option<Point>, out: &mut Vec<Intent>) {
        let Some(mut session) = self.sessions.remove(&pointer) else {
            return;
        };
        session.deadline = None;

        match session.phase {
            Phase::Pressed => {
                if let Some(position) = position {
                    out.push(Intent::Tap {
                        target: session.target.clone(),
                        position,
                    });
                }
            }
            Phase::Dragging => {
                if let Some(target) = session.target.clone() {
                    out.push(Intent::GestureEnded {
                        gesture: session.gesture,
                        target,
                    });
                }
            }
            Phase::Pinching => {
                if let Some(target) = session.target.clone() {
                    out.push(Intent::GestureEnded {
                        gesture: session.gesture,
                        target,
                    });
                }
                // The remaining finger carries on as a fresh drag
                if let Some(partner_id) = session.partner {
                    let gesture = self.new_gesture();
                    if let Some(partner) = self.sessions.get_mut(&partner_id) {
                        partner.partner = None;
                        partner.phase = Phase::Dragging;
                        partner.gesture = gesture;
                    }
                }
            }
            Phase::LongPressArmed | Phase::Idle | Phase::Released => {}
        }

        let ended = session.phase;
        session.phase = Phase::Released;
        debug!(pointer, gesture = session.gesture, from = ?ended, canceled = position.is_none(), "pointer released");
    }
}

impl Default for GestureMapper {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
