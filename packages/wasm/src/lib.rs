use std::time::Duration;

use pagecraft_editor::{
    decode, encode, EditorConfig, EditorSession, Intent, Mutation, PlacedComponent, Point,
    PointerEvent,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_error("Serialization error", e))
}

/// `performance.now()` style milliseconds to an editor timestamp
fn timestamp(time_ms: f64) -> Duration {
    Duration::try_from_secs_f64(time_ms / 1000.0).unwrap_or_default()
}

/// Encode a JSON array of placed components as a share code
#[wasm_bindgen(js_name = encodeComponents)]
pub fn encode_components_js(components_json: &str) -> Result<String, JsValue> {
    let components: Vec<PlacedComponent> = serde_json::from_str(components_json)
        .map_err(|e| js_error("Invalid components", e))?;

    encode(&components).map_err(|e| js_error("Encode error", e))
}

/// Decode a share code to a JSON array of placed components
#[wasm_bindgen(js_name = decodeShare)]
pub fn decode_share_js(code: &str) -> Option<String> {
    decode(code).and_then(|components| serde_json::to_string(&components).ok())
}

/// An editing session hosted by the page
#[wasm_bindgen]
pub struct WasmEditor {
    session: EditorSession,
}

#[wasm_bindgen]
impl WasmEditor {
    #[wasm_bindgen(constructor)]
    pub fn new(session_id: &str) -> WasmEditor {
        WasmEditor {
            session: EditorSession::new(session_id, EditorConfig::default()),
        }
    }

    /// Open a share code, starting empty if it cannot be read
    #[wasm_bindgen(js_name = openLink)]
    pub fn open_link(session_id: &str, code: &str) -> WasmEditor {
        WasmEditor {
            session: EditorSession::open_link_or_empty(session_id, code, EditorConfig::default()),
        }
    }

    /// Apply a JSON mutation; returns the new component id for adds
    pub fn apply(&mut self, mutation_json: &str) -> Result<Option<String>, JsValue> {
        let mutation: Mutation =
            serde_json::from_str(mutation_json).map_err(|e| js_error("Invalid mutation", e))?;

        let outcome = self
            .session
            .apply(mutation)
            .map_err(|e| js_error("Mutation failed", e))?;
        Ok(outcome.created)
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    pub fn revision(&self) -> u64 {
        self.session.revision()
    }

    pub fn selection(&self) -> Option<String> {
        self.session.selection().map(str::to_string)
    }

    /// Pending context-menu request as JSON, cleared once taken
    #[wasm_bindgen(js_name = takeContextRequest)]
    pub fn take_context_request(&mut self) -> Result<Option<String>, JsValue> {
        self.session
            .take_context_request()
            .map(|request| to_json(&request))
            .transpose()
    }

    // Pointer input; each returns the produced intents as a JSON array

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(
        &mut self,
        pointer_id: u32,
        x: f64,
        y: f64,
        target: Option<String>,
        time_ms: f64,
    ) -> Result<String, JsValue> {
        let event = PointerEvent::down(
            pointer_id,
            Point::new(x, y),
            target.as_deref(),
            timestamp(time_ms),
        );
        self.pointer(&event)
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, pointer_id: u32, x: f64, y: f64, time_ms: f64) -> Result<String, JsValue> {
        self.pointer(&PointerEvent::moved(pointer_id, Point::new(x, y), timestamp(time_ms)))
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, pointer_id: u32, x: f64, y: f64, time_ms: f64) -> Result<String, JsValue> {
        self.pointer(&PointerEvent::up(pointer_id, Point::new(x, y), timestamp(time_ms)))
    }

    #[wasm_bindgen(js_name = pointerCancel)]
    pub fn pointer_cancel(&mut self, pointer_id: u32, time_ms: f64) -> Result<String, JsValue> {
        self.pointer(&PointerEvent::cancel(pointer_id, timestamp(time_ms)))
    }

    /// Drive long-press timers from `requestAnimationFrame`
    pub fn tick(&mut self, time_ms: f64) -> Result<String, JsValue> {
        let intents = self.session.tick(timestamp(time_ms));
        to_json::<[Intent]>(&intents)
    }

    /// Gestures ended by removing their target, as a JSON array
    #[wasm_bindgen(js_name = takeEndedGestures)]
    pub fn take_ended_gestures(&mut self) -> Result<String, JsValue> {
        let intents = self.session.take_ended_gestures();
        to_json::<[Intent]>(&intents)
    }

    /// Current components in canonical order, as JSON
    #[wasm_bindgen(js_name = documentJson)]
    pub fn document_json(&self) -> Result<String, JsValue> {
        to_json(&self.session.document().to_components())
    }

    #[wasm_bindgen(js_name = shareLink)]
    pub fn share_link(&self) -> Result<String, JsValue> {
        self.session
            .share_link()
            .map_err(|e| js_error("Encode error", e))
    }

    fn pointer(&mut self, event: &PointerEvent) -> Result<String, JsValue> {
        let intents = self.session.handle_pointer(event);
        to_json::<[Intent]>(&intents)
    }
}
