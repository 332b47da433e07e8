use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for an editing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo levels kept (0 = unlimited)
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,

    /// How long a keyed history entry stays open for merging
    #[serde(default = "default_coalesce_window_ms")]
    pub coalesce_window_ms: u64,

    /// Stationary press duration that counts as a long press
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,

    /// Pointer travel (px) before a press becomes a drag
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: f64,
}

fn default_history_depth() -> usize {
    100
}

fn default_coalesce_window_ms() -> u64 {
    1000
}

fn default_long_press_ms() -> u64 {
    500
}

fn default_drag_threshold() -> f64 {
    4.0
}

impl EditorConfig {
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }

    pub fn long_press_delay(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: default_history_depth(),
            coalesce_window_ms: default_coalesce_window_ms(),
            long_press_ms: default_long_press_ms(),
            drag_threshold: default_drag_threshold(),
        }
    }
}
