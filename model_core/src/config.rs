//! Model configuration.
//!
//! All toggles are explicit fields threaded into constructors; there is no
//! ambient global state.

use std::time::Duration;

/// Default delay for the coalesced render notification (in milliseconds).
const NOTIFY_DELAY_MS: u64 = 300;

/// Configuration for one code model session.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Align continuation lines to the column just after an open bracket
    /// instead of adding a flat indent level.
    pub vertical_alignment: bool,
    /// The string inserted per indent level.
    pub tab: String,
    /// Delay before a tokenize-ahead pass notifies the renderer.
    pub notify_delay: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            vertical_alignment: false,
            tab: "  ".to_string(),
            notify_delay: Duration::from_millis(NOTIFY_DELAY_MS),
        }
    }
}

impl ModelConfig {
    /// Convenience for tests and callers that only care about alignment.
    pub fn with_vertical_alignment(mut self, on: bool) -> Self {
        self.vertical_alignment = on;
        self
    }

    pub fn with_tab(mut self, tab: &str) -> Self {
        self.tab = tab.to_string();
        self
    }
}
