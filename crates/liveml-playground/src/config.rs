//! Playground configuration.

use std::time::Duration;

use liveml_eval::SessionConfig;
use liveml_types::Syntax;
use serde::{Deserialize, Serialize};

use crate::error::PlaygroundError;

/// Settings shared by every playground on a page.
///
/// All fields are optional in JSON; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    /// Syntax assumed for code blocks without a language tag.
    pub syntax: Syntax,
    pub session: SessionConfig,
    /// Stack reserved for the session worker thread. Deep recursion in
    /// user code runs on this stack, so it has to cover `max_call_depth`.
    pub worker_stack_bytes: usize,
    /// How long a caller waits for the worker before interrupting the
    /// running snippet. `None` waits indefinitely.
    pub reply_timeout_ms: Option<u64>,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            syntax: Syntax::Reason,
            session: SessionConfig::default(),
            worker_stack_bytes: 256 * 1024 * 1024,
            reply_timeout_ms: Some(10_000),
        }
    }
}

impl PlaygroundConfig {
    pub fn from_json(json: &str) -> Result<Self, PlaygroundError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout_ms.map(Duration::from_millis)
    }
}
