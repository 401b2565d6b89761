//! Persistent evaluation sessions.
//!
//! A [`Session`] owns the bindings accumulated by every snippet executed
//! since the last reset. Each top-level unit of a snippet runs on its own
//! budget and reports a `{value, stdout, stderr}` record; a faulting unit
//! does not stop the units after it.

use std::rc::Rc;
use std::time::Duration;

use liveml_types::{Diagnostics, SourceFile, Syntax};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::display::display_value;
use crate::env::Namespace;
use crate::error::EvalError;
use crate::evaluator::Evaluator;
use crate::limits::{CancelToken, Limits};
use crate::value::Value;

/// The baseline program every session starts from.
pub const PRELUDE: &str = include_str!("prelude.ml");

/// Resource bounds applied to every unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Evaluation steps allowed per unit.
    pub gas_limit: u64,
    /// Nested non-tail calls allowed per unit.
    pub max_call_depth: usize,
    /// Wall-clock budget per unit. Leave unset on browser targets.
    pub timeout_ms: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            gas_limit: limits.gas,
            max_call_depth: limits.max_depth,
            timeout_ms: None,
        }
    }
}

impl SessionConfig {
    pub fn limits(&self) -> Limits {
        Limits {
            gas: self.gas_limit,
            max_depth: self.max_call_depth,
            timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }
}

/// What one top-level unit produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOutput {
    /// The printed result, empty for definitions and `()`.
    pub value: String,
    pub stdout: String,
    /// Text printed to the error channel, followed by the unit's fault if
    /// it raised one.
    pub stderr: String,
}

impl UnitOutput {
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// Errors that prevent a snippet from running at all.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum SessionError {
    /// The snippet does not parse; nothing was executed.
    #[error("{0}")]
    Syntax(Diagnostics),

    /// The prelude failed, so there is no baseline to run against.
    #[error("Session unavailable: {0}")]
    Unavailable(String),
}

enum State {
    Ready(Rc<Namespace>),
    Unavailable(String),
}

pub struct Session {
    config: SessionConfig,
    prelude: String,
    evaluator: Evaluator,
    state: State,
    cancel: CancelToken,
}

impl Session {
    /// A session with the standard prelude.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_prelude(config, PRELUDE)
    }

    /// A session whose baseline is `prelude` instead of the standard one.
    ///
    /// If the prelude fails the session is created unavailable; see
    /// [`is_available`](Self::is_available).
    pub fn with_prelude(config: SessionConfig, prelude: impl Into<String>) -> Self {
        let cancel = CancelToken::new();
        let mut session = Self {
            config,
            prelude: prelude.into(),
            evaluator: Evaluator::new(config.limits(), cancel.clone()),
            state: State::Unavailable("session not initialised".into()),
            cancel,
        };
        // A failure is kept in `state` and reported by every execute.
        let _ = session.reset();
        info!(
            "session created (gas {}, depth {}, available: {})",
            config.gas_limit,
            config.max_call_depth,
            session.is_available()
        );
        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// A handle that interrupts whatever this session is running.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Drop every binding made since the prelude by rebuilding the
    /// environment and running the prelude again.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.cancel.reset();
        let mut ns = self.evaluator.base_namespace();
        match self.run_prelude(&mut ns) {
            Ok(()) => {
                debug!("session reset to prelude baseline");
                self.state = State::Ready(ns);
                Ok(())
            }
            Err(reason) => {
                error!("prelude failed, session unavailable: {reason}");
                self.state = State::Unavailable(reason.clone());
                Err(SessionError::Unavailable(reason))
            }
        }
    }

    fn run_prelude(&mut self, ns: &mut Rc<Namespace>) -> Result<(), String> {
        let file = SourceFile::new("prelude.ml", self.prelude.as_str());
        let parsed = liveml_parser::parse(&file, Syntax::Ml);
        let Some(program) = parsed.program else {
            return Err(format!("prelude does not parse: {}", parsed.errors));
        };
        for item in &program.items {
            self.evaluator.begin_unit();
            if let Err(fault) = self.evaluator.exec_item(ns, item) {
                return Err(format!("line {}: {fault}", item.span.start_line));
            }
        }
        self.evaluator.take_output();
        Ok(())
    }

    /// Run canonical text, printing values in canonical syntax.
    pub fn execute(&mut self, canonical: &str) -> Result<Vec<UnitOutput>, SessionError> {
        self.execute_as(canonical, Syntax::CANONICAL)
    }

    /// Run canonical text, printing values in `display` syntax.
    pub fn execute_as(
        &mut self,
        canonical: &str,
        display: Syntax,
    ) -> Result<Vec<UnitOutput>, SessionError> {
        let mut ns = match &self.state {
            State::Ready(ns) => ns.clone(),
            State::Unavailable(reason) => return Err(SessionError::Unavailable(reason.clone())),
        };
        let file = SourceFile::new("snippet.ml", canonical);
        let parsed = liveml_parser::parse(&file, Syntax::CANONICAL);
        let Some(program) = parsed.program else {
            debug!("snippet rejected with {} syntax error(s)", parsed.errors.total_errors);
            return Err(SessionError::Syntax(parsed.errors));
        };

        self.cancel.reset();
        let mut outputs = Vec::with_capacity(program.items.len());
        for (index, item) in program.items.iter().enumerate() {
            if self.cancel.is_cancelled() {
                outputs.push(UnitOutput {
                    stderr: EvalError::Cancelled.to_string(),
                    ..UnitOutput::default()
                });
                continue;
            }
            self.evaluator.begin_unit();
            let result = self.evaluator.exec_item(&mut ns, item);
            let (stdout, mut stderr) = self.evaluator.take_output();
            let value = match result {
                Ok(Some(Value::Unit)) | Ok(None) => String::new(),
                Ok(Some(value)) => display_value(&value, display),
                Err(fault) => {
                    debug!("unit {index} faulted: {fault}");
                    if !stderr.is_empty() && !stderr.ends_with('\n') {
                        stderr.push('\n');
                    }
                    stderr.push_str(&fault.to_string());
                    String::new()
                }
            };
            debug!(
                "unit {index} done ({} steps)",
                self.evaluator.gas_used()
            );
            outputs.push(UnitOutput {
                value,
                stdout,
                stderr,
            });
        }
        self.state = State::Ready(ns);
        Ok(outputs)
    }
}
