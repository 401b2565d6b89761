//! LiveML sessions and playgrounds as a WASM module for browser pages.
//!
//! This crate exposes the playground pipeline via `wasm-bindgen`. Results
//! cross the boundary as JSON strings, or as plain JS objects through the
//! `*Value` variants.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { LiveSession } from 'liveml-wasm';
//!
//! await init();
//!
//! const session = new LiveSession();
//! session.execute("let x = 6 * 7;", "reason");
//! console.log(JSON.parse(session.execute("x + 1;", "reason")));
//! // { success: true, outputs: [{ value: "43", stdout: "", stderr: "" }], error: null }
//!
//! const block = session.playground("draw(circle(10.));", "reason", "edit canvas");
//! console.log(block.displayValue().canvas.graphics[0]); // "<svg ..."
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use liveml_eval::{Session, SessionConfig, SessionError, UnitOutput};
use liveml_playground::{Flags, Playground};
use liveml_transform::TransformError;
use liveml_types::{Diagnostics, Syntax};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Call depth allowed in the browser, whose main-thread stack is far
/// smaller than a native worker's.
pub const BROWSER_MAX_CALL_DEPTH: usize = 1_000;

// ══════════════════════════════════════════════════════════════════════════════
// Results
// ══════════════════════════════════════════════════════════════════════════════

/// Why a request produced no outputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct Failure {
    /// `syntax`, `conversion`, `session` or `argument`.
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<Diagnostics>,
}

impl Failure {
    fn argument(message: impl ToString) -> Self {
        Self {
            kind: "argument",
            message: message.to_string(),
            diagnostics: None,
        }
    }

    fn transform(error: &TransformError) -> Self {
        Self {
            kind: if error.is_syntax() { "syntax" } else { "conversion" },
            message: error.to_string(),
            diagnostics: Some(error.diagnostics()),
        }
    }

    fn session(error: &SessionError) -> Self {
        match error {
            SessionError::Syntax(errors) => Self {
                kind: "conversion",
                message: error.to_string(),
                diagnostics: Some(errors.clone()),
            },
            SessionError::Unavailable(_) => Self {
                kind: "session",
                message: error.to_string(),
                diagnostics: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ExecuteResult {
    success: bool,
    outputs: Vec<UnitOutput>,
    error: Option<Failure>,
}

impl ExecuteResult {
    fn failed(error: Failure) -> Self {
        Self {
            success: false,
            outputs: Vec::new(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ConvertResult {
    success: bool,
    text: Option<String>,
    error: Option<Failure>,
}

impl From<Result<String, Failure>> for ConvertResult {
    fn from(result: Result<String, Failure>) -> Self {
        match result {
            Ok(text) => Self {
                success: true,
                text: Some(text),
                error: None,
            },
            Err(error) => Self {
                success: false,
                text: None,
                error: Some(error),
            },
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        format!(
            r#"{{"success":false,"error":{{"kind":"internal","message":"Serialization error: {}"}}}}"#,
            e
        )
    })
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(JsValue::from)
}

fn parse_syntax(tag: &str) -> Result<Syntax, Failure> {
    tag.parse::<Syntax>().map_err(Failure::argument)
}

// ══════════════════════════════════════════════════════════════════════════════
// Configuration
// ══════════════════════════════════════════════════════════════════════════════

/// Browser overrides. The wall-clock timeout is not configurable: there
/// is no monotonic clock to poll.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BrowserConfig {
    gas_limit: Option<u64>,
    max_call_depth: Option<usize>,
}

fn browser_config() -> SessionConfig {
    SessionConfig {
        max_call_depth: BROWSER_MAX_CALL_DEPTH,
        timeout_ms: None,
        ..SessionConfig::default()
    }
}

fn parse_config(json: &str) -> Result<SessionConfig, String> {
    let overrides: BrowserConfig =
        serde_json::from_str(json).map_err(|e| format!("invalid session configuration: {e}"))?;
    let mut config = browser_config();
    if let Some(gas) = overrides.gas_limit {
        config.gas_limit = gas;
    }
    if let Some(depth) = overrides.max_call_depth {
        config.max_call_depth = depth;
    }
    Ok(config)
}

// ══════════════════════════════════════════════════════════════════════════════
// LiveSession
// ══════════════════════════════════════════════════════════════════════════════

/// A persistent session. Playgrounds created from it share its bindings.
#[wasm_bindgen]
pub struct LiveSession {
    session: Rc<RefCell<Session>>,
}

impl Default for LiveSession {
    fn default() -> Self {
        Self::from_config(browser_config())
    }
}

impl LiveSession {
    fn from_config(config: SessionConfig) -> Self {
        Self {
            session: Rc::new(RefCell::new(Session::new(config))),
        }
    }

    fn run(&self, source: &str, syntax: &str) -> ExecuteResult {
        let syntax = match parse_syntax(syntax) {
            Ok(syntax) => syntax,
            Err(failure) => return ExecuteResult::failed(failure),
        };
        let canonical = match liveml_transform::to_canonical(source, syntax) {
            Ok(canonical) => canonical,
            Err(e) => return ExecuteResult::failed(Failure::transform(&e)),
        };
        match self.session.borrow_mut().execute_as(&canonical, syntax) {
            Ok(outputs) => ExecuteResult {
                success: true,
                outputs,
                error: None,
            },
            Err(e) => ExecuteResult::failed(Failure::session(&e)),
        }
    }

    fn mount(&self, code: &str, syntax: &str, metastring: &str) -> Result<LivePlayground, Failure> {
        let syntax = parse_syntax(syntax)?;
        Ok(LivePlayground {
            inner: Playground::mount(self.session.clone(), code, syntax, Flags::parse(metastring)),
        })
    }
}

#[wasm_bindgen]
impl LiveSession {
    /// A session with the standard prelude and browser limits.
    #[wasm_bindgen(constructor)]
    pub fn new() -> LiveSession {
        Self::default()
    }

    /// A session with limits from a JSON object such as
    /// `{"gas_limit": 1000000, "max_call_depth": 500}`.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config_json: &str) -> Result<LiveSession, JsValue> {
        parse_config(config_json)
            .map(Self::from_config)
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = isAvailable)]
    pub fn is_available(&self) -> bool {
        self.session.borrow().is_available()
    }

    /// Return to the prelude baseline.
    ///
    /// Returns `{"success": bool, "error": ...}` as JSON.
    pub fn reset(&self) -> String {
        let result = match self.session.borrow_mut().reset() {
            Ok(()) => ConvertResult {
                success: true,
                text: None,
                error: None,
            },
            Err(e) => ConvertResult {
                success: false,
                text: None,
                error: Some(Failure::session(&e)),
            },
        };
        to_json(&result)
    }

    /// Run `source`, written in `syntax` (`"ml"` or `"reason"`).
    ///
    /// Returns an `ExecuteResult` as JSON:
    /// ```json
    /// { "success": true, "outputs": [{ "value": "43", "stdout": "", "stderr": "" }], "error": null }
    /// ```
    /// When nothing ran, `success` is `false` and `error` says why, with
    /// structured diagnostics for syntax and conversion errors.
    pub fn execute(&self, source: &str, syntax: &str) -> String {
        to_json(&self.run(source, syntax))
    }

    /// Like [`execute`](Self::execute), returning a JS object.
    #[wasm_bindgen(js_name = executeValue)]
    pub fn execute_value(&self, source: &str, syntax: &str) -> Result<JsValue, JsValue> {
        to_js(&self.run(source, syntax))
    }

    /// Mount a code block on this session.
    pub fn playground(
        &self,
        code: &str,
        syntax: &str,
        metastring: &str,
    ) -> Result<LivePlayground, JsValue> {
        self.mount(code, syntax, metastring)
            .map_err(|e| JsValue::from_str(&e.message))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// LivePlayground
// ══════════════════════════════════════════════════════════════════════════════

/// One live code block. Every method that changes it returns the new
/// display as JSON.
#[wasm_bindgen]
pub struct LivePlayground {
    inner: Playground<Rc<RefCell<Session>>>,
}

#[wasm_bindgen]
impl LivePlayground {
    /// Mount a code block on a session of its own.
    #[wasm_bindgen(constructor)]
    pub fn new(code: &str, syntax: &str, metastring: &str) -> Result<LivePlayground, JsValue> {
        LiveSession::default().playground(code, syntax, metastring)
    }

    /// Replace the draft without running it. Returns `false` for
    /// read-only blocks.
    pub fn edit(&mut self, text: &str) -> bool {
        self.inner.edit(text)
    }

    pub fn execute(&mut self) -> String {
        self.inner.execute();
        self.display()
    }

    pub fn reset(&mut self) -> String {
        self.inner.reset();
        self.display()
    }

    /// The current `Display` as JSON.
    pub fn display(&self) -> String {
        to_json(&self.inner.display())
    }

    #[wasm_bindgen(js_name = displayValue)]
    pub fn display_value(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.display())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Conversion
// ══════════════════════════════════════════════════════════════════════════════

/// Convert a snippet to canonical ML.
///
/// Returns `{"success": bool, "text": string | null, "error": ...}` as JSON.
#[wasm_bindgen(js_name = toCanonical)]
pub fn to_canonical(source: &str, syntax: &str) -> String {
    let result = parse_syntax(syntax).and_then(|syntax| {
        liveml_transform::to_canonical(source, syntax).map_err(|e| Failure::transform(&e))
    });
    to_json(&ConvertResult::from(result))
}

/// Convert canonical ML to `syntax`, in the same JSON shape as
/// [`to_canonical`].
#[wasm_bindgen(js_name = toSurface)]
pub fn to_surface(canonical: &str, syntax: &str) -> String {
    let result = parse_syntax(syntax).and_then(|syntax| {
        liveml_transform::to_surface(canonical, syntax).map_err(|e| Failure::transform(&e))
    });
    to_json(&ConvertResult::from(result))
}

/// Return the package version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn json(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_execute_json() {
        let session = LiveSession::new();
        session.execute("let x = 6 * 7;", "reason");
        let result = json(&session.execute("x + 1;", "reason"));
        assert_eq!(result["success"], true);
        assert_eq!(result["outputs"][0]["value"], "43");
        assert!(result["error"].is_null());
    }

    #[test]
    fn test_execute_syntax_error() {
        let session = LiveSession::new();
        let result = json(&session.execute("let x = ;", "reason"));
        assert_eq!(result["success"], false);
        assert_eq!(result["error"]["kind"], "syntax");
        assert!(result["error"]["diagnostics"]["total_errors"].as_u64().unwrap() >= 1);
    }

    #[test]
    fn test_unknown_syntax() {
        let result = json(&LiveSession::new().execute("1", "js"));
        assert_eq!(result["error"]["kind"], "argument");
        let result = json(&to_canonical("1", "js"));
        assert_eq!(result["success"], false);
    }

    #[test]
    fn test_browser_limits() {
        let config = parse_config(r#"{"gas_limit": 5}"#).unwrap();
        assert_eq!(config.gas_limit, 5);
        assert_eq!(config.max_call_depth, BROWSER_MAX_CALL_DEPTH);
        assert_eq!(config.timeout_ms, None);
        assert!(parse_config("[").is_err());
    }

    #[test]
    fn test_playgrounds_share_session() {
        let session = LiveSession::new();
        session.mount("let r = 3;", "reason", "demo").unwrap();
        let block = session.mount("r * r;", "reason", "demo").unwrap();
        let display = json(&block.display());
        assert_eq!(display["blocks"][0]["kind"], "echo");
        assert_eq!(display["blocks"][0]["text"], "9");
    }

    #[test]
    fn test_playground_reset() {
        let session = LiveSession::new();
        let mut block = session.mount("let y = 1;", "reason", "edit").unwrap();
        assert!(block.edit("y + 1;"));
        let display = json(&block.execute());
        assert_eq!(display["blocks"][0]["text"], "2");
        let display = json(&block.reset());
        assert_eq!(display["editor"], "let y = 1;");
        assert_eq!(display["blocks"], Value::Array(vec![]));
    }

    #[test]
    fn test_conversion_round_trip() {
        let ml = json(&to_canonical("let f = (x) => x + 1;", "reason"));
        assert_eq!(ml["success"], true);
        let canonical = ml["text"].as_str().unwrap();
        let reason = json(&to_surface(canonical, "reason"));
        let again = json(&to_canonical(reason["text"].as_str().unwrap(), "reason"));
        assert_eq!(again["text"], ml["text"]);
    }

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
