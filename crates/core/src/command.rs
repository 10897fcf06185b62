//! Command descriptors for the browser control protocol.
//!
//! Each protocol method is its own variant carrying only the fields that
//! matter to it, rather than one flat bag of optional fields. Unknown
//! methods survive parsing as [`Command::Other`] so downstream policy code
//! (cacheability classification in particular) stays total.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// How an `extract` command reads data out of matched elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    #[default]
    Text,
    Html,
    Attribute,
    Property,
}

/// Element-state checks a `wait` command may poll for.
///
/// These are the only conditions whose outcome depends solely on the DOM,
/// which is what makes a `wait` result reusable at all. Script-based waits
/// are carried separately on the command and are never in this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitCondition {
    Visible,
    Hidden,
    Attached,
    Detached,
}

/// One command invocation against a browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Command {
    /// Full-page navigation to a URL.
    Navigate { url: String },
    /// Reload the current page.
    Reload,
    /// History navigation.
    Back,
    /// History navigation.
    Forward,
    /// Click the first element matching `selector`.
    Click { selector: String },
    /// Fill an input field with literal text.
    Fill { selector: String, text: String },
    /// Type literal text into the currently focused element.
    TypeText { text: String },
    /// Read data out of the page without mutating it.
    Extract {
        selector: String,
        #[serde(default)]
        mode: ExtractMode,
        /// Attribute or property name when `mode` requires one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Collect all matches instead of the first.
        #[serde(default)]
        multiple: bool,
        /// Trim whitespace from extracted text.
        #[serde(default)]
        trim: bool,
    },
    /// Wait for an element state, a script to become truthy, or a timeout.
    Wait {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<WaitCondition>,
        /// Custom JavaScript condition; its result may depend on
        /// non-deterministic page logic.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        script: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// A method this build does not recognize. Kept so every inbound
    /// message can still be represented and classified (fail closed).
    #[serde(skip)]
    Other { method: String, params: Value },
}

/// Methods the tagged decoder understands.
const KNOWN_METHODS: &[&str] = &[
    "navigate", "reload", "back", "forward", "click", "fill", "type_text", "extract", "wait",
];

impl Command {
    /// Parse a raw protocol message into a command.
    ///
    /// A recognized method with malformed parameters is a protocol error.
    /// An unrecognized method parses to [`Command::Other`] so the caller
    /// can still route it through classification and (attempted) execution.
    pub fn parse(value: &Value) -> Result<Self> {
        let method = value
            .get("method")
            .and_then(|m| m.as_str())
            .ok_or_else(|| Error::Protocol("command missing 'method' field".to_string()))?;

        if !KNOWN_METHODS.contains(&method) {
            return Ok(Command::Other {
                method: method.to_string(),
                params: value.clone(),
            });
        }

        serde_json::from_value(value.clone())
            .map_err(|e| Error::Protocol(format!("malformed '{}' command: {}", method, e)))
    }

    /// The protocol method name of this command.
    pub fn method(&self) -> &str {
        match self {
            Command::Navigate { .. } => "navigate",
            Command::Reload => "reload",
            Command::Back => "back",
            Command::Forward => "forward",
            Command::Click { .. } => "click",
            Command::Fill { .. } => "fill",
            Command::TypeText { .. } => "type_text",
            Command::Extract { .. } => "extract",
            Command::Wait { .. } => "wait",
            Command::Other { method, .. } => method,
        }
    }
}

/// The outcome of executing a command against the browser engine.
///
/// Callers hand this back to the cache after every execution; only the
/// `Success` variant is ever eligible for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandOutcome {
    Success {
        #[serde(default)]
        data: Value,
    },
    Failure { error: String },
}

impl CommandOutcome {
    pub fn success(data: Value) -> Self {
        Self::Success { data }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
