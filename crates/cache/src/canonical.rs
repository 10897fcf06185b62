//! Command canonicalization and hashing.
//!
//! Reduces a command to the fixed subset of fields that can change a
//! read-only result, serializes them with deterministic key order, and
//! digests. Timeouts and free-form parameters are deliberately excluded:
//! they change how long execution may take, never what it returns.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use pagepilot_core::{Command, ExtractMode, WaitCondition};

/// Truncated digest length in hex chars. Collisions only matter within
/// one process's cache lifetime, so a short hash is plenty; this is not
/// a security boundary.
const HASH_LEN: usize = 16;

fn mode_name(mode: ExtractMode) -> &'static str {
    match mode {
        ExtractMode::Text => "text",
        ExtractMode::Html => "html",
        ExtractMode::Attribute => "attribute",
        ExtractMode::Property => "property",
    }
}

fn condition_name(condition: WaitCondition) -> &'static str {
    match condition {
        WaitCondition::Visible => "visible",
        WaitCondition::Hidden => "hidden",
        WaitCondition::Attached => "attached",
        WaitCondition::Detached => "detached",
    }
}

/// The determinism-relevant fields of a command, absent values omitted.
/// `BTreeMap` keeps serialization order stable across runs.
fn canonical_fields(command: &Command) -> BTreeMap<&'static str, Value> {
    let mut fields = BTreeMap::new();
    fields.insert("method", json!(command.method()));

    match command {
        Command::Navigate { url } => {
            fields.insert("url", json!(url));
        }
        Command::Reload | Command::Back | Command::Forward => {}
        Command::Click { selector } => {
            fields.insert("selector", json!(selector));
        }
        Command::Fill { selector, text } => {
            fields.insert("selector", json!(selector));
            fields.insert("text", json!(text));
        }
        Command::TypeText { text } => {
            fields.insert("text", json!(text));
        }
        Command::Extract {
            selector,
            mode,
            name,
            multiple,
            trim,
        } => {
            fields.insert("selector", json!(selector));
            fields.insert("mode", json!(mode_name(*mode)));
            if let Some(name) = name {
                fields.insert("name", json!(name));
            }
            fields.insert("multiple", json!(multiple));
            fields.insert("trim", json!(trim));
        }
        Command::Wait {
            selector,
            condition,
            script,
            timeout_ms: _,
        } => {
            if let Some(selector) = selector {
                fields.insert("selector", json!(selector));
            }
            if let Some(condition) = condition {
                fields.insert("condition", json!(condition_name(*condition)));
            }
            if let Some(script) = script {
                fields.insert("script", json!(script));
            }
        }
        // Never cacheable, so the free-form params carry no weight.
        Command::Other { .. } => {}
    }

    fields
}

/// Stable digest of a command's canonical field set.
pub fn command_hash(command: &Command) -> String {
    let serialized = serde_json::to_string(&canonical_fields(command))
        .expect("canonical field map serializes to JSON");
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..HASH_LEN].to_string()
}
