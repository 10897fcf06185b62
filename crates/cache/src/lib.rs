//! Command-result caching for browser session control.
//!
//! Sits between a command dispatcher and the browser engine: the
//! dispatcher calls [`CommandCache::lookup`] before executing a command,
//! offers every result back via [`CommandCache::store`], and routes every
//! issued command through [`CommandCache::on_command_issued`] so mutating
//! commands purge the session's cached reads. All operations are
//! synchronous, in-memory, and safe to call from an async dispatch loop.
//!
//! ```
//! use pagepilot_cache::CommandCache;
//! use pagepilot_core::{CacheConfig, Command, CommandOutcome};
//! use serde_json::json;
//!
//! let cache = CommandCache::new(CacheConfig::default()).unwrap();
//! let command = Command::parse(&json!({"method": "extract", "selector": "h1"})).unwrap();
//!
//! if cache.lookup("session-1", &command, None, None).is_none() {
//!     // ... execute against the browser engine ...
//!     let outcome = CommandOutcome::success(json!("Welcome"));
//!     cache.store("session-1", &command, &outcome, None, None, None);
//! }
//! ```

pub mod canonical;
pub mod classify;
pub mod fingerprint;
pub mod invalidate;
pub mod stats;
pub mod store;

pub use canonical::command_hash;
pub use classify::{classify, is_full_page, Cacheability};
pub use fingerprint::page_fingerprint;
pub use stats::StatsSnapshot;
pub use store::CommandCache;
