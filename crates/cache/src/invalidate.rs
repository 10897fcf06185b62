//! Command-triggered invalidation.
//!
//! Invalidation is deliberately coarse. Whether a click could change the
//! result of some previously extracted value is not decidable from a
//! selector string, so every mutating command purges the whole session;
//! over-invalidation is the accepted safety margin. The one distinction
//! kept is full-page navigation, which additionally drops the session's
//! page-state index entry because the entire page identity is gone.

use tracing::debug;

use pagepilot_core::Command;

use crate::classify::{classify, is_full_page, Cacheability};
use crate::store::CommandCache;

impl CommandCache {
    /// Notify the cache that a command is being issued for a session.
    ///
    /// Call this for every command regardless of classification; anything
    /// that is not an invalidating command is a no-op.
    pub fn on_command_issued(&self, session_id: &str, command: &Command) {
        if classify(command) != Cacheability::Invalidates {
            return;
        }
        let full_page = is_full_page(command);

        let mut state = self.lock_state();
        let before = state.entries.len();
        state.entries.retain(|key, _| key.session_id != session_id);
        let purged = (before - state.entries.len()) as u64;
        state.stats.invalidations += purged;
        if full_page {
            state.page_states.remove(session_id);
        }
        if purged > 0 {
            debug!(
                session = session_id,
                method = command.method(),
                purged,
                full_page,
                "purged cached results for mutating command"
            );
        }
    }

    /// Purge all entries and page-state tracking for a session, e.g. on
    /// session close. Idempotent: purging an unknown or already-empty
    /// session is a no-op.
    pub fn invalidate_session(&self, session_id: &str) {
        let mut state = self.lock_state();
        let before = state.entries.len();
        state.entries.retain(|key, _| key.session_id != session_id);
        let purged = (before - state.entries.len()) as u64;
        state.stats.invalidations += purged;
        state.page_states.remove(session_id);
        if purged > 0 {
            debug!(session = session_id, purged, "invalidated session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepilot_core::{CacheConfig, CommandOutcome, ExtractMode};
    use serde_json::json;

    fn cache() -> CommandCache {
        CommandCache::new(CacheConfig {
            max_entries: 10,
            default_ttl_secs: 300,
            enable_page_state_tracking: true,
        })
        .unwrap()
    }

    fn extract(selector: &str) -> Command {
        Command::Extract {
            selector: selector.to_string(),
            mode: ExtractMode::Text,
            name: None,
            multiple: false,
            trim: false,
        }
    }

    fn seed(cache: &CommandCache, session_id: &str, selector: &str) {
        cache.store(
            session_id,
            &extract(selector),
            &CommandOutcome::success(json!("value")),
            Some("https://example.com"),
            Some("Example"),
            None,
        );
    }

    #[test]
    fn test_navigation_purges_session() {
        let cache = cache();
        seed(&cache, "s1", "h1");
        seed(&cache, "s1", "h2");
        cache.on_command_issued(
            "s1",
            &Command::Navigate {
                url: "https://elsewhere.net".to_string(),
            },
        );
        assert_eq!(cache.lookup("s1", &extract("h1"), None, None), None);
        assert_eq!(cache.lookup("s1", &extract("h2"), None, None), None);
        assert_eq!(cache.stats().invalidations, 2);
    }

    #[test]
    fn test_click_purges_session() {
        let cache = cache();
        seed(&cache, "s1", "h1");
        cache.on_command_issued(
            "s1",
            &Command::Click {
                selector: "#expand".to_string(),
            },
        );
        assert_eq!(cache.lookup("s1", &extract("h1"), None, None), None);
    }

    #[test]
    fn test_invalidation_spares_other_sessions() {
        let cache = cache();
        seed(&cache, "s1", "h1");
        seed(&cache, "s2", "h1");
        cache.on_command_issued(
            "s1",
            &Command::Navigate {
                url: "https://elsewhere.net".to_string(),
            },
        );
        assert_eq!(cache.lookup("s1", &extract("h1"), None, None), None);
        assert_eq!(
            cache.lookup("s2", &extract("h1"), None, None),
            Some(json!("value"))
        );
    }

    #[test]
    fn test_read_only_command_is_a_no_op() {
        let cache = cache();
        seed(&cache, "s1", "h1");
        cache.on_command_issued("s1", &extract("h2"));
        assert_eq!(
            cache.lookup("s1", &extract("h1"), None, None),
            Some(json!("value"))
        );
        assert_eq!(cache.stats().invalidations, 0);
    }

    #[test]
    fn test_unknown_command_is_a_no_op() {
        let cache = cache();
        seed(&cache, "s1", "h1");
        cache.on_command_issued(
            "s1",
            &Command::Other {
                method: "teleport".to_string(),
                params: json!({}),
            },
        );
        assert_eq!(
            cache.lookup("s1", &extract("h1"), None, None),
            Some(json!("value"))
        );
    }

    #[test]
    fn test_invalidate_session_is_idempotent() {
        let cache = cache();
        seed(&cache, "s1", "h1");
        cache.invalidate_session("s1");
        let after_first = cache.stats();
        assert_eq!(after_first.cache_size, 0);
        assert_eq!(after_first.invalidations, 1);
        // Second call, and one for a session that never existed: no-ops.
        cache.invalidate_session("s1");
        cache.invalidate_session("never-seen");
        let after_second = cache.stats();
        assert_eq!(after_second.cache_size, 0);
        assert_eq!(after_second.invalidations, 1);
    }

    #[test]
    fn test_navigation_drops_page_state_index_but_click_keeps_it() {
        let cache = cache();
        seed(&cache, "s1", "h1");
        assert_eq!(cache.stats().tracked_sessions, 1);

        // Localized mutation purges entries but the session's page-state
        // tracking survives.
        cache.on_command_issued(
            "s1",
            &Command::Click {
                selector: "#expand".to_string(),
            },
        );
        assert_eq!(cache.stats().tracked_sessions, 1);

        // Full-page navigation discards the page identity entirely.
        cache.on_command_issued(
            "s1",
            &Command::Navigate {
                url: "https://elsewhere.net".to_string(),
            },
        );
        assert_eq!(cache.stats().tracked_sessions, 0);
    }

    #[test]
    fn test_invalidate_session_drops_page_state_index() {
        let cache = cache();
        seed(&cache, "s1", "h1");
        assert_eq!(cache.stats().tracked_sessions, 1);
        cache.invalidate_session("s1");
        assert_eq!(cache.stats().tracked_sessions, 0);
    }

    #[test]
    fn test_store_after_invalidation_works() {
        let cache = cache();
        seed(&cache, "s1", "h1");
        cache.invalidate_session("s1");
        seed(&cache, "s1", "h1");
        assert_eq!(
            cache.lookup("s1", &extract("h1"), None, None),
            Some(json!("value"))
        );
    }
}
