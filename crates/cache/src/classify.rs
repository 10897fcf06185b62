//! Cacheability classification.
//!
//! A pure, total mapping from command to caching policy. Everything the
//! cache does downstream hinges on this being conservative: an unknown or
//! ambiguous command must never come out `Cacheable`.

use pagepilot_core::Command;

/// Caching policy for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cacheability {
    /// Result is safe to reuse while the page is unchanged.
    Cacheable,
    /// Execution is assumed to mutate page state; cached reads for the
    /// session must be purged.
    Invalidates,
    /// Result must never be stored or served from cache.
    NotCacheable,
}

/// Classify a command's caching policy.
///
/// Read-only extraction is cacheable. A `wait` is cacheable only when it
/// polls one of the whitelisted element-state conditions and carries no
/// custom script; a script condition forces `NotCacheable` because its
/// result may depend on non-deterministic page logic. State-mutating
/// commands invalidate. Unrecognized methods fail closed.
pub fn classify(command: &Command) -> Cacheability {
    match command {
        Command::Extract { .. } => Cacheability::Cacheable,
        Command::Wait {
            condition, script, ..
        } => {
            if script.is_some() {
                return Cacheability::NotCacheable;
            }
            // A bare timed wait has no observable result worth reusing.
            match condition {
                Some(_) => Cacheability::Cacheable,
                None => Cacheability::NotCacheable,
            }
        }
        Command::Navigate { .. }
        | Command::Reload
        | Command::Back
        | Command::Forward
        | Command::Click { .. }
        | Command::Fill { .. }
        | Command::TypeText { .. } => Cacheability::Invalidates,
        Command::Other { .. } => Cacheability::NotCacheable,
    }
}

/// Whether an invalidating command can replace the entire DOM.
///
/// Navigation-class commands purge a session wholesale; localized
/// mutations (click/fill/type) are still treated as session-wide purges
/// by the invalidation engine, but leave the page-state index intact.
pub fn is_full_page(command: &Command) -> bool {
    matches!(
        command,
        Command::Navigate { .. } | Command::Reload | Command::Back | Command::Forward
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepilot_core::{ExtractMode, WaitCondition};
    use serde_json::json;

    fn extract(selector: &str) -> Command {
        Command::Extract {
            selector: selector.to_string(),
            mode: ExtractMode::Text,
            name: None,
            multiple: false,
            trim: false,
        }
    }

    #[test]
    fn test_extract_is_cacheable() {
        assert_eq!(classify(&extract("h1")), Cacheability::Cacheable);
    }

    #[test]
    fn test_whitelisted_wait_is_cacheable() {
        for condition in [
            WaitCondition::Visible,
            WaitCondition::Hidden,
            WaitCondition::Attached,
            WaitCondition::Detached,
        ] {
            let cmd = Command::Wait {
                selector: Some("#status".to_string()),
                condition: Some(condition),
                script: None,
                timeout_ms: Some(5000),
            };
            assert_eq!(classify(&cmd), Cacheability::Cacheable);
        }
    }

    #[test]
    fn test_script_wait_forced_not_cacheable() {
        // Even with a whitelisted condition alongside, a script wins.
        let cmd = Command::Wait {
            selector: Some("#status".to_string()),
            condition: Some(WaitCondition::Visible),
            script: Some("window.ready === true".to_string()),
            timeout_ms: None,
        };
        assert_eq!(classify(&cmd), Cacheability::NotCacheable);
    }

    #[test]
    fn test_bare_timed_wait_not_cacheable() {
        let cmd = Command::Wait {
            selector: None,
            condition: None,
            script: None,
            timeout_ms: Some(1000),
        };
        assert_eq!(classify(&cmd), Cacheability::NotCacheable);
    }

    #[test]
    fn test_mutating_commands_invalidate() {
        let commands = [
            Command::Navigate {
                url: "https://example.com".to_string(),
            },
            Command::Reload,
            Command::Back,
            Command::Forward,
            Command::Click {
                selector: "#submit".to_string(),
            },
            Command::Fill {
                selector: "#name".to_string(),
                text: "alice".to_string(),
            },
            Command::TypeText {
                text: "hello".to_string(),
            },
        ];
        for cmd in &commands {
            assert_eq!(classify(cmd), Cacheability::Invalidates, "{:?}", cmd);
        }
    }

    #[test]
    fn test_unknown_method_fails_closed() {
        let cmd = Command::Other {
            method: "teleport".to_string(),
            params: json!({"x": 1}),
        };
        assert_eq!(classify(&cmd), Cacheability::NotCacheable);
    }

    #[test]
    fn test_full_page_split() {
        assert!(is_full_page(&Command::Navigate {
            url: "https://example.com".to_string()
        }));
        assert!(is_full_page(&Command::Reload));
        assert!(!is_full_page(&Command::Click {
            selector: "#submit".to_string()
        }));
        assert!(!is_full_page(&Command::Fill {
            selector: "#name".to_string(),
            text: "x".to_string()
        }));
    }
}
