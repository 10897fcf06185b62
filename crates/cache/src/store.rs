//! The cache store: keyed result storage with lazy TTL expiry,
//! fingerprint staleness checks, and batch LRU eviction.
//!
//! One coarse mutex guards the whole map state. Every operation takes the
//! lock once, touches only in-memory state, and releases it before
//! returning, so lock hold times stay bounded and short even when the
//! store is called from inside an async dispatch loop. Commands for
//! different sessions proceed in parallel up to that lock; serialization
//! of commands within one session is the caller's responsibility.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use pagepilot_core::{CacheConfig, Command, CommandOutcome, Result};

use crate::canonical::command_hash;
use crate::classify::{classify, Cacheability};
use crate::fingerprint::page_fingerprint;
use crate::stats::{CacheStats, StatsSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    pub session_id: String,
    pub command_hash: String,
}

/// One stored result. Owned exclusively by the store; `lookup` hands out
/// clones of `result`, never references into this struct.
pub(crate) struct CacheEntry {
    result: Value,
    created_at: Instant,
    last_accessed_at: Instant,
    access_count: u64,
    ttl: Duration,
    page_fingerprint: Option<String>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) > self.ttl
    }

    fn touch(&mut self, now: Instant) {
        self.last_accessed_at = now;
        self.access_count += 1;
    }
}

pub(crate) struct CacheState {
    pub entries: HashMap<CacheKey, CacheEntry>,
    /// Most recently observed page fingerprint per session.
    pub page_states: HashMap<String, String>,
    pub stats: CacheStats,
}

enum LookupOutcome {
    Absent,
    Expired,
    StaleFingerprint,
    Hit { result: Value, access_count: u64 },
}

/// Command-result cache for browser sessions.
///
/// Construct one instance and pass a handle to every call site; there is
/// no process-global accessor. Lookups that cannot possibly be served
/// (non-cacheable commands) return `None` without touching any state, so
/// callers may invoke `lookup` and `store` unconditionally around every
/// command execution.
pub struct CommandCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl CommandCache {
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                page_states: HashMap::new(),
                stats: CacheStats::default(),
            }),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// A poisoned lock only means another thread panicked mid-operation;
    /// the map itself is still structurally sound, so keep serving.
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a previously stored result for this command.
    ///
    /// `None` means "execute live", whatever the cause: the command is
    /// not cacheable, nothing was stored, the entry expired, or the page
    /// fingerprint no longer matches.
    pub fn lookup(
        &self,
        session_id: &str,
        command: &Command,
        current_url: Option<&str>,
        current_title: Option<&str>,
    ) -> Option<Value> {
        self.lookup_at(session_id, command, current_url, current_title, Instant::now())
    }

    pub(crate) fn lookup_at(
        &self,
        session_id: &str,
        command: &Command,
        current_url: Option<&str>,
        current_title: Option<&str>,
        now: Instant,
    ) -> Option<Value> {
        if classify(command) != Cacheability::Cacheable {
            return None;
        }

        let fresh = self.fingerprint_of(current_url, current_title);
        let key = CacheKey {
            session_id: session_id.to_string(),
            command_hash: command_hash(command),
        };

        let mut state = self.lock_state();

        let outcome = match state.entries.get_mut(&key) {
            None => LookupOutcome::Absent,
            Some(entry) if entry.is_expired(now) => LookupOutcome::Expired,
            Some(entry) => match (fresh.as_deref(), entry.page_fingerprint.as_deref()) {
                (Some(fresh), Some(stored)) if fresh != stored => {
                    LookupOutcome::StaleFingerprint
                }
                _ => {
                    entry.touch(now);
                    LookupOutcome::Hit {
                        result: entry.result.clone(),
                        access_count: entry.access_count,
                    }
                }
            },
        };

        if let Some(fresh) = fresh {
            state.page_states.insert(session_id.to_string(), fresh);
        }

        match outcome {
            LookupOutcome::Absent => {
                state.stats.misses += 1;
                None
            }
            LookupOutcome::Expired => {
                state.entries.remove(&key);
                state.stats.misses += 1;
                None
            }
            LookupOutcome::StaleFingerprint => {
                state.entries.remove(&key);
                state.stats.invalidations += 1;
                state.stats.misses += 1;
                debug!(
                    session = session_id,
                    method = command.method(),
                    "dropped cached result on page fingerprint mismatch"
                );
                None
            }
            LookupOutcome::Hit {
                result,
                access_count,
            } => {
                state.stats.hits += 1;
                debug!(
                    session = session_id,
                    method = command.method(),
                    access_count,
                    "cache hit"
                );
                Some(result)
            }
        }
    }

    /// Offer a result for storage. Silent no-op unless the command is
    /// cacheable and the outcome is a success, so callers can invoke this
    /// unconditionally after every execution.
    pub fn store(
        &self,
        session_id: &str,
        command: &Command,
        outcome: &CommandOutcome,
        current_url: Option<&str>,
        current_title: Option<&str>,
        ttl_override: Option<Duration>,
    ) {
        self.store_at(
            session_id,
            command,
            outcome,
            current_url,
            current_title,
            ttl_override,
            Instant::now(),
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn store_at(
        &self,
        session_id: &str,
        command: &Command,
        outcome: &CommandOutcome,
        current_url: Option<&str>,
        current_title: Option<&str>,
        ttl_override: Option<Duration>,
        now: Instant,
    ) {
        if classify(command) != Cacheability::Cacheable {
            return;
        }
        let result = match outcome {
            CommandOutcome::Success { data } => data.clone(),
            CommandOutcome::Failure { .. } => return,
        };

        let fingerprint = self.fingerprint_of(current_url, current_title);
        let key = CacheKey {
            session_id: session_id.to_string(),
            command_hash: command_hash(command),
        };
        let ttl = ttl_override.unwrap_or(Duration::from_secs(self.config.default_ttl_secs));

        let mut state = self.lock_state();

        // Overwriting an existing key never grows the map, so eviction is
        // only needed when a genuinely new key would push past the bound.
        if !state.entries.contains_key(&key) && state.entries.len() >= self.config.max_entries {
            Self::evict_lru(&mut state, self.config.max_entries);
        }

        if let Some(fingerprint) = &fingerprint {
            state
                .page_states
                .insert(session_id.to_string(), fingerprint.clone());
        }

        state.entries.insert(
            key,
            CacheEntry {
                result,
                created_at: now,
                last_accessed_at: now,
                access_count: 0,
                ttl,
                page_fingerprint: fingerprint,
            },
        );
    }

    /// Remove the least-recently-used ~10% of entries. Batch removal
    /// amortizes the full scan across many subsequent insertions.
    fn evict_lru(state: &mut CacheState, max_entries: usize) {
        let batch = (max_entries / 10).max(1);
        // last_accessed_at starts equal to created_at, so never-accessed
        // entries sort by age automatically.
        let mut by_recency: Vec<(CacheKey, Instant)> = state
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.last_accessed_at))
            .collect();
        by_recency.sort_by_key(|(_, last_accessed)| *last_accessed);

        let mut evicted = 0u64;
        for (key, _) in by_recency.into_iter().take(batch) {
            state.entries.remove(&key);
            evicted += 1;
        }
        state.stats.evictions += evicted;
        debug!(evicted, "evicted least-recently-used cache entries");
    }

    /// Active cleanup pass over all entries, independent of the lazy
    /// expiry done by `lookup`. Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub(crate) fn sweep_expired_at(&self, now: Instant) -> usize {
        let mut state = self.lock_state();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - state.entries.len();
        if removed > 0 {
            debug!(removed, "swept expired cache entries");
        }
        removed
    }

    /// Point-in-time counter snapshot.
    pub fn stats(&self) -> StatsSnapshot {
        let state = self.lock_state();
        state
            .stats
            .snapshot(state.entries.len(), state.page_states.len())
    }

    fn fingerprint_of(
        &self,
        current_url: Option<&str>,
        current_title: Option<&str>,
    ) -> Option<String> {
        if !self.config.enable_page_state_tracking {
            return None;
        }
        match (current_url, current_title) {
            (Some(url), Some(title)) => Some(page_fingerprint(url, title)),
            _ => None,
        }
    }
}
