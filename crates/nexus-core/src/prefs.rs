//! Favorites, recently-used tools and click statistics.
//!
//! Both records live as JSON strings in a [`KeyValueStore`]. Reads never
//! fail: a missing, unreadable or corrupt record yields the default.
//! Writes that fail are logged and otherwise ignored, so callers always get
//! the in-memory result of the operation they asked for.
//!
//! Every load, modify and write sequence runs under one lock, so concurrent
//! callers sharing a [`Preferences`] never overwrite each other's updates.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::kv::KeyValueStore;
use crate::models::{RecentUsage, UserPreferences};

/// Key holding the serialized [`UserPreferences`].
pub const USER_DATA_KEY: &str = "river-nexus-user-data";
/// Key holding the `tool_id -> clicks` map.
pub const CLICK_STATS_KEY: &str = "river-nexus-click-stats";
/// Length cap of the recently-used list.
pub const MAX_RECENT_ITEMS: usize = 10;
/// Default number of entries returned by [`Preferences::hot_tools`].
pub const DEFAULT_HOT_LIMIT: usize = 5;

/// Per-tool click counts.
pub type ClickStats = BTreeMap<String, u64>;

/// Preferences service over an injected key-value store.
pub struct Preferences<S> {
    store: S,
    update: Mutex<()>,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            update: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current preferences, or the default record.
    pub fn load(&self) -> UserPreferences {
        self.read_json(USER_DATA_KEY).unwrap_or_default()
    }

    /// Persist `prefs`, stamping `last_updated`. Returns the stamped record.
    pub fn save(&self, prefs: UserPreferences, now: DateTime<Utc>) -> UserPreferences {
        let _guard = self.exclusive();
        self.stamp_and_write(prefs, now)
    }

    /// Flip the favorite state of `tool_id`. Returns `true` if it is now a favorite.
    pub fn toggle_favorite(&self, tool_id: &str, now: DateTime<Utc>) -> bool {
        let _guard = self.exclusive();
        let mut prefs = self.load();
        let now_favorite = match prefs.favorites.iter().position(|id| id == tool_id) {
            Some(pos) => {
                prefs.favorites.remove(pos);
                false
            }
            None => {
                prefs.favorites.push(tool_id.to_string());
                true
            }
        };
        self.stamp_and_write(prefs, now);
        now_favorite
    }

    pub fn is_favorite(&self, tool_id: &str) -> bool {
        self.load().favorites.iter().any(|id| id == tool_id)
    }

    /// Move `tool_id` to the front of the recent list, bumping its count.
    pub fn record_usage(&self, tool_id: &str, now: DateTime<Utc>) -> UserPreferences {
        let _guard = self.exclusive();
        let mut prefs = self.load();
        let ts = now.timestamp_millis();

        let entry = match prefs
            .recently_used
            .iter()
            .position(|r| r.tool_id == tool_id)
        {
            Some(pos) => {
                let mut existing = prefs.recently_used.remove(pos);
                existing.timestamp = ts;
                existing.count = existing.count.saturating_add(1);
                existing
            }
            None => RecentUsage {
                tool_id: tool_id.to_string(),
                timestamp: ts,
                count: 1,
            },
        };
        prefs.recently_used.insert(0, entry);
        prefs.recently_used.truncate(MAX_RECENT_ITEMS);

        self.stamp_and_write(prefs, now)
    }

    pub fn click_stats(&self) -> ClickStats {
        self.read_json(CLICK_STATS_KEY).unwrap_or_default()
    }

    /// Increment the click counter for `tool_id`. Returns the new count.
    pub fn record_click(&self, tool_id: &str) -> u64 {
        let _guard = self.exclusive();
        let mut stats = self.click_stats();
        let count = stats.entry(tool_id.to_string()).or_insert(0);
        *count += 1;
        let count = *count;
        self.write_json(CLICK_STATS_KEY, &stats);
        count
    }

    pub fn click_count(&self, tool_id: &str) -> u64 {
        self.click_stats().get(tool_id).copied().unwrap_or(0)
    }

    /// Most-clicked tool ids, highest first; ties break by id.
    pub fn hot_tools(&self, limit: usize) -> Vec<String> {
        let mut ranked: Vec<(String, u64)> = self.click_stats().into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.into_iter().take(limit).map(|(id, _)| id).collect()
    }

    // The guarded value is `()`, so a poisoned lock carries no broken state.
    fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.update.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stamp_and_write(&self, mut prefs: UserPreferences, now: DateTime<Utc>) -> UserPreferences {
        prefs.last_updated = now.timestamp_millis();
        self.write_json(USER_DATA_KEY, &prefs);
        prefs
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read preferences");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring corrupt preferences record");
                None
            }
        }
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.set(key, &json));
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "failed to save preferences");
        }
    }
}
