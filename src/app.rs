//! Application wiring shared by the CLI and the HTTP server.
//!
//! [`App`] bundles the catalog, the language-model provider, the resolver
//! and the preferences store built from one [`Config`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use nexus_core::catalog::Catalog;
use nexus_core::chat::Assistant;
use nexus_core::kv::KeyValueStore;
use nexus_core::models::{Item, ItemSummary};
use nexus_core::prefs::Preferences;
use nexus_core::resolver::{RemoteError, Resolver, SemanticMatcher};

use crate::config::Config;
use crate::file_store::FileStore;
use crate::llm::{create_provider, LlmProvider};
use crate::session::SearchSession;

/// Preferences over whichever key-value store the app was built with.
pub type SharedPreferences = Preferences<Arc<dyn KeyValueStore>>;

pub struct App {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub resolver: Arc<Resolver>,
    pub assistant: Arc<dyn Assistant>,
    pub prefs: Arc<SharedPreferences>,
}

impl App {
    /// Build everything from configuration: catalog file (or built-in),
    /// provider, and the file-backed preferences store.
    pub fn from_config(config: Config) -> Result<Self> {
        let catalog = load_catalog(&config)?;
        let provider = create_provider(&config.llm, &catalog)?;
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.prefs.path));
        Ok(Self::assemble(config, catalog, provider, store))
    }

    /// Build with explicit collaborators.
    pub fn assemble(
        config: Config,
        catalog: Catalog,
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let matcher = Bounded::new(Arc::clone(&provider), config.search.remote_timeout());
        let resolver = Resolver::new(Arc::clone(&catalog), Arc::new(matcher))
            .with_remote_min_chars(config.search.remote_min_chars);

        Self {
            catalog,
            resolver: Arc::new(resolver),
            assistant: Arc::new(provider),
            prefs: Arc::new(Preferences::new(store)),
            config,
        }
    }

    /// A fresh debounced search session over this app's resolver.
    pub fn session(&self) -> SearchSession {
        SearchSession::new(Arc::clone(&self.resolver), self.config.search.debounce())
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.catalog.get(id)
    }
}

/// Load the catalog named in `[catalog].path`, or the built-in one.
pub fn load_catalog(config: &Config) -> Result<Catalog> {
    match &config.catalog.path {
        Some(path) => read_catalog(path),
        None => Ok(Catalog::builtin()),
    }
}

/// Read a JSON array of items and validate it as a catalog.
pub fn read_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
    let items: Vec<Item> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse catalog: {}", path.display()))?;
    Catalog::new(items).with_context(|| format!("Invalid catalog: {}", path.display()))
}

/// Bounds a [`SemanticMatcher`] with a deadline; expiry is a
/// [`RemoteError::Timeout`], which the resolver treats like any failure.
pub struct Bounded<M> {
    inner: M,
    timeout: Duration,
}

impl<M> Bounded<M> {
    pub fn new(inner: M, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<M: SemanticMatcher> SemanticMatcher for Bounded<M> {
    async fn match_ids(
        &self,
        query: &str,
        candidates: &[ItemSummary],
    ) -> Result<Vec<String>, RemoteError> {
        tokio::time::timeout(self.timeout, self.inner.match_ids(query, candidates))
            .await
            .map_err(|_| RemoteError::Timeout(self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::models::Category;
    use tempfile::TempDir;

    struct Stalled;

    #[async_trait]
    impl SemanticMatcher for Stalled {
        async fn match_ids(
            &self,
            _query: &str,
            _candidates: &[ItemSummary],
        ) -> Result<Vec<String>, RemoteError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec!["never".into()])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let bounded = Bounded::new(Stalled, Duration::from_millis(50));
        let err = bounded.match_ids("query", &[]).await.unwrap_err();
        assert!(matches!(err, RemoteError::Timeout(_)));
    }

    #[test]
    fn test_read_catalog_validates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tools.json");
        std::fs::write(
            &path,
            r#"[
  {"id": "x", "name": "X", "description": "", "category": "ai", "url": "https://x"},
  {"id": "x", "name": "Y", "description": "", "category": "creative", "url": "https://y"}
]"#,
        )
        .unwrap();
        let err = read_catalog(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("duplicate item id"));
    }

    #[test]
    fn test_read_catalog_ok() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tools.json");
        std::fs::write(
            &path,
            r#"[{"id": "x", "name": "X", "description": "d", "category": "personal", "tags": ["t"], "url": "https://x"}]"#,
        )
        .unwrap();
        let catalog = read_catalog(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.all()[0].category, Category::Personal);
    }

    #[test]
    fn test_from_config_defaults_to_builtin() {
        let tmp = TempDir::new().unwrap();
        let app = App::from_config(Config::minimal(tmp.path().join("prefs.json"))).unwrap();
        assert_eq!(app.catalog.len(), Catalog::builtin().len());
        assert!(app.item("kimi-ai").is_some());
        assert_eq!(app.resolver.remote_min_chars(), 3);
    }
}
