//! Smart search with local fallback.
//!
//! The [`Resolver`] turns one settled `(query, category)` pair into the
//! ordered list of items to display. It never fails: every remote problem
//! is converted into the local substring fallback.
//!
//! # Algorithm
//!
//! 1. Scope the catalog to the selected category (order preserved).
//! 2. Empty trimmed query → the scoped pool, unchanged.
//! 3. Fewer than `remote_min_chars` characters → local match on name and
//!    tags. The semantic matcher is never called.
//! 4. Otherwise ask the [`SemanticMatcher`] for matching ids. A non-empty
//!    answer filters the pool to those ids, keeping **pool** order.
//! 5. An empty answer, an answer naming no pooled item, or any error →
//!    local match on name, tags and description.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{summaries, Catalog};
use crate::matcher::{filter_local, MatchFields};
use crate::models::{CategoryFilter, Item, ItemSummary};

/// Queries shorter than this (in characters, after trimming) stay local.
pub const DEFAULT_REMOTE_MIN_CHARS: usize = 3;

/// Failure of a remote language-model collaborator.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote provider is disabled")]
    Disabled,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Remote semantic-match collaborator.
///
/// Given a query and the candidate pool's summaries, returns the ids the
/// remote side considers relevant. An empty list is a valid answer.
#[async_trait]
pub trait SemanticMatcher: Send + Sync {
    async fn match_ids(
        &self,
        query: &str,
        candidates: &[ItemSummary],
    ) -> Result<Vec<String>, RemoteError>;
}

#[async_trait]
impl<M: SemanticMatcher + ?Sized> SemanticMatcher for Arc<M> {
    async fn match_ids(
        &self,
        query: &str,
        candidates: &[ItemSummary],
    ) -> Result<Vec<String>, RemoteError> {
        (**self).match_ids(query, candidates).await
    }
}

/// How a [`Resolution`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    /// Empty query; the category pool was returned unchanged.
    Unfiltered,
    /// Short query; local match only.
    ShortQuery,
    /// Remote ids accepted.
    Remote,
    /// Remote answered with no usable ids; local fallback.
    RemoteEmpty,
    /// Remote call failed; local fallback.
    RemoteFailed,
}

impl ResolutionPath {
    /// Whether the remote matcher was consulted.
    pub fn attempted_remote(self) -> bool {
        matches!(
            self,
            ResolutionPath::Remote | ResolutionPath::RemoteEmpty | ResolutionPath::RemoteFailed
        )
    }
}

/// Output of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub items: Vec<Item>,
    pub path: ResolutionPath,
}

/// Resolves queries against a [`Catalog`] with remote-first matching.
pub struct Resolver {
    catalog: Arc<Catalog>,
    matcher: Arc<dyn SemanticMatcher>,
    remote_min_chars: usize,
}

impl Resolver {
    pub fn new(catalog: Arc<Catalog>, matcher: Arc<dyn SemanticMatcher>) -> Self {
        Self {
            catalog,
            matcher,
            remote_min_chars: DEFAULT_REMOTE_MIN_CHARS,
        }
    }

    /// Override the short-query threshold. Values below 1 are clamped to 1.
    pub fn with_remote_min_chars(mut self, chars: usize) -> Self {
        self.remote_min_chars = chars.max(1);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn remote_min_chars(&self) -> usize {
        self.remote_min_chars
    }

    /// Compute the ordered result for `raw_text` within `filter`.
    pub async fn evaluate(&self, raw_text: &str, filter: CategoryFilter) -> Resolution {
        let pool = self.catalog.by_category(filter);
        let query = raw_text.trim();

        if query.is_empty() {
            return Resolution {
                items: pool,
                path: ResolutionPath::Unfiltered,
            };
        }

        if query.chars().count() < self.remote_min_chars {
            tracing::debug!(query, %filter, "short query, local match only");
            return Resolution {
                items: filter_local(&pool, query, MatchFields::NameAndTags),
                path: ResolutionPath::ShortQuery,
            };
        }

        let path = match self.matcher.match_ids(query, &summaries(&pool)).await {
            Ok(ids) if !ids.is_empty() => {
                let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
                let accepted: Vec<Item> = pool
                    .iter()
                    .filter(|item| wanted.contains(item.id.as_str()))
                    .cloned()
                    .collect();
                if !accepted.is_empty() {
                    tracing::debug!(query, matched = accepted.len(), "remote match accepted");
                    return Resolution {
                        items: accepted,
                        path: ResolutionPath::Remote,
                    };
                }
                tracing::debug!(query, returned = ids.len(), "remote ids outside pool");
                ResolutionPath::RemoteEmpty
            }
            Ok(_) => {
                tracing::debug!(query, "remote match empty, falling back to local");
                ResolutionPath::RemoteEmpty
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "remote match failed, falling back to local");
                ResolutionPath::RemoteFailed
            }
        };

        Resolution {
            items: filter_local(&pool, query, MatchFields::WithDescription),
            path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        answer: Result<Vec<&'static str>, ()>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn ok(ids: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(ids),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                answer: Err(()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SemanticMatcher for Fixed {
        async fn match_ids(
            &self,
            _query: &str,
            _candidates: &[ItemSummary],
        ) -> Result<Vec<String>, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Ok(ids) => Ok(ids.iter().map(|s| s.to_string()).collect()),
                Err(()) => Err(RemoteError::Transport("connection refused".into())),
            }
        }
    }

    fn item(id: &str, name: &str, category: Category, tags: &[&str]) -> Item {
        Item {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            category,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            url: String::new(),
            icon: String::new(),
        }
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::new(vec![
                item("a", "DeepSeek", Category::Ai, &["AI", "推理"]),
                item("b", "Kimi", Category::Ai, &["长文本"]),
                item("c", "Figma", Category::Creative, &["UI", "设计"]),
            ])
            .unwrap(),
        )
    }

    fn ids(r: &Resolution) -> Vec<&str> {
        r.items.iter().map(|i| i.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_empty_query_returns_pool() {
        let m = Fixed::ok(vec!["a"]);
        let r = Resolver::new(catalog(), m.clone());
        let res = r.evaluate("   ", CategoryFilter::All).await;
        assert_eq!(ids(&res), vec!["a", "b", "c"]);
        assert_eq!(res.path, ResolutionPath::Unfiltered);
        assert_eq!(m.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_short_query_never_calls_remote() {
        let m = Fixed::ok(vec!["b"]);
        let r = Resolver::new(catalog(), m.clone());
        let res = r.evaluate("AI", CategoryFilter::All).await;
        assert_eq!(ids(&res), vec!["a"]);
        assert_eq!(res.path, ResolutionPath::ShortQuery);
        assert_eq!(m.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_order_ignored() {
        let m = Fixed::ok(vec!["c", "a"]);
        let r = Resolver::new(catalog(), m.clone());
        let res = r.evaluate("anything", CategoryFilter::All).await;
        assert_eq!(ids(&res), vec!["a", "c"]);
        assert_eq!(res.path, ResolutionPath::Remote);
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back() {
        let r = Resolver::new(catalog(), Fixed::failing());
        let res = r.evaluate("deepseek", CategoryFilter::All).await;
        assert_eq!(ids(&res), vec!["a"]);
        assert_eq!(res.path, ResolutionPath::RemoteFailed);
    }

    #[tokio::test]
    async fn test_remote_empty_falls_back() {
        let r = Resolver::new(catalog(), Fixed::ok(vec![]));
        let res = r.evaluate("kimi", CategoryFilter::All).await;
        assert_eq!(ids(&res), vec!["b"]);
        assert_eq!(res.path, ResolutionPath::RemoteEmpty);
    }

    #[tokio::test]
    async fn test_remote_ids_outside_scope_fall_back() {
        let r = Resolver::new(catalog(), Fixed::ok(vec!["c"]));
        let res = r
            .evaluate("kimi", CategoryFilter::Only(Category::Ai))
            .await;
        assert_eq!(ids(&res), vec!["b"]);
        assert_eq!(res.path, ResolutionPath::RemoteEmpty);
    }

    #[tokio::test]
    async fn test_threshold_configurable() {
        let m = Fixed::ok(vec!["b"]);
        let r = Resolver::new(catalog(), m.clone()).with_remote_min_chars(5);
        let res = r.evaluate("kimi", CategoryFilter::All).await;
        assert_eq!(res.path, ResolutionPath::ShortQuery);
        assert_eq!(m.calls.load(Ordering::SeqCst), 0);

        let res = r.evaluate("kimi!", CategoryFilter::All).await;
        assert_eq!(res.path, ResolutionPath::Remote);
        assert_eq!(m.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_category_scope_applies_to_remote_result() {
        let r = Resolver::new(catalog(), Fixed::ok(vec!["a", "c"]));
        let res = r
            .evaluate("design", CategoryFilter::Only(Category::Creative))
            .await;
        assert_eq!(ids(&res), vec!["c"]);
        assert!(res
            .items
            .iter()
            .all(|i| i.category == Category::Creative));
    }
}
