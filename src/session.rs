//! Debounced search session with last-issued-wins publication.
//!
//! A [`SearchSession`] is the state behind one search box: the current
//! query text and category, a [`Debouncer`], and the published
//! [`SearchView`] that renderers subscribe to through a
//! `tokio::sync::watch` channel.
//!
//! # Ordering
//!
//! Every debounced evaluation takes a generation number when it starts.
//! Issuing a generation and publishing a result both happen inside the
//! watch channel's lock, so the check "is this still the latest issued
//! generation?" and the publication are atomic. A slow evaluation that
//! completes after a newer one was issued is discarded: the visible result
//! always belongs to the most recently *issued* evaluation, regardless of
//! completion order. In-flight remote calls are not cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nexus_core::group::{group_by_category, Group};
use nexus_core::models::{CategoryFilter, Item};
use nexus_core::resolver::{ResolutionPath, Resolver};
use serde::Serialize;
use tokio::sync::watch;

use crate::analytics;
use crate::debounce::Debouncer;

/// Raw user input for one search box.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct QueryState {
    pub raw_text: String,
    pub category: CategoryFilter,
}

impl QueryState {
    pub fn new(raw_text: impl Into<String>, category: CategoryFilter) -> Self {
        Self {
            raw_text: raw_text.into(),
            category,
        }
    }
}

/// What a renderer shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchView {
    /// Generation that produced `items`; 0 for the initial view.
    pub generation: u64,
    /// Query that produced `items`.
    pub query: QueryState,
    pub items: Vec<Item>,
    pub path: ResolutionPath,
    /// True while the latest issued evaluation is running.
    pub is_pending: bool,
}

impl SearchView {
    pub fn groups(&self) -> Vec<Group> {
        group_by_category(&self.items, self.query.category)
    }
}

struct Shared {
    resolver: Arc<Resolver>,
    issued: AtomicU64,
    view: watch::Sender<SearchView>,
}

pub struct SearchSession {
    shared: Arc<Shared>,
    state: Mutex<QueryState>,
    debouncer: Debouncer,
}

impl SearchSession {
    /// New session showing the whole catalog under `All`.
    pub fn new(resolver: Arc<Resolver>, delay: Duration) -> Self {
        let initial = SearchView {
            generation: 0,
            query: QueryState::default(),
            items: resolver.catalog().all().to_vec(),
            path: ResolutionPath::Unfiltered,
            is_pending: false,
        };
        let (view, _) = watch::channel(initial);

        Self {
            shared: Arc::new(Shared {
                resolver,
                issued: AtomicU64::new(0),
                view,
            }),
            state: Mutex::new(QueryState::default()),
            debouncer: Debouncer::new(delay),
        }
    }

    /// Replace the whole query state and schedule an evaluation.
    pub fn on_change(&self, next: QueryState) {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.category != next.category {
                analytics::track_category_switch(next.category);
            }
            *state = next.clone();
        }

        let shared = Arc::clone(&self.shared);
        self.debouncer.call(move || {
            let generation = issue(&shared);
            evaluate(shared, next, generation)
        });
    }

    pub fn set_text(&self, raw_text: impl Into<String>) {
        let mut next = self.state();
        next.raw_text = raw_text.into();
        self.on_change(next);
    }

    pub fn set_category(&self, category: CategoryFilter) {
        let mut next = self.state();
        next.category = category;
        self.on_change(next);
    }

    /// Clear the text and return to `All`.
    pub fn reset(&self) {
        self.on_change(QueryState::default());
    }

    pub fn state(&self) -> QueryState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Snapshot of the published view.
    pub fn view(&self) -> SearchView {
        self.shared.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.shared.view.subscribe()
    }

    /// Number of evaluations issued so far.
    pub fn issued(&self) -> u64 {
        self.shared.issued.load(Ordering::SeqCst)
    }

    /// Whether an edit is still waiting out the debounce delay.
    pub fn is_scheduled(&self) -> bool {
        self.debouncer.is_scheduled()
    }
}

/// Take the next generation and mark the view pending.
fn issue(shared: &Shared) -> u64 {
    let mut generation = 0;
    shared.view.send_modify(|view| {
        generation = shared.issued.fetch_add(1, Ordering::SeqCst) + 1;
        view.is_pending = true;
    });
    generation
}

async fn evaluate(shared: Arc<Shared>, query: QueryState, generation: u64) {
    let resolution = shared
        .resolver
        .evaluate(&query.raw_text, query.category)
        .await;
    let count = resolution.items.len();

    let published = shared.view.send_if_modified(|view| {
        if shared.issued.load(Ordering::SeqCst) != generation {
            return false;
        }
        *view = SearchView {
            generation,
            query: query.clone(),
            items: resolution.items,
            path: resolution.path,
            is_pending: false,
        };
        true
    });

    if published {
        analytics::track_search(&query.raw_text, count);
    } else {
        tracing::debug!(generation, query = %query.raw_text, "discarding stale search result");
    }
}
