//! One-shot and interactive search commands.
//!
//! [`search`] resolves a single query without debouncing (CLI `search`,
//! HTTP `POST /search`). [`run_watch`] drives a debounced
//! [`SearchSession`](crate::session::SearchSession) from stdin, one line per
//! query edit, and prints every view the session publishes.

use anyhow::Result;
use nexus_core::group::{group_by_category, Group};
use nexus_core::models::{CategoryFilter, Item};
use nexus_core::resolver::ResolutionPath;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::analytics;
use crate::app::App;
use crate::session::SearchView;

/// Result of one resolution, as returned by the CLI (`--json`) and the server.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub category: CategoryFilter,
    pub path: ResolutionPath,
    pub items: Vec<Item>,
    pub groups: Vec<Group>,
}

/// Resolve `query` within `category` once.
pub async fn search(app: &App, query: &str, category: CategoryFilter) -> SearchResponse {
    let resolution = app.resolver.evaluate(query, category).await;
    analytics::track_search(query, resolution.items.len());

    SearchResponse {
        query: query.to_string(),
        category,
        path: resolution.path,
        groups: group_by_category(&resolution.items, category),
        items: resolution.items,
    }
}

/// CLI entry point for `nexus search`.
pub async fn run_search(app: &App, query: &str, category: CategoryFilter, json: bool) -> Result<()> {
    let response = search(app, query, category).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if response.items.is_empty() {
        println!("No results.");
        return Ok(());
    }
    print_groups(&response.groups);
    Ok(())
}

/// Print grouped items in the plain-text CLI layout.
pub fn print_groups(groups: &[Group]) {
    for group in groups {
        println!("{} ({})", group.label, group.items.len());
        for item in &group.items {
            println!("  {:<20} {}", item.id, item.name);
            if !item.description.is_empty() {
                println!("  {:<20} {}", "", item.description);
            }
        }
        println!();
    }
}

/// CLI entry point for `nexus watch`.
///
/// Each stdin line replaces the query text. `:cat <slug>` switches the
/// category and `:reset` clears both. On end of input the command waits for
/// the last evaluation to settle before returning.
pub async fn run_watch(app: &App, json: bool) -> Result<()> {
    let session = app.session();
    let mut views = session.subscribe();
    let debounce = app.config.search.debounce();

    let printer = tokio::spawn(async move {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            if view.is_pending {
                continue;
            }
            if let Err(e) = print_view(&view, json) {
                tracing::warn!(error = %e, "failed to print search view");
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix(":cat") {
            match rest.trim().parse::<CategoryFilter>() {
                Ok(category) => session.set_category(category),
                Err(e) => eprintln!("{}", e),
            }
        } else if line.trim() == ":reset" {
            session.reset();
        } else {
            session.set_text(line);
        }
    }

    // Let the trailing timer fire, then wait for the latest evaluation.
    while session.is_scheduled() {
        tokio::time::sleep(debounce).await;
    }
    let mut settled = session.subscribe();
    loop {
        let done = {
            let view = settled.borrow_and_update();
            !view.is_pending && view.generation == session.issued()
        };
        if done || settled.changed().await.is_err() {
            break;
        }
    }

    drop(session);
    let _ = printer.await;
    Ok(())
}

fn print_view(view: &SearchView, json: bool) -> Result<()> {
    if json {
        let response = SearchResponse {
            query: view.query.raw_text.clone(),
            category: view.query.category,
            path: view.path,
            items: view.items.clone(),
            groups: view.groups(),
        };
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    println!(
        "# {:?} [{}] -> {} item(s) via {:?}",
        view.query.raw_text,
        view.query.category,
        view.items.len(),
        view.path
    );
    print_groups(&view.groups());
    Ok(())
}
