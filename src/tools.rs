//! Catalog and preference commands: `tools`, `use`, `fav`, `prefs`, `hot`.

use anyhow::{bail, Result};
use chrono::{TimeZone, Utc};
use nexus_core::group::group_by_category;
use nexus_core::models::{CategoryFilter, Item, UserPreferences};
use serde::Serialize;

use crate::analytics;
use crate::app::App;
use crate::search::print_groups;

/// A hot tool with its click count.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HotTool {
    pub id: String,
    pub clicks: u64,
}

/// Look up a tool, failing with a readable error for unknown ids.
pub fn require_item<'a>(app: &'a App, id: &str) -> Result<&'a Item> {
    match app.item(id) {
        Some(item) => Ok(item),
        None => bail!("Unknown tool id: '{}'. Run `nexus tools` to list ids.", id),
    }
}

/// Record that a tool was opened: recent usage, click count and an
/// analytics event.
pub fn open_tool(app: &App, id: &str) -> Result<UserPreferences> {
    let item = require_item(app, id)?;
    Ok(record_open(app, item))
}

fn record_open(app: &App, item: &Item) -> UserPreferences {
    let prefs = app.prefs.record_usage(&item.id, Utc::now());
    app.prefs.record_click(&item.id);
    analytics::track_tool_click(&item.id, &item.name, item.category.slug());
    prefs
}

/// Toggle a favorite; returns whether the tool is now a favorite.
pub fn toggle_favorite(app: &App, id: &str) -> Result<bool> {
    let item = require_item(app, id)?;
    let added = app.prefs.toggle_favorite(&item.id, Utc::now());
    analytics::track_favorite(&item.id, added);
    Ok(added)
}

/// Hottest tools by click count, unknown ids included.
pub fn hot_tools(app: &App, limit: usize) -> Vec<HotTool> {
    let stats = app.prefs.click_stats();
    app.prefs
        .hot_tools(limit)
        .into_iter()
        .map(|id| HotTool {
            clicks: stats.get(&id).copied().unwrap_or(0),
            id,
        })
        .collect()
}

pub fn run_tools(app: &App, category: CategoryFilter, json: bool) -> Result<()> {
    let items = app.catalog.by_category(category);
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    print_groups(&group_by_category(&items, category));
    Ok(())
}

pub fn run_use(app: &App, id: &str) -> Result<()> {
    let item = require_item(app, id)?;
    record_open(app, item);
    println!("{}", item.url);
    Ok(())
}

pub fn run_fav(app: &App, id: &str) -> Result<()> {
    let added = toggle_favorite(app, id)?;
    if added {
        println!("★ {} added to favorites", id);
    } else {
        println!("☆ {} removed from favorites", id);
    }
    Ok(())
}

pub fn run_prefs(app: &App, json: bool) -> Result<()> {
    let prefs = app.prefs.load();
    if json {
        println!("{}", serde_json::to_string_pretty(&prefs)?);
        return Ok(());
    }

    println!("Favorites ({}):", prefs.favorites.len());
    for id in &prefs.favorites {
        println!("  {}", display_name(app, id));
    }
    println!();
    println!("Recently used ({}):", prefs.recently_used.len());
    for usage in &prefs.recently_used {
        let when = Utc
            .timestamp_millis_opt(usage.timestamp)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "  {:<28} x{:<4} {}",
            display_name(app, &usage.tool_id),
            usage.count,
            when
        );
    }
    Ok(())
}

pub fn run_hot(app: &App, limit: usize, json: bool) -> Result<()> {
    let hot = hot_tools(app, limit);
    if json {
        println!("{}", serde_json::to_string_pretty(&hot)?);
        return Ok(());
    }
    if hot.is_empty() {
        println!("No clicks recorded.");
        return Ok(());
    }
    for (i, tool) in hot.iter().enumerate() {
        println!("{}. {} ({} clicks)", i + 1, display_name(app, &tool.id), tool.clicks);
    }
    Ok(())
}

fn display_name(app: &App, id: &str) -> String {
    match app.item(id) {
        Some(item) => format!("{} [{}]", item.name, item.id),
        None => id.to_string(),
    }
}
