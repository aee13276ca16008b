//! Usage events, emitted as structured `tracing` events on the `analytics`
//! target. Route them with e.g. `RUST_LOG=analytics=info`.

use nexus_core::models::CategoryFilter;

/// Longest query prefix recorded with a search event.
const MAX_QUERY_CHARS: usize = 50;

/// Record a settled search. Queries shorter than two characters are not recorded.
pub fn track_search(query: &str, results: usize) {
    let query = query.trim();
    if query.chars().count() < 2 {
        return;
    }
    let query: String = query.chars().take(MAX_QUERY_CHARS).collect();
    tracing::info!(target: "analytics", event = "search", query = %query, results);
}

pub fn track_category_switch(category: CategoryFilter) {
    tracing::info!(target: "analytics", event = "category_switch", category = %category);
}

pub fn track_tool_click(tool_id: &str, tool_name: &str, category: &str) {
    tracing::info!(target: "analytics", event = "tool_click", tool_id, tool_name, category);
}

pub fn track_favorite(tool_id: &str, added: bool) {
    let action = if added { "add" } else { "remove" };
    tracing::info!(target: "analytics", event = "favorite_action", tool_id, action);
}

/// Direction of a chat exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatEvent {
    /// The user sent a message.
    Send,
    /// The assistant's reply arrived.
    Receive,
}

impl ChatEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatEvent::Send => "send",
            ChatEvent::Receive => "receive",
        }
    }
}

pub fn track_chat(kind: ChatEvent) {
    tracing::info!(target: "analytics", event = "chat_interaction", kind = kind.as_str());
}
