//! Core data models used throughout River Nexus.
//!
//! These types represent the catalog items, category filters, chat
//! transcript entries, and persisted user preferences that flow through
//! the search and assistant pipelines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of tool categories.
///
/// Declaration order is the fixed display order used when grouping
/// results under the `All` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Development,
    Creative,
    Productivity,
    Ai,
    Utilities,
    Personal,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 6] = [
        Category::Development,
        Category::Creative,
        Category::Productivity,
        Category::Ai,
        Category::Utilities,
        Category::Personal,
    ];

    /// Stable machine-readable name (`"development"`, `"ai"`, ...).
    pub fn slug(self) -> &'static str {
        match self {
            Category::Development => "development",
            Category::Creative => "creative",
            Category::Productivity => "productivity",
            Category::Ai => "ai",
            Category::Utilities => "utilities",
            Category::Personal => "personal",
        }
    }

    /// Human-facing label shown in the directory.
    pub fn label(self) -> &'static str {
        match self {
            Category::Development => "开发",
            Category::Creative => "创意",
            Category::Productivity => "生产力",
            Category::Ai => "人工智能",
            Category::Utilities => "工具",
            Category::Personal => "个人作品",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Accepts either the slug (case-insensitive) or the display label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(needle) || c.label() == needle)
            .ok_or_else(|| {
                format!(
                    "Unknown category: '{}'. Expected one of: all, {}",
                    needle,
                    Category::ALL.map(|c| c.slug()).join(", ")
                )
            })
    }
}

/// Category scope for a query: every item, or one category only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub const ALL_LABEL: &'static str = "全部";

    /// Whether `category` falls inside this scope.
    pub fn admits(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(c) => c.fmt(f),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        if needle.is_empty() || needle.eq_ignore_ascii_case("all") || needle == Self::ALL_LABEL {
            return Ok(CategoryFilter::All);
        }
        needle.parse().map(CategoryFilter::Only)
    }
}

impl TryFrom<String> for CategoryFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        value.to_string()
    }
}

impl From<Category> for CategoryFilter {
    fn from(value: Category) -> Self {
        CategoryFilter::Only(value)
    }
}

/// A curated tool in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable identifier; the join key between remote matches and local records.
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    pub url: String,
    #[serde(default)]
    pub icon: String,
}

/// The subset of an [`Item`] sent to the semantic matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub tags: Vec<String>,
}

impl From<&Item> for ItemSummary {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            tags: item.tags.clone(),
        }
    }
}

/// Speaker of a chat transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry in the assistant chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp,
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp,
        }
    }
}

/// A recently-used tool entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentUsage {
    pub tool_id: String,
    /// Last use, milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Number of recorded uses.
    pub count: u32,
}

/// Browser-local preferences record, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub favorites: Vec<String>,
    #[serde(default)]
    pub recently_used: Vec<RecentUsage>,
    #[serde(default)]
    pub last_updated: i64,
}
