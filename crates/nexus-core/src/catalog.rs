//! The curated tool catalog.
//!
//! A [`Catalog`] is an immutable, ordered list of [`Item`]s. It is built
//! once at startup (from the built-in literal or a JSON file supplied by
//! the application) and only exposes read-only queries afterwards.

use std::collections::HashSet;

use thiserror::Error;

use crate::models::{Category, CategoryFilter, Item, ItemSummary};

/// Reasons a list of items cannot form a catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("item at position {0} has an empty id")]
    EmptyId(usize),
    #[error("duplicate item id: '{0}'")]
    DuplicateId(String),
}

/// Immutable, ordered collection of tools.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Catalog {
    /// Build a catalog, enforcing that every id is non-empty and unique.
    pub fn new(items: Vec<Item>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            if item.id.trim().is_empty() {
                return Err(CatalogError::EmptyId(pos));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(CatalogError::DuplicateId(item.id.clone()));
            }
        }
        Ok(Self { items })
    }

    /// Every item, in insertion order. May be empty.
    pub fn all(&self) -> &[Item] {
        &self.items
    }

    /// Stable-order subsequence of items admitted by `filter`.
    pub fn by_category(&self, filter: CategoryFilter) -> Vec<Item> {
        match filter {
            CategoryFilter::All => self.items.clone(),
            CategoryFilter::Only(c) => self
                .items
                .iter()
                .filter(|item| item.category == c)
                .cloned()
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The built-in directory.
    pub fn builtin() -> Self {
        Self {
            items: builtin_items(),
        }
    }
}

/// Summaries for a candidate pool, as sent to the semantic matcher.
pub fn summaries(items: &[Item]) -> Vec<ItemSummary> {
    items.iter().map(ItemSummary::from).collect()
}

fn tool(
    id: &str,
    name: &str,
    description: &str,
    url: &str,
    category: Category,
    icon: &str,
    tags: &[&str],
) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        url: url.to_string(),
        icon: icon.to_string(),
    }
}

fn builtin_items() -> Vec<Item> {
    use Category::*;

    vec![
        // AI
        tool(
            "deepseek-chat",
            "DeepSeek",
            "国产大模型之光，具备极强的推理能力与代码理解力，极致性价比。",
            "https://chat.deepseek.com",
            Ai,
            "🐳",
            &["AI", "推理", "开源"],
        ),
        tool(
            "kimi-ai",
            "Kimi",
            "月之暗面开发，擅长处理超长上下文，支持数十万字的长文档分析。",
            "https://kimi.moonshot.cn",
            Ai,
            "🌙",
            &["长文本", "国产", "分析"],
        ),
        tool(
            "perplexity-ai",
            "Perplexity",
            "AI 驱动的新一代搜索引擎，实时联网搜索并提供可信的来源引用。",
            "https://www.perplexity.ai",
            Ai,
            "🔍",
            &["搜索", "实时", "学术"],
        ),
        tool(
            "chatgpt-main",
            "ChatGPT",
            "OpenAI 旗舰产品，多模态交互的先行者，覆盖全场景的智能助手。",
            "https://chatgpt.com",
            Ai,
            "🤖",
            &["GPT", "OpenAI", "多模态"],
        ),
        tool(
            "midjourney-web",
            "Midjourney",
            "全球最顶尖的 AI 图像生成工具，创造极具艺术感的视觉作品。",
            "https://www.midjourney.com",
            Ai,
            "🎨",
            &["绘图", "艺术", "设计"],
        ),
        tool(
            "suno-music",
            "Suno",
            "AI 音乐创作平台，只需一段文字即可生成完整且高品质的乐曲。",
            "https://suno.com",
            Ai,
            "🎵",
            &["音乐", "创作", "娱乐"],
        ),
        // Development
        tool(
            "github-portal",
            "GitHub",
            "全球最大的开源协作社区，管理代码版本与 CI/CD 流程。",
            "https://github.com",
            Development,
            "🐙",
            &["Git", "开源", "协作"],
        ),
        tool(
            "tailwind-docs",
            "Tailwind CSS",
            "原子化 CSS 框架，极大提升前端 UI 开发速度与自由度。",
            "https://tailwindcss.com",
            Development,
            "🌊",
            &["CSS", "框架", "高效"],
        ),
        tool(
            "supabase-db",
            "Supabase",
            "Firebase 的开源替代品，提供即时可用的数据库、认证与存储服务。",
            "https://supabase.com",
            Development,
            "⚡",
            &["后端", "DB", "BaaS"],
        ),
        tool(
            "excalidraw-whiteboard",
            "Excalidraw",
            "手绘风格的在线协作白板，适合快速构思架构图与流程。",
            "https://excalidraw.com",
            Development,
            "✏️",
            &["绘图", "白板", "协作"],
        ),
        tool(
            "vercel-ops",
            "Vercel",
            "现代 Web 部署的最佳平台，极致的自动化流程，前端首选。",
            "https://vercel.com",
            Development,
            "▲",
            &["部署", "Next.js", "前端"],
        ),
        // Creative
        tool(
            "figma-design",
            "Figma",
            "基于浏览器的协作式设计工具，UI/UX 行业的标准工作平台。",
            "https://www.figma.com",
            Creative,
            "💎",
            &["UI", "UX", "设计"],
        ),
        tool(
            "dribbble-insp",
            "Dribbble",
            "全球设计师的作品展示社区，获取最新视觉趋势的最佳地点。",
            "https://dribbble.com",
            Creative,
            "🏀",
            &["灵感", "展示", "UI"],
        ),
        tool(
            "pinterest-visuals",
            "Pinterest",
            "视觉发现引擎，寻找室内设计、时尚、摄影等各类创意灵感。",
            "https://pinterest.com",
            Creative,
            "📌",
            &["发现", "美学", "摄影"],
        ),
        // Productivity
        tool(
            "notion-workspace",
            "Notion",
            "全能的数字化笔记与团队协作平台，重塑个人知识管理体系。",
            "https://www.notion.so",
            Productivity,
            "📓",
            &["笔记", "Wiki", "任务"],
        ),
        tool(
            "linear-app",
            "Linear",
            "专为高性能团队打造的任务管理工具，拥有极致的流畅交互。",
            "https://linear.app",
            Productivity,
            "📈",
            &["PM", "任务", "流程"],
        ),
        tool(
            "obsidian-notes",
            "Obsidian",
            "本地优先的第二大脑，基于 Markdown 构建强大的双链笔记网络。",
            "https://obsidian.md",
            Productivity,
            "🔮",
            &["双链", "知识库", "离线"],
        ),
        // Utilities
        tool(
            "raycast-mac",
            "Raycast",
            "Mac 上极速、可扩展的启动器，彻底替代并超越 Spotlight。",
            "https://www.raycast.com",
            Utilities,
            "⚡",
            &["效率", "Mac", "工具"],
        ),
        tool(
            "tinywow-tools",
            "TinyWow",
            "全功能的 PDF、图像、视频在线处理工具箱，完全免费。",
            "https://tinywow.com",
            Utilities,
            "🛠️",
            &["处理", "PDF", "多功能"],
        ),
        tool(
            "product-hunt",
            "Product Hunt",
            "每日新产品发布平台，第一时间发现全球最有趣的软硬件项目。",
            "https://www.producthunt.com",
            Utilities,
            "😺",
            &["趋势", "产品", "社区"],
        ),
        // Personal
        tool(
            "ecommica-deals",
            "Ecommica Deals",
            "海外优惠券聚合平台，汇集全球电商折扣信息，帮你省钱购物。",
            "https://deals.ecommica.com",
            Personal,
            "🎫",
            &["优惠券", "折扣", "电商"],
        ),
    ]
}
