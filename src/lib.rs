//! # River Nexus
//!
//! A curated tool directory with LLM-assisted smart search, a local
//! substring fallback, and a small chat assistant.
//!
//! The pure pipeline (catalog, resolver, grouping, preferences, chat
//! transcript) lives in the runtime-free `nexus-core` crate. This crate adds
//! everything that needs I/O: configuration, the language-model HTTP
//! clients, the debounced search session, a JSON-file preference store, the
//! HTTP server, and the `nexus` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────────┐   ┌───────────┐
//! │  input   │──▶│ Debouncer │──▶│   Resolver   │──▶│  grouped  │
//! │ text/cat │   │  400 ms   │   │ remote→local │   │   view    │
//! └──────────┘   └───────────┘   └──────┬───────┘   └───────────┘
//!                                       │
//!                              ┌────────┴────────┐
//!                              ▼                 ▼
//!                        ┌──────────┐      ┌──────────┐
//!                        │  Gemini  │      │  OpenAI  │
//!                        │          │      │ /Ollama  │
//!                        └──────────┘      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! nexus tools --category ai          # list the AI tools
//! nexus search "写代码"              # one-shot smart search
//! nexus watch                        # debounced search from stdin
//! nexus chat "推荐一个笔记工具"
//! nexus serve                        # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`app`] | Wiring of catalog, provider, resolver and preferences |
//! | [`llm`] | Gemini / OpenAI-compatible providers |
//! | [`debounce`] | Trailing debounce on tokio |
//! | [`session`] | Debounced search session with generation tokens |
//! | [`search`] | One-shot and interactive search commands |
//! | [`tools`] | Catalog listing, favorites, usage and hot tools |
//! | [`chat`] | Assistant replies and the interactive chat |
//! | [`file_store`] | JSON-file key-value store |
//! | [`analytics`] | Structured usage events |
//! | [`server`] | JSON HTTP server |

pub mod analytics;
pub mod app;
pub mod chat;
pub mod config;
pub mod debounce;
pub mod file_store;
pub mod llm;
pub mod search;
pub mod server;
pub mod session;
pub mod tools;
