//! # River Nexus Core
//!
//! Shared, runtime-free logic for River Nexus: data models, the curated
//! tool catalog, local substring matching, the smart-search resolver,
//! category grouping, user preferences over a key-value port, and the
//! chat-session transcript.
//!
//! This crate contains no tokio, reqwest, or filesystem I/O. Remote
//! collaborators (semantic matching, conversational assistant) are
//! expressed as async traits and injected by the application crate.

pub mod catalog;
pub mod chat;
pub mod group;
pub mod kv;
pub mod matcher;
pub mod models;
pub mod prefs;
pub mod resolver;
