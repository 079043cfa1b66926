//! # Strategist Engine
//!
//! Interaction and discovery engine behind the strategist dashboard. It
//! keeps client-side views of server-owned data consistent while several
//! independent components read and mutate it concurrently.
//!
//! ## Features
//!
//! - **Hierarchy Cache**: category → project → field taxonomy, loaded once
//! - **Reaction Ledger**: one reaction per user per item, optimistic with
//!   server-reconciled aggregates
//! - **Comment Threads**: lazily loaded, server-authoritative threads
//! - **Cascading Filter**: three-level selection that resets downstream
//!   choices
//! - **Context-Aware Search**: one input routed by location, newest response
//!   wins
//! - **Signal Bus**: named, typed signals between decoupled components
//!
//! ## Architecture
//!
//! ```text
//! Search bar ──▶ SearchDispatcher ──▶ SignalBus ──▶ FeedListener ──▶ ReportFeed
//!                      │                                               │
//!                      ▼                                               ▼
//!                  ApiClient (REST) ◀── HierarchyCache / ReactionLedger / CommentThreadStore
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use strategist_engine::{Config, Engine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Engine::new(Config::from_env()?)?;
//!     engine.hierarchy.load_all().await?;
//!
//!     let mut filter = engine.filter();
//!     let projects = filter.set_category("1")?;
//!     println!("{} projects", projects.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// REST client and wire types.
pub mod api;
/// Command-line subcommands.
pub mod cli;
/// Comment threads per content item.
pub mod comments;
/// Configuration management.
pub mod config;
/// Component wiring.
pub mod engine;
/// Error types and result aliases for the application.
pub mod error;
/// Content lists driven by bus signals.
pub mod feed;
/// Cascading category/project/field filter.
pub mod filter;
/// Taxonomy types and cache.
pub mod hierarchy;
/// Reaction ledger.
pub mod reactions;
/// Context-aware global search.
pub mod search;
/// Cross-component signal bus.
pub mod signals;

pub use api::ApiClient;
pub use config::Config;
pub use engine::Engine;
pub use error::{AppError, AppResult};
