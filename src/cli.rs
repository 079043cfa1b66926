//! CLI commands for poking at a running backend.
//!
//! Each command drives one engine component the way a dashboard screen
//! would and prints what that screen would render.

use clap::Subcommand;
use serde_json::json;

use crate::engine::Engine;
use crate::reactions::ReactionKind;
use crate::search::{resolve_context, SearchOutcome, SearchResults};

/// Engine CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Load and print the category/project/field taxonomy
    Taxonomy,

    /// Show the search context for a location
    Context {
        /// Location pathname, e.g. /dashboard/projects
        path: String,
    },

    /// Run a global search as if typed on the given screen
    Search {
        /// Location pathname of the hosting screen
        #[arg(long, default_value = "/dashboard")]
        path: String,

        /// Search text
        query: String,
    },

    /// Toggle a reaction and print the reconciled aggregate
    React {
        /// Content item id
        #[arg(long)]
        content: String,

        /// Reacting user id
        #[arg(long)]
        user: String,

        /// Reaction kind: like, love, insightful, dislike
        #[arg(long)]
        kind: ReactionKind,
    },

    /// Print the comment thread of a content item
    Comments {
        /// Content item id
        #[arg(long)]
        content: String,
    },
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }

    fn json(value: serde_json::Value) -> Self {
        match serde_json::to_string_pretty(&value) {
            Ok(text) => Self::success(text),
            Err(e) => Self::error(format!("Failed to render output: {}", e)),
        }
    }
}

/// Execute an engine CLI command.
pub async fn execute_command(command: Commands, engine: &Engine) -> CliResult {
    match command {
        Commands::Taxonomy => execute_taxonomy(engine).await,
        Commands::Context { path } => execute_context(&path),
        Commands::Search { path, query } => execute_search(engine, &path, &query).await,
        Commands::React {
            content,
            user,
            kind,
        } => execute_react(engine, &content, &user, kind).await,
        Commands::Comments { content } => execute_comments(engine, &content).await,
    }
}

async fn execute_taxonomy(engine: &Engine) -> CliResult {
    match engine.hierarchy.load_all().await {
        Ok(nodes) => CliResult::json(json!(nodes)),
        Err(e) => CliResult::error(format!("Failed to load taxonomy: {}", e)),
    }
}

fn execute_context(path: &str) -> CliResult {
    let context = resolve_context(path);
    CliResult::json(json!({
        "context": context,
        "searchable": context.is_searchable(),
        "placeholder": context.placeholder(),
    }))
}

async fn execute_search(engine: &Engine, path: &str, query: &str) -> CliResult {
    match engine.search.search_at(path, query).await {
        SearchOutcome::Applied(SearchResults::Projects(projects)) => {
            CliResult::json(json!(projects))
        }
        SearchOutcome::Applied(SearchResults::Strategists(page)) => CliResult::json(json!(page)),
        SearchOutcome::Applied(_) => CliResult::success("No results"),
        SearchOutcome::Delegated => {
            CliResult::success(format!("Query '{}' handed to the hosting screen", query.trim()))
        }
        SearchOutcome::Rejected => CliResult::success(format!(
            "Search is inactive for '{}' or the query is too short",
            path
        )),
        SearchOutcome::Stale => CliResult::success("Superseded by a newer search"),
        SearchOutcome::Failed => CliResult::error("Search failed; see logs"),
    }
}

async fn execute_react(
    engine: &Engine,
    content_id: &str,
    user_id: &str,
    kind: ReactionKind,
) -> CliResult {
    if let Err(e) = engine.reactions.load(content_id, user_id).await {
        return CliResult::error(format!("Failed to load reactions: {}", e));
    }

    match engine.reactions.toggle(content_id, user_id, kind).await {
        Ok(aggregate) => CliResult::json(json!({
            "aggregate": aggregate,
            "mine": engine.reactions.mine(content_id, user_id),
        })),
        Err(e) => CliResult::error(format!("Reaction failed: {}", e)),
    }
}

async fn execute_comments(engine: &Engine, content_id: &str) -> CliResult {
    match engine.comments.load_thread(content_id).await {
        Ok(thread) => CliResult::json(json!(thread)),
        Err(e) => CliResult::error(format!("Failed to load comments: {}", e)),
    }
}
