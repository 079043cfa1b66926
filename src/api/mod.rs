//! REST client for the strategist backend.
//!
//! [`ApiClient`] implements every remote trait the engine components depend
//! on, so one client instance backs the hierarchy cache, the reaction
//! ledger, the comment store, the search dispatcher and the report feed.

mod client;
mod remote;
/// Wire DTOs and id normalisation helpers.
pub mod types;


pub use client::ApiClient;
