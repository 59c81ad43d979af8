//! # social-wiki-core
//!
//! A wiki whose pages are trees of immutable revisions, with likes, follows
//! and cookie-backed sessions.
//!
//! ## Core Contract
//!
//! 1. Editing never mutates a revision: it appends a child whose parent is
//!    the edited revision
//! 2. The history of a page is the whole tree, identical from any member
//! 3. Account deletion is a tombstone: authored revisions stay, follow edges
//!    pointing at the account are removed atomically
//!
//! ## Architecture
//!
//! ```text
//! Caller → Wiki → RevisionStore / SocialGraph / SessionGuard / SearchIndex
//!                    ↓
//!              WikiStore (Postgres or Memory)
//! ```
//!
//! ## Ordering Guarantees
//!
//! - Revision ids strictly increase, so id order is creation order
//! - History lists are ascending by id
//! - Search results are ascending by id, with tie groups most recent first

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod password;
pub mod revisions;
pub mod search;
pub mod session;
pub mod social;
pub mod store;
pub mod types;
pub mod wiki;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use config::WikiConfig;
pub use error::{WikiError, WikiResult};
pub use fingerprint::{compute_fingerprint, verify_fingerprint};
pub use revisions::RevisionStore;
pub use search::{SearchIndex, SearchQuery};
pub use session::{CookieCheck, Session, SessionGuard};
pub use social::SocialGraph;
pub use store::{InMemoryWikiStore, WikiStore};
#[cfg(feature = "postgres")]
pub use store::PostgresWikiStore;
pub use types::{
    Cookie, NewUser, ParentRef, Revision, RevisionDetail, RevisionDraft, RevisionId,
    RevisionSummary, User, UserId, ROOT_PARENT_ID,
};
pub use wiki::Wiki;

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};
