//! Wiki storage backends.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;

use crate::error::WikiError;
use crate::search::SearchQuery;
use crate::types::{Revision, RevisionDraft, RevisionId, User, UserDraft, UserId};

/// Trait for wiki storage backends.
///
/// The core layers validation on top of these primitives. Methods that
/// change more than one record are atomic: a backend must apply them in a
/// single transaction (or under a single lock) so concurrent callers never
/// observe a partial result.
///
/// Every list is returned in ascending id order.
#[async_trait]
pub trait WikiStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + Into<WikiError>;

    /// Persist a revision and record it in its author's created pages.
    ///
    /// Atomic. Fails if the author is missing or deleted, or if the draft names
    /// a parent that does not exist in the snapshot the insert runs against.
    /// The author check is serialized with [`WikiStore::tombstone_user`]. Assigns a
    /// strictly increasing id, the creation time and a zero view counter.
    async fn insert_revision(&self, draft: RevisionDraft) -> Result<Revision, Self::Error>;

    /// Fetch a revision by id.
    async fn get_revision(&self, id: RevisionId) -> Result<Option<Revision>, Self::Error>;

    /// Fetch the ids of revisions whose parent is `id`.
    async fn get_children(&self, id: RevisionId) -> Result<Vec<RevisionId>, Self::Error>;

    /// Add one to a revision's view counter and return the updated revision.
    ///
    /// Atomic: concurrent calls never lose an increment.
    async fn increment_views(&self, id: RevisionId) -> Result<Option<Revision>, Self::Error>;

    /// Revisions matching a case-insensitive substring query.
    async fn search_revisions(&self, query: &SearchQuery) -> Result<Vec<Revision>, Self::Error>;

    /// Every revision, in id order.
    async fn all_revisions(&self) -> Result<Vec<Revision>, Self::Error>;

    /// Ids of revisions a user authored.
    async fn created_revisions(&self, user: UserId) -> Result<Vec<RevisionId>, Self::Error>;

    /// Persist a new user.
    ///
    /// Atomic. Fails if the userName or email is already taken by any user,
    /// deleted or not, ignoring case.
    async fn insert_user(&self, draft: UserDraft) -> Result<User, Self::Error>;

    /// Fetch a user by id (deleted users included).
    async fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error>;

    /// Fetch a user by userName, ignoring case (deleted users included).
    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>, Self::Error>;

    /// Fetch a user by email, ignoring case (deleted users included).
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Self::Error>;

    /// Fetch the non-deleted user whose userName or email matches
    /// `identifier`, ignoring case.
    async fn find_active_user_by_login(&self, identifier: &str) -> Result<Option<User>, Self::Error>;

    /// Mark a user deleted and remove every follow edge pointing at them.
    ///
    /// Atomic, and serialized with every insert that checks the user is live
    /// ([`WikiStore::insert_revision`], [`WikiStore::add_like`],
    /// [`WikiStore::add_follow`]). Returns `None` if the user does not exist.
    async fn tombstone_user(&self, id: UserId) -> Result<Option<User>, Self::Error>;

    /// Add a like. Returns whether the like was new.
    ///
    /// Fails if the user is missing or deleted, or if the revision does not
    /// exist.
    async fn add_like(&self, user: UserId, revision: RevisionId) -> Result<bool, Self::Error>;

    /// Remove a like. Returns whether a like was removed.
    async fn remove_like(&self, user: UserId, revision: RevisionId) -> Result<bool, Self::Error>;

    /// Number of users liking a revision.
    async fn count_likers(&self, revision: RevisionId) -> Result<usize, Self::Error>;

    /// Whether a user likes a revision.
    async fn is_liked(&self, user: UserId, revision: RevisionId) -> Result<bool, Self::Error>;

    /// Ids of revisions a user likes.
    async fn liked_revisions(&self, user: UserId) -> Result<Vec<RevisionId>, Self::Error>;

    /// Add a follow edge. Returns whether the edge was new.
    ///
    /// Atomic: fails if either the follower or the target does not exist or
    /// is deleted at the moment of insertion.
    async fn add_follow(&self, follower: UserId, target: UserId) -> Result<bool, Self::Error>;

    /// Remove a follow edge. Returns whether an edge was removed.
    async fn remove_follow(&self, follower: UserId, target: UserId) -> Result<bool, Self::Error>;

    /// Ids of users `user` follows.
    async fn followed_users(&self, user: UserId) -> Result<Vec<UserId>, Self::Error>;

    /// Ids of users following `user`.
    async fn followers(&self, user: UserId) -> Result<Vec<UserId>, Self::Error>;
}

pub use memory::InMemoryWikiStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresWikiStore;
