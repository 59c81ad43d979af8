//! In-memory wiki store for testing and embedding.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::WikiStore;
use crate::error::WikiError;
use crate::search::SearchQuery;
use crate::types::{Revision, RevisionDraft, RevisionId, User, UserDraft, UserId};

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// Revision not found.
    #[error("Revision not found: {0}")]
    RevisionNotFound(RevisionId),
    /// Parent revision named by a draft does not exist.
    #[error("Parent revision not found: {0}")]
    ParentNotFound(RevisionId),
    /// User not found (or deleted, where a live user is required).
    #[error("User not found: {0}")]
    UserNotFound(UserId),
    /// Acting user has been deleted.
    #[error("User is deleted: {0}")]
    UserDeleted(UserId),
    /// userName already taken.
    #[error("userName already taken: {0}")]
    DuplicateUserName(String),
    /// Email already taken.
    #[error("email already taken: {0}")]
    DuplicateEmail(String),
}

impl From<InMemoryError> for WikiError {
    fn from(e: InMemoryError) -> Self {
        match e {
            InMemoryError::RevisionNotFound(id) | InMemoryError::ParentNotFound(id) => {
                WikiError::revision_not_found(id)
            }
            InMemoryError::UserNotFound(id) => WikiError::user_not_found(id),
            InMemoryError::UserDeleted(id) => WikiError::Forbidden(format!("account {} is deleted", id)),
            InMemoryError::DuplicateUserName(_) | InMemoryError::DuplicateEmail(_) => {
                WikiError::Conflict(e.to_string())
            }
        }
    }
}

/// Everything guarded by the store lock.
///
/// Uses BTreeMap/BTreeSet for deterministic iteration order.
#[derive(Debug, Default)]
struct State {
    /// Revisions by ID.
    revisions: BTreeMap<RevisionId, Revision>,
    /// Parent -> Children mapping.
    children: BTreeMap<RevisionId, BTreeSet<RevisionId>>,
    /// Users by ID.
    users: BTreeMap<UserId, User>,
    /// Author -> created revisions.
    created: BTreeMap<UserId, BTreeSet<RevisionId>>,
    /// User -> liked revisions.
    likes: BTreeMap<UserId, BTreeSet<RevisionId>>,
    /// Follower -> followed users.
    follows: BTreeMap<UserId, BTreeSet<UserId>>,
    /// Last assigned revision id.
    last_revision_id: i64,
    /// Last assigned user id.
    last_user_id: i64,
}

impl State {
    /// A user may act only while present and not tombstoned.
    fn require_live(&self, id: UserId) -> Result<(), InMemoryError> {
        match self.users.get(&id) {
            Some(user) if user.is_deleted => Err(InMemoryError::UserDeleted(id)),
            Some(_) => Ok(()),
            None => Err(InMemoryError::UserNotFound(id)),
        }
    }

    fn link_revision(&mut self, revision: Revision) {
        if let Some(parent) = revision.parent.revision_id() {
            self.children.entry(parent).or_default().insert(revision.id);
        }
        self.created.entry(revision.author).or_default().insert(revision.id);
        self.last_revision_id = self.last_revision_id.max(revision.id.get());
        self.revisions.insert(revision.id, revision);
    }
}

/// In-memory wiki store.
///
/// Every method takes the single lock once, so each compound mutation is
/// atomic with respect to every other call. The lock is never held across
/// an await point.
#[derive(Debug, Default)]
pub struct InMemoryWikiStore {
    state: RwLock<State>,
}

impl InMemoryWikiStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a revision as-is, bypassing parent and author checks.
    ///
    /// Intended for fixtures and imports. Later inserts get ids above the
    /// highest loaded id.
    pub fn import_revision(&self, revision: Revision) {
        self.state.write().link_revision(revision);
    }

    /// Get number of revisions.
    pub fn num_revisions(&self) -> usize {
        self.state.read().revisions.len()
    }

    /// Get number of users.
    pub fn num_users(&self) -> usize {
        self.state.read().users.len()
    }
}

#[async_trait]
impl WikiStore for InMemoryWikiStore {
    type Error = InMemoryError;

    async fn insert_revision(&self, draft: RevisionDraft) -> Result<Revision, Self::Error> {
        let mut state = self.state.write();

        state.require_live(draft.author)?;
        if let Some(parent) = draft.parent.revision_id() {
            if !state.revisions.contains_key(&parent) {
                return Err(InMemoryError::ParentNotFound(parent));
            }
        }

        let id = RevisionId::new(state.last_revision_id + 1);
        let revision = Revision::from_draft(id, draft, Utc::now());
        state.link_revision(revision.clone());
        Ok(revision)
    }

    async fn get_revision(&self, id: RevisionId) -> Result<Option<Revision>, Self::Error> {
        Ok(self.state.read().revisions.get(&id).cloned())
    }

    async fn get_children(&self, id: RevisionId) -> Result<Vec<RevisionId>, Self::Error> {
        Ok(self.state.read()
            .children
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn increment_views(&self, id: RevisionId) -> Result<Option<Revision>, Self::Error> {
        let mut state = self.state.write();
        Ok(state.revisions.get_mut(&id).map(|revision| {
            revision.views += 1;
            revision.clone()
        }))
    }

    async fn search_revisions(&self, query: &SearchQuery) -> Result<Vec<Revision>, Self::Error> {
        let state = self.state.read();
        Ok(state.revisions
            .values()
            .filter(|r| {
                let author = state.users
                    .get(&r.author)
                    .map(|u| u.user_name.as_str())
                    .unwrap_or_default();
                query.matches(r, author)
            })
            .cloned()
            .collect())
    }

    async fn all_revisions(&self) -> Result<Vec<Revision>, Self::Error> {
        Ok(self.state.read().revisions.values().cloned().collect())
    }

    async fn created_revisions(&self, user: UserId) -> Result<Vec<RevisionId>, Self::Error> {
        Ok(self.state.read()
            .created
            .get(&user)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn insert_user(&self, draft: UserDraft) -> Result<User, Self::Error> {
        let mut state = self.state.write();

        if state.users.values().any(|u| u.has_user_name(&draft.user_name)) {
            return Err(InMemoryError::DuplicateUserName(draft.user_name));
        }
        if state.users.values().any(|u| u.has_email(&draft.email)) {
            return Err(InMemoryError::DuplicateEmail(draft.email));
        }

        state.last_user_id += 1;
        let user = User::from_draft(UserId::new(state.last_user_id), draft, Utc::now());
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error> {
        Ok(self.state.read().users.get(&id).cloned())
    }

    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>, Self::Error> {
        Ok(self.state.read()
            .users
            .values()
            .find(|u| u.has_user_name(user_name))
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Self::Error> {
        Ok(self.state.read()
            .users
            .values()
            .find(|u| u.has_email(email))
            .cloned())
    }

    async fn find_active_user_by_login(&self, identifier: &str) -> Result<Option<User>, Self::Error> {
        Ok(self.state.read()
            .users
            .values()
            .filter(|u| !u.is_deleted)
            .find(|u| u.has_user_name(identifier) || u.has_email(identifier))
            .cloned())
    }

    async fn tombstone_user(&self, id: UserId) -> Result<Option<User>, Self::Error> {
        let mut state = self.state.write();

        let user = match state.users.get_mut(&id) {
            Some(user) => {
                user.is_deleted = true;
                user.clone()
            }
            None => return Ok(None),
        };

        for followed in state.follows.values_mut() {
            followed.remove(&id);
        }
        Ok(Some(user))
    }

    async fn add_like(&self, user: UserId, revision: RevisionId) -> Result<bool, Self::Error> {
        let mut state = self.state.write();

        state.require_live(user)?;
        if !state.revisions.contains_key(&revision) {
            return Err(InMemoryError::RevisionNotFound(revision));
        }
        Ok(state.likes.entry(user).or_default().insert(revision))
    }

    async fn remove_like(&self, user: UserId, revision: RevisionId) -> Result<bool, Self::Error> {
        Ok(self.state.write()
            .likes
            .get_mut(&user)
            .map(|set| set.remove(&revision))
            .unwrap_or(false))
    }

    async fn count_likers(&self, revision: RevisionId) -> Result<usize, Self::Error> {
        Ok(self.state.read()
            .likes
            .values()
            .filter(|set| set.contains(&revision))
            .count())
    }

    async fn is_liked(&self, user: UserId, revision: RevisionId) -> Result<bool, Self::Error> {
        Ok(self.state.read()
            .likes
            .get(&user)
            .map(|set| set.contains(&revision))
            .unwrap_or(false))
    }

    async fn liked_revisions(&self, user: UserId) -> Result<Vec<RevisionId>, Self::Error> {
        Ok(self.state.read()
            .likes
            .get(&user)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn add_follow(&self, follower: UserId, target: UserId) -> Result<bool, Self::Error> {
        let mut state = self.state.write();

        state.require_live(follower)?;
        match state.users.get(&target) {
            Some(u) if !u.is_deleted => {}
            _ => return Err(InMemoryError::UserNotFound(target)),
        }
        Ok(state.follows.entry(follower).or_default().insert(target))
    }

    async fn remove_follow(&self, follower: UserId, target: UserId) -> Result<bool, Self::Error> {
        Ok(self.state.write()
            .follows
            .get_mut(&follower)
            .map(|set| set.remove(&target))
            .unwrap_or(false))
    }

    async fn followed_users(&self, user: UserId) -> Result<Vec<UserId>, Self::Error> {
        Ok(self.state.read()
            .follows
            .get(&user)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn followers(&self, user: UserId) -> Result<Vec<UserId>, Self::Error> {
        Ok(self.state.read()
            .follows
            .iter()
            .filter(|(_, followed)| followed.contains(&user))
            .map(|(follower, _)| *follower)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParentRef;

    fn user_draft(name: &str) -> UserDraft {
        UserDraft {
            user_name: name.to_string(),
            first_name: "first".to_string(),
            last_name: "last".to_string(),
            email: format!("{}@email.com", name),
            password_hash: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_revision() {
        let store = InMemoryWikiStore::new();
        let author = store.insert_user(user_draft("alice")).await.unwrap();

        let root = store
            .insert_revision(RevisionDraft::new("t", "c", ParentRef::Root, author.id))
            .await
            .unwrap();
        assert_eq!(root.views, 0);

        let retrieved = store.get_revision(root.id).await.unwrap();
        assert_eq!(retrieved, Some(root.clone()));
        assert_eq!(store.created_revisions(author.id).await.unwrap(), vec![root.id]);
    }

    #[tokio::test]
    async fn test_ids_strictly_increase() {
        let store = InMemoryWikiStore::new();
        let author = store.insert_user(user_draft("alice")).await.unwrap();

        let mut last = 0;
        for i in 0..5 {
            let r = store
                .insert_revision(RevisionDraft::new(format!("t{}", i), "", ParentRef::Root, author.id))
                .await
                .unwrap();
            assert!(r.id.get() > last);
            last = r.id.get();
        }
    }

    #[tokio::test]
    async fn test_missing_parent_rejected_without_write() {
        let store = InMemoryWikiStore::new();
        let author = store.insert_user(user_draft("alice")).await.unwrap();

        let err = store
            .insert_revision(RevisionDraft::new(
                "t",
                "c",
                ParentRef::Revision(RevisionId::new(42)),
                author.id,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, InMemoryError::ParentNotFound(_)));
        assert_eq!(store.num_revisions(), 0);
        assert!(store.created_revisions(author.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_children_ordered() {
        let store = InMemoryWikiStore::new();
        let author = store.insert_user(user_draft("alice")).await.unwrap();
        let root = store
            .insert_revision(RevisionDraft::new("t", "c", ParentRef::Root, author.id))
            .await
            .unwrap();
        let a = store
            .insert_revision(RevisionDraft::new("t", "a", ParentRef::Revision(root.id), author.id))
            .await
            .unwrap();
        let b = store
            .insert_revision(RevisionDraft::new("t", "b", ParentRef::Revision(root.id), author.id))
            .await
            .unwrap();

        assert_eq!(store.get_children(root.id).await.unwrap(), vec![a.id, b.id]);
        assert!(store.get_children(a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_user_ignores_case() {
        let store = InMemoryWikiStore::new();
        store.insert_user(user_draft("alice")).await.unwrap();

        let err = store.insert_user(user_draft("ALICE")).await.unwrap_err();
        assert!(matches!(err, InMemoryError::DuplicateUserName(_)));

        let mut other = user_draft("bob");
        other.email = "Alice@Email.com".to_string();
        let err = store.insert_user(other).await.unwrap_err();
        assert!(matches!(err, InMemoryError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn test_tombstone_cascades_follow_edges() {
        let store = InMemoryWikiStore::new();
        let a = store.insert_user(user_draft("a")).await.unwrap();
        let b = store.insert_user(user_draft("b")).await.unwrap();
        let c = store.insert_user(user_draft("c")).await.unwrap();

        store.add_follow(a.id, b.id).await.unwrap();
        store.add_follow(c.id, b.id).await.unwrap();
        store.add_follow(b.id, a.id).await.unwrap();

        let deleted = store.tombstone_user(b.id).await.unwrap().unwrap();
        assert!(deleted.is_deleted);
        assert!(store.followers(b.id).await.unwrap().is_empty());
        // The deleted user's own follows are kept.
        assert_eq!(store.followed_users(b.id).await.unwrap(), vec![a.id]);

        let err = store.add_follow(a.id, b.id).await.unwrap_err();
        assert!(matches!(err, InMemoryError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_deleted_user_cannot_act() {
        let store = InMemoryWikiStore::new();
        let a = store.insert_user(user_draft("a")).await.unwrap();
        let b = store.insert_user(user_draft("b")).await.unwrap();
        let r = store
            .insert_revision(RevisionDraft::new("t", "c", ParentRef::Root, a.id))
            .await
            .unwrap();
        store.tombstone_user(a.id).await.unwrap();

        let err = store
            .insert_revision(RevisionDraft::new("t", "c2", ParentRef::Revision(r.id), a.id))
            .await
            .unwrap_err();
        assert!(matches!(err, InMemoryError::UserDeleted(_)));
        assert!(matches!(store.add_like(a.id, r.id).await, Err(InMemoryError::UserDeleted(_))));
        assert!(matches!(store.add_follow(a.id, b.id).await, Err(InMemoryError::UserDeleted(_))));

        assert_eq!(store.num_revisions(), 1);
        assert_eq!(store.count_likers(r.id).await.unwrap(), 0);
        assert!(store.followed_users(a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_likes_are_sets() {
        let store = InMemoryWikiStore::new();
        let a = store.insert_user(user_draft("a")).await.unwrap();
        let r = store
            .insert_revision(RevisionDraft::new("t", "c", ParentRef::Root, a.id))
            .await
            .unwrap();

        assert!(store.add_like(a.id, r.id).await.unwrap());
        assert!(!store.add_like(a.id, r.id).await.unwrap());
        assert_eq!(store.count_likers(r.id).await.unwrap(), 1);
        assert!(store.remove_like(a.id, r.id).await.unwrap());
        assert!(!store.remove_like(a.id, r.id).await.unwrap());
        assert_eq!(store.count_likers(r.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_import_revision_advances_ids() {
        let store = InMemoryWikiStore::new();
        let a = store.insert_user(user_draft("a")).await.unwrap();
        store.import_revision(Revision::from_draft(
            RevisionId::new(10),
            RevisionDraft::new("t", "c", ParentRef::Root, a.id),
            Utc::now(),
        ));

        let next = store
            .insert_revision(RevisionDraft::new("t2", "c", ParentRef::Root, a.id))
            .await
            .unwrap();
        assert_eq!(next.id, RevisionId::new(11));

        let all: Vec<RevisionId> = store.all_revisions().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(all, vec![RevisionId::new(10), next.id]);
    }
}
