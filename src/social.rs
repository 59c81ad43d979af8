//! Likes, follows and account deletion.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{WikiError, WikiResult};
use crate::store::WikiStore;
use crate::types::{Revision, RevisionId, User, UserId};

/// Social relations between users and revisions.
///
/// Likes and follows are sets: adding twice or removing twice is a no-op.
pub struct SocialGraph<S: WikiStore> {
    store: Arc<S>,
}

impl<S: WikiStore> Clone for SocialGraph<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store) }
    }
}

impl<S: WikiStore> SocialGraph<S> {
    /// Create a social graph over a backend.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Like a revision.
    pub async fn like(&self, user: UserId, revision: RevisionId) -> WikiResult<()> {
        let added = self.store.add_like(user, revision).await.map_err(WikiError::from_store)?;
        info!(user_id = %user, revision_id = %revision, added, "Revision liked");
        Ok(())
    }

    /// Withdraw a like.
    pub async fn unlike(&self, user: UserId, revision: RevisionId) -> WikiResult<()> {
        let removed = self.store.remove_like(user, revision).await.map_err(WikiError::from_store)?;
        info!(user_id = %user, revision_id = %revision, removed, "Revision unliked");
        Ok(())
    }

    /// Number of users liking a revision.
    pub async fn count_likers(&self, revision: RevisionId) -> WikiResult<usize> {
        self.store.count_likers(revision).await.map_err(WikiError::from_store)
    }

    /// Whether `user` likes `revision`.
    pub async fn is_liked(&self, user: UserId, revision: RevisionId) -> WikiResult<bool> {
        self.store.is_liked(user, revision).await.map_err(WikiError::from_store)
    }

    /// Follow a live user. Following yourself is allowed.
    pub async fn follow(&self, user: UserId, target: UserId) -> WikiResult<()> {
        let added = self.store.add_follow(user, target).await.map_err(WikiError::from_store)?;
        info!(user_id = %user, target_id = %target, added, "User followed");
        Ok(())
    }

    /// Stop following a user.
    pub async fn unfollow(&self, user: UserId, target: UserId) -> WikiResult<()> {
        let removed = self.store.remove_follow(user, target).await.map_err(WikiError::from_store)?;
        info!(user_id = %user, target_id = %target, removed, "User unfollowed");
        Ok(())
    }

    /// Soft-delete a user and drop every follow edge pointing at them.
    ///
    /// The user's own follows and likes stay, and authored revisions are
    /// untouched. Running it again on a deleted user repeats the cascade.
    pub async fn delete_user(&self, user: UserId) -> WikiResult<User> {
        let deleted = self
            .store
            .tombstone_user(user)
            .await
            .map_err(WikiError::from_store)?
            .ok_or_else(|| WikiError::user_not_found(user))?;
        info!(user_id = %user, user_name = %deleted.user_name, "User deleted");
        Ok(deleted)
    }

    /// Users `user` follows.
    pub async fn followed_users(&self, user: UserId) -> WikiResult<Vec<UserId>> {
        self.store.followed_users(user).await.map_err(WikiError::from_store)
    }

    /// Users following `user`.
    pub async fn followers(&self, user: UserId) -> WikiResult<Vec<UserId>> {
        self.store.followers(user).await.map_err(WikiError::from_store)
    }

    /// Revisions `user` likes.
    pub async fn liked_revisions(&self, user: UserId) -> WikiResult<Vec<RevisionId>> {
        self.store.liked_revisions(user).await.map_err(WikiError::from_store)
    }

    /// Whether the author of `revision` has deleted their account.
    pub async fn author_deleted(&self, revision: &Revision) -> WikiResult<bool> {
        let author = self.author_of(revision).await?;
        debug!(revision_id = %revision.id, deleted = author.is_deleted, "Author status");
        Ok(author.is_deleted)
    }

    /// The author of `revision`, deleted or not.
    pub async fn author_of(&self, revision: &Revision) -> WikiResult<User> {
        self.store
            .get_user(revision.author)
            .await
            .map_err(WikiError::from_store)?
            .ok_or_else(|| {
                WikiError::Internal(format!(
                    "revision {} has missing author {}",
                    revision.id, revision.author
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryWikiStore;
    use crate::types::{ParentRef, RevisionDraft, UserDraft};

    fn draft(name: &str) -> UserDraft {
        UserDraft {
            user_name: name.into(),
            first_name: "f".into(),
            last_name: "l".into(),
            email: format!("{}@email.com", name),
            password_hash: String::new(),
        }
    }

    async fn setup() -> (SocialGraph<InMemoryWikiStore>, Arc<InMemoryWikiStore>, UserId, UserId) {
        let store = Arc::new(InMemoryWikiStore::new());
        let u1 = store.insert_user(draft("testUserName1")).await.unwrap();
        let u2 = store.insert_user(draft("testUserName2")).await.unwrap();
        (SocialGraph::new(Arc::clone(&store)), store, u1.id, u2.id)
    }

    #[tokio::test]
    async fn test_like_is_idempotent() {
        let (social, store, u1, _) = setup().await;
        let r = store
            .insert_revision(RevisionDraft::new("t", "c", ParentRef::Root, u1))
            .await
            .unwrap();

        social.like(u1, r.id).await.unwrap();
        social.like(u1, r.id).await.unwrap();
        assert_eq!(social.count_likers(r.id).await.unwrap(), 1);
        assert!(social.is_liked(u1, r.id).await.unwrap());

        social.unlike(u1, r.id).await.unwrap();
        social.unlike(u1, r.id).await.unwrap();
        assert_eq!(social.count_likers(r.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_like_missing_revision() {
        let (social, _, u1, _) = setup().await;
        assert!(matches!(
            social.like(u1, RevisionId::new(9)).await,
            Err(WikiError::NotFound { entity: "revision", .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_follows() {
        let (social, store, u1, u2) = setup().await;
        let r = store
            .insert_revision(RevisionDraft::new("t", "c", ParentRef::Root, u2))
            .await
            .unwrap();

        social.follow(u1, u2).await.unwrap();
        social.follow(u2, u1).await.unwrap();
        assert_eq!(social.followers(u2).await.unwrap(), vec![u1]);

        social.delete_user(u2).await.unwrap();
        assert!(social.followed_users(u1).await.unwrap().is_empty());
        assert_eq!(social.followed_users(u2).await.unwrap(), vec![u1]);
        assert!(social.author_deleted(&r).await.unwrap());

        assert!(matches!(social.follow(u1, u2).await, Err(WikiError::NotFound { .. })));
        // Repeating the delete is harmless.
        social.delete_user(u2).await.unwrap();
    }

    #[tokio::test]
    async fn test_self_follow_allowed() {
        let (social, _, u1, _) = setup().await;
        social.follow(u1, u1).await.unwrap();
        assert_eq!(social.followed_users(u1).await.unwrap(), vec![u1]);
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let (social, _, _, _) = setup().await;
        assert!(matches!(
            social.delete_user(UserId::new(99)).await,
            Err(WikiError::NotFound { entity: "user", .. })
        ));
    }
}
