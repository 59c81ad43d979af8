//! Caller-facing wiki operations.
//!
//! [`Wiki`] wires the revision tree, social graph, session guard and search
//! index over one backend, and shapes results into the projections callers
//! render. Mutations require an active [`Session`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::WikiConfig;
use crate::error::{WikiError, WikiResult};
use crate::revisions::RevisionStore;
use crate::search::SearchIndex;
use crate::session::{Session, SessionGuard};
use crate::social::SocialGraph;
use crate::store::WikiStore;
use crate::types::{Cookie, NewUser, Revision, RevisionDetail, RevisionId, RevisionSummary, User, UserId};

/// The wiki core over one storage backend.
pub struct Wiki<S: WikiStore> {
    store: Arc<S>,
    revisions: RevisionStore<S>,
    social: SocialGraph<S>,
    sessions: SessionGuard<S>,
    search: SearchIndex<S>,
    config: WikiConfig,
}

impl<S: WikiStore> Clone for Wiki<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            revisions: self.revisions.clone(),
            social: self.social.clone(),
            sessions: self.sessions.clone(),
            search: self.search.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: WikiStore> Wiki<S> {
    /// Build the wiki over a backend.
    pub fn new(store: Arc<S>, config: WikiConfig) -> Self {
        Self {
            revisions: RevisionStore::new(Arc::clone(&store), config.clone()),
            social: SocialGraph::new(Arc::clone(&store)),
            sessions: SessionGuard::new(Arc::clone(&store), config.clone()),
            search: SearchIndex::new(Arc::clone(&store)),
            store,
            config,
        }
    }

    /// Revision tree.
    pub fn revisions(&self) -> &RevisionStore<S> {
        &self.revisions
    }

    /// Likes and follows.
    pub fn social(&self) -> &SocialGraph<S> {
        &self.social
    }

    /// Session guard.
    pub fn sessions(&self) -> &SessionGuard<S> {
        &self.sessions
    }

    /// Search index.
    pub fn search_index(&self) -> &SearchIndex<S> {
        &self.search
    }

    /// Backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active configuration.
    pub fn config(&self) -> &WikiConfig {
        &self.config
    }

    fn require_session<'a>(&self, session: Option<&'a Session>) -> WikiResult<&'a Session> {
        match session {
            Some(s) if self.sessions.is_active(s) => Ok(s),
            _ => Err(WikiError::Forbidden("login required".to_string())),
        }
    }

    /// See [`SessionGuard::signup`].
    pub async fn signup(&self, current: Option<&Session>, new_user: NewUser) -> WikiResult<(Session, Cookie)> {
        self.sessions.signup(current, new_user).await
    }

    /// See [`SessionGuard::login`].
    pub async fn login(
        &self,
        current: Option<&Session>,
        identifier: &str,
        password: &str,
    ) -> WikiResult<(Session, Cookie)> {
        self.sessions.login(current, identifier, password).await
    }

    /// See [`SessionGuard::logout`].
    pub fn logout(&self, session: Option<&Session>) -> WikiResult<Cookie> {
        let session = self.require_session(session)?;
        self.sessions.logout(session)
    }

    /// See [`SessionGuard::delete_account`].
    pub async fn delete_account(&self, session: Option<&Session>) -> WikiResult<Cookie> {
        let session = self.require_session(session)?;
        self.sessions.delete_account(session).await
    }

    /// Create a page (`parent_id == -1`) or an edit, authored by the
    /// session's user.
    pub async fn create_page(
        &self,
        session: Option<&Session>,
        title: &str,
        content: &str,
        parent_id: i64,
    ) -> WikiResult<RevisionDetail> {
        let session = self.require_session(session)?;
        let revision = self
            .revisions
            .create_revision(title, content, parent_id, session.user_id)
            .await?;
        self.detail(&revision).await
    }

    /// Count a view of a revision and return it with the `isLiked` cookie.
    pub async fn retrieve_page(
        &self,
        session: Option<&Session>,
        id: RevisionId,
    ) -> WikiResult<(RevisionDetail, Cookie)> {
        let session = session.filter(|s| self.sessions.is_active(s));
        let revision = self.revisions.record_view(id).await?;
        let detail = self.detail(&revision).await?;
        let cookie = self.sessions.like_indicator_cookie(session, id).await?;
        Ok((detail, cookie))
    }

    /// Every revision in the tree containing `id`, in creation order.
    pub async fn page_history(&self, id: RevisionId) -> WikiResult<Vec<RevisionSummary>> {
        let history = self.revisions.history(id).await?;
        self.summarize(&history).await
    }

    /// Three-field search.
    pub async fn search(&self, title: &str, author: &str, content: &str) -> WikiResult<Vec<RevisionSummary>> {
        let found = self.search.advanced(title, author, content).await?;
        self.summarize(&found).await
    }

    /// Title-or-content search.
    pub async fn quick_search(&self, text: &str) -> WikiResult<Vec<RevisionSummary>> {
        let found = self.search.quick(text).await?;
        self.summarize(&found).await
    }

    /// Like a revision as the session's user.
    pub async fn like_page(&self, session: Option<&Session>, id: RevisionId) -> WikiResult<()> {
        let session = self.require_session(session)?;
        self.social.like(session.user_id, id).await
    }

    /// Withdraw the session user's like.
    pub async fn unlike_page(&self, session: Option<&Session>, id: RevisionId) -> WikiResult<()> {
        let session = self.require_session(session)?;
        self.social.unlike(session.user_id, id).await
    }

    /// Follow a user by userName.
    pub async fn follow_user(&self, session: Option<&Session>, user_name: &str) -> WikiResult<()> {
        let session = self.require_session(session)?;
        let target = self.user_by_name(user_name).await?;
        if target.is_deleted {
            return Err(WikiError::user_not_found(user_name));
        }
        self.social.follow(session.user_id, target.id).await
    }

    /// Unfollow a user by userName.
    pub async fn unfollow_user(&self, session: Option<&Session>, user_name: &str) -> WikiResult<()> {
        let session = self.require_session(session)?;
        let target = self.user_by_name(user_name).await?;
        self.social.unfollow(session.user_id, target.id).await
    }

    async fn user_by_name(&self, user_name: &str) -> WikiResult<User> {
        if user_name.is_empty() {
            return Err(WikiError::Validation("userName is required".to_string()));
        }
        self.store
            .find_user_by_name(user_name)
            .await
            .map_err(WikiError::from_store)?
            .ok_or_else(|| WikiError::user_not_found(user_name))
    }

    async fn detail(&self, revision: &Revision) -> WikiResult<RevisionDetail> {
        let author = self.social.author_of(revision).await?;
        let likes = self.social.count_likers(revision.id).await?;
        Ok(RevisionDetail::project(revision, &author, likes))
    }

    async fn summarize(&self, revisions: &[Revision]) -> WikiResult<Vec<RevisionSummary>> {
        let mut authors: HashMap<UserId, User> = HashMap::new();
        let mut summaries = Vec::with_capacity(revisions.len());

        for revision in revisions {
            if !authors.contains_key(&revision.author) {
                let author = self.social.author_of(revision).await?;
                authors.insert(revision.author, author);
            }
            let likes = self.social.count_likers(revision.id).await?;
            if let Some(author) = authors.get(&revision.author) {
                summaries.push(RevisionSummary::project(revision, author, likes));
            }
        }

        debug!(results = summaries.len(), "Summaries projected");
        Ok(summaries)
    }
}
