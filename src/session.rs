//! Sessions, credentials and cookie consistency.
//!
//! A [`Session`] is an explicit value the caller holds (the service keeps
//! its id in a `SESSION` cookie). The guard keeps a registry of open
//! sessions; a session is active while it is registered and younger than
//! [`WikiConfig::session_ttl_secs`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::WikiConfig;
use crate::error::{WikiError, WikiResult};
use crate::password::{hash_password, verify_password};
use crate::social::SocialGraph;
use crate::store::WikiStore;
use crate::types::{Cookie, NewUser, RevisionId, User, UserDraft, UserId};

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: Uuid,
    /// Logged-in user.
    pub user_id: UserId,
    /// Canonical userName of the logged-in user.
    pub user_name: String,
    /// When the session was opened.
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn open(user: &User) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user.id,
            user_name: user.user_name.clone(),
            created_at: Utc::now(),
        }
    }

    fn expired(&self, ttl_secs: u64, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.created_at).num_seconds();
        age < 0 || age as u64 >= ttl_secs
    }
}

/// Outcome of comparing the `user` cookie against the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieCheck {
    /// No session.
    Anonymous,
    /// Cookie absent or equal to the session's userName.
    Consistent,
    /// Cookie names someone else; the caller must send `clear`.
    Tampered {
        /// Cookie that expires the client's `user` cookie.
        clear: Cookie,
    },
}

/// Authentication and session bookkeeping.
pub struct SessionGuard<S: WikiStore> {
    store: Arc<S>,
    social: SocialGraph<S>,
    config: WikiConfig,
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl<S: WikiStore> Clone for SessionGuard<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            social: self.social.clone(),
            config: self.config.clone(),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<S: WikiStore> SessionGuard<S> {
    /// Create a guard over a backend.
    pub fn new(store: Arc<S>, config: WikiConfig) -> Self {
        Self {
            social: SocialGraph::new(Arc::clone(&store)),
            store,
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Whether `session` is registered and not expired.
    pub fn is_active(&self, session: &Session) -> bool {
        self.resolve(session.id).is_some()
    }

    fn reject_if_active(&self, current: Option<&Session>, action: &str) -> WikiResult<()> {
        match current {
            Some(session) if self.is_active(session) => Err(WikiError::Forbidden(format!(
                "already logged in as {}; log out before {}",
                session.user_name, action
            ))),
            _ => Ok(()),
        }
    }

    fn require_active(&self, session: &Session) -> WikiResult<()> {
        if self.is_active(session) {
            Ok(())
        } else {
            Err(WikiError::Forbidden("no active session".to_string()))
        }
    }

    /// Publish a session for `user`, then re-read the user.
    ///
    /// `delete_account` tombstones before it closes sessions, so a session
    /// published after that sweep sees the tombstone here and is withdrawn.
    /// Expired sessions are pruned on every registration.
    async fn register(&self, user: &User) -> WikiResult<(Session, Cookie)> {
        let session = Session::open(user);
        {
            let mut sessions = self.sessions.write();
            let ttl = self.config.session_ttl_secs;
            let now = session.created_at;
            sessions.retain(|_, s| !s.expired(ttl, now));
            sessions.insert(session.id, session.clone());
        }

        let live = self
            .store
            .get_user(user.id)
            .await
            .map_err(WikiError::from_store)?
            .is_some_and(|u| !u.is_deleted);
        if !live {
            self.sessions.write().remove(&session.id);
            warn!(user_id = %user.id, "Session withdrawn for deleted account");
            return Err(WikiError::Unauthorized("account is deleted".to_string()));
        }

        let cookie = Cookie::user(&session.user_name);
        Ok((session, cookie))
    }

    /// Register a new account and log it in.
    ///
    /// userName and email must be unused by every account, deleted ones
    /// included.
    pub async fn signup(&self, current: Option<&Session>, new_user: NewUser) -> WikiResult<(Session, Cookie)> {
        self.reject_if_active(current, "signing up")?;
        new_user.validate().map_err(WikiError::Validation)?;

        if self
            .store
            .find_user_by_name(&new_user.user_name)
            .await
            .map_err(WikiError::from_store)?
            .is_some()
        {
            return Err(WikiError::Conflict(format!("userName already taken: {}", new_user.user_name)));
        }
        if self
            .store
            .find_user_by_email(&new_user.email)
            .await
            .map_err(WikiError::from_store)?
            .is_some()
        {
            return Err(WikiError::Conflict(format!("email already taken: {}", new_user.email)));
        }

        let password_hash = hash_password(&new_user.password).map_err(WikiError::internal)?;
        let user = self
            .store
            .insert_user(UserDraft {
                user_name: new_user.user_name,
                first_name: new_user.first_name,
                last_name: new_user.last_name,
                email: new_user.email,
                password_hash,
            })
            .await
            .map_err(WikiError::from_store)?;

        info!(user_id = %user.id, user_name = %user.user_name, "User signed up");
        self.register(&user).await
    }

    /// Log in by userName or email.
    pub async fn login(
        &self,
        current: Option<&Session>,
        identifier: &str,
        password: &str,
    ) -> WikiResult<(Session, Cookie)> {
        self.reject_if_active(current, "logging in again")?;
        if identifier.is_empty() || password.is_empty() {
            return Err(WikiError::Validation("user and password are required".to_string()));
        }

        let user = self
            .store
            .find_active_user_by_login(identifier)
            .await
            .map_err(WikiError::from_store)?;
        let verified = match &user {
            Some(user) => verify_password(password, &user.password_hash).map_err(WikiError::internal)?,
            None => false,
        };
        let user = match user {
            Some(user) if verified => user,
            _ => {
                warn!(identifier, "Rejected login");
                return Err(WikiError::Unauthorized("invalid credentials".to_string()));
            }
        };

        let opened = self.register(&user).await?;
        info!(user_id = %user.id, user_name = %user.user_name, "User logged in");
        Ok(opened)
    }

    /// Close a session and return the cookie that clears `user`.
    pub fn logout(&self, session: &Session) -> WikiResult<Cookie> {
        self.require_active(session)?;
        self.sessions.write().remove(&session.id);
        info!(user_id = %session.user_id, "User logged out");
        Ok(Cookie::clear_user())
    }

    /// Delete the session's account, close every session it owns and return
    /// the cookie that clears `user`.
    pub async fn delete_account(&self, session: &Session) -> WikiResult<Cookie> {
        self.require_active(session)?;
        self.social.delete_user(session.user_id).await?;

        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != session.user_id);
        info!(
            user_id = %session.user_id,
            closed_sessions = before - sessions.len(),
            "Account deleted"
        );
        Ok(Cookie::clear_user())
    }

    /// Look up an active session. Expired sessions are dropped on sight.
    pub fn resolve(&self, id: Uuid) -> Option<Session> {
        let now = Utc::now();
        let found = self.sessions.read().get(&id).cloned()?;
        if found.expired(self.config.session_ttl_secs, now) {
            self.sessions.write().remove(&id);
            debug!(session_id = %id, "Session expired");
            return None;
        }
        Some(found)
    }

    /// Compare the client's `user` cookie with the session. A session that is
    /// no longer active counts as none. Never closes the session.
    pub fn validate_cookie(&self, session: Option<&Session>, user_cookie: Option<&str>) -> CookieCheck {
        let Some(session) = session.filter(|s| self.is_active(s)) else {
            return CookieCheck::Anonymous;
        };
        match user_cookie {
            Some(value) if value != session.user_name => {
                warn!(
                    session_user = %session.user_name,
                    cookie_user = %value,
                    "user cookie does not match session"
                );
                CookieCheck::Tampered { clear: Cookie::clear_user() }
            }
            _ => CookieCheck::Consistent,
        }
    }

    /// `isLiked` cookie for a page, recomputed from the store on every call.
    /// Without an active session the cookie is cleared.
    pub async fn like_indicator_cookie(
        &self,
        session: Option<&Session>,
        revision: RevisionId,
    ) -> WikiResult<Cookie> {
        match session.filter(|s| self.is_active(s)) {
            None => Ok(Cookie::clear_is_liked()),
            Some(session) => {
                let liked = self.social.is_liked(session.user_id, revision).await?;
                Ok(Cookie::is_liked(liked))
            }
        }
    }

    /// Number of open sessions. Expired sessions are pruned first.
    pub fn session_count(&self) -> usize {
        let ttl = self.config.session_ttl_secs;
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        sessions.retain(|_, s| !s.expired(ttl, now));
        sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryWikiStore;
    use crate::types::{ParentRef, RevisionDraft};

    fn new_user(n: u32) -> NewUser {
        NewUser::new(
            format!("testUserName{}", n),
            format!("testFirstName{}", n),
            format!("testLastName{}", n),
            format!("Test{}@email.com", n),
            format!("testPassword{}", n),
        )
    }

    fn guard() -> SessionGuard<InMemoryWikiStore> {
        SessionGuard::new(Arc::new(InMemoryWikiStore::new()), WikiConfig::default())
    }

    #[tokio::test]
    async fn test_signup_sets_user_cookie() {
        let guard = guard();
        let (session, cookie) = guard.signup(None, new_user(1)).await.unwrap();

        assert_eq!(cookie.value, "testUserName1");
        assert_eq!(cookie.max_age, 86_400);
        assert!(guard.is_active(&session));

        let stored = guard.store.get_user(session.user_id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "testPassword1");
    }

    #[tokio::test]
    async fn test_signup_while_logged_in_is_forbidden() {
        let guard = guard();
        let (session, _) = guard.signup(None, new_user(1)).await.unwrap();
        assert!(matches!(
            guard.signup(Some(&session), new_user(2)).await,
            Err(WikiError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_signup_conflicts_ignore_case() {
        let guard = guard();
        guard.signup(None, new_user(1)).await.unwrap();

        let mut same_name = new_user(2);
        same_name.user_name = "TESTUSERNAME1".into();
        assert!(matches!(guard.signup(None, same_name).await, Err(WikiError::Conflict(_))));

        let mut same_email = new_user(2);
        same_email.email = "test1@EMAIL.com".into();
        assert!(matches!(guard.signup(None, same_email).await, Err(WikiError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let guard = guard();
        let mut bad = new_user(1);
        bad.user_name = "has space".into();
        assert!(matches!(guard.signup(None, bad).await, Err(WikiError::Validation(_))));
        assert_eq!(guard.store.num_users(), 0);
    }

    #[tokio::test]
    async fn test_login_by_name_or_email() {
        let guard = guard();
        let (session, _) = guard.signup(None, new_user(1)).await.unwrap();
        guard.logout(&session).unwrap();

        let (by_name, cookie) = guard.login(None, "testusername1", "testPassword1").await.unwrap();
        assert_eq!(cookie.value, "testUserName1");
        guard.logout(&by_name).unwrap();

        let (by_email, _) = guard.login(None, "TEST1@email.com", "testPassword1").await.unwrap();
        assert_eq!(by_email.user_id, session.user_id);
    }

    #[tokio::test]
    async fn test_login_rejections() {
        let guard = guard();
        let (session, _) = guard.signup(None, new_user(1)).await.unwrap();

        assert!(matches!(
            guard.login(Some(&session), "testUserName1", "testPassword1").await,
            Err(WikiError::Forbidden(_))
        ));
        guard.logout(&session).unwrap();

        assert!(matches!(
            guard.login(None, "", "testPassword1").await,
            Err(WikiError::Validation(_))
        ));
        assert!(matches!(
            guard.login(None, "testUserName1", "wrong").await,
            Err(WikiError::Unauthorized(_))
        ));
        assert!(matches!(
            guard.login(None, "nobody", "testPassword1").await,
            Err(WikiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_requires_session() {
        let guard = guard();
        let (session, _) = guard.signup(None, new_user(1)).await.unwrap();

        let cookie = guard.logout(&session).unwrap();
        assert!(cookie.is_clearing());
        assert!(matches!(guard.logout(&session), Err(WikiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_account_closes_all_sessions() {
        let guard = guard();
        let (first, _) = guard.signup(None, new_user(1)).await.unwrap();
        let (second, _) = guard.login(None, "testUserName1", "testPassword1").await.unwrap();

        let cookie = guard.delete_account(&first).await.unwrap();
        assert!(cookie.is_clearing());
        assert!(!guard.is_active(&first));
        assert!(!guard.is_active(&second));

        assert!(matches!(
            guard.login(None, "testUserName1", "testPassword1").await,
            Err(WikiError::Unauthorized(_))
        ));
        assert!(matches!(guard.signup(None, new_user(1)).await, Err(WikiError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_sessions_expire() {
        let guard = SessionGuard::new(
            Arc::new(InMemoryWikiStore::new()),
            WikiConfig::default().with_session_ttl_secs(0),
        );
        let (session, _) = guard.signup(None, new_user(1)).await.unwrap();
        assert!(guard.resolve(session.id).is_none());
        assert_eq!(guard.session_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_pruned_without_resolve() {
        let guard = SessionGuard::new(
            Arc::new(InMemoryWikiStore::new()),
            WikiConfig::default().with_session_ttl_secs(0),
        );
        for n in 1..=5 {
            guard.signup(None, new_user(n)).await.unwrap();
        }
        // Each registration sweeps the ones before it.
        assert_eq!(guard.sessions.read().len(), 1);
        assert_eq!(guard.session_count(), 0);
    }

    #[tokio::test]
    async fn test_live_sessions_survive_pruning() {
        let guard = guard();
        let (first, _) = guard.signup(None, new_user(1)).await.unwrap();
        let (second, _) = guard.signup(None, new_user(2)).await.unwrap();

        assert_eq!(guard.session_count(), 2);
        assert!(guard.is_active(&first));
        assert!(guard.is_active(&second));
    }

    #[tokio::test]
    async fn test_validate_cookie() {
        let guard = guard();
        assert_eq!(guard.validate_cookie(None, Some("x")), CookieCheck::Anonymous);

        let (session, _) = guard.signup(None, new_user(1)).await.unwrap();
        assert_eq!(guard.validate_cookie(Some(&session), None), CookieCheck::Consistent);
        assert_eq!(
            guard.validate_cookie(Some(&session), Some("testUserName1")),
            CookieCheck::Consistent
        );
        assert_eq!(
            guard.validate_cookie(Some(&session), Some("testUserName2")),
            CookieCheck::Tampered { clear: Cookie::clear_user() }
        );
        assert!(guard.is_active(&session));

        guard.logout(&session).unwrap();
        assert_eq!(
            guard.validate_cookie(Some(&session), Some("someoneElse")),
            CookieCheck::Anonymous
        );
        assert_eq!(
            guard.validate_cookie(Some(&session), Some("testUserName1")),
            CookieCheck::Anonymous
        );
    }

    #[tokio::test]
    async fn test_like_indicator_cookie() {
        let guard = guard();
        let (session, _) = guard.signup(None, new_user(1)).await.unwrap();
        let r = guard
            .store
            .insert_revision(RevisionDraft::new("t", "c", ParentRef::Root, session.user_id))
            .await
            .unwrap();

        let anonymous = guard.like_indicator_cookie(None, r.id).await.unwrap();
        assert!(anonymous.is_clearing());

        let cookie = guard.like_indicator_cookie(Some(&session), r.id).await.unwrap();
        assert_eq!(cookie.value, "false");

        guard.social.like(session.user_id, r.id).await.unwrap();
        let cookie = guard.like_indicator_cookie(Some(&session), r.id).await.unwrap();
        assert_eq!(cookie.value, "true");
        assert_eq!(cookie.max_age, 86_400);

        guard.logout(&session).unwrap();
        let closed = guard.like_indicator_cookie(Some(&session), r.id).await.unwrap();
        assert_eq!(closed, Cookie::clear_is_liked());
    }
}
