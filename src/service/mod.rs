//! Wiki REST Service
//!
//! Exposes the wiki core over HTTP. The session id travels in a `SESSION`
//! cookie; the `user` and `isLiked` cookies are set as documented in
//! [`crate::types::cookie`].
//!
//! ## Endpoints
//!
//! - `POST /signup` - Register and log in
//! - `POST /login` - Log in by userName or email
//! - `POST /logout` - Close the session
//! - `DELETE /deleteUser` - Delete the logged-in account
//! - `POST /createWikiPage` - Create a page or an edit
//! - `GET /retrieveWikiPage` - Retrieve a revision, counting a view
//! - `GET /retrieveWikiPageHistory` - Every revision of a page
//! - `GET /searchWikiPage` - Title-or-content search
//! - `GET /advancedSearchWikiPage` - Title/author/content search
//! - `POST /likePage`, `POST /unlikePage` - Like state
//! - `POST /followUser`, `POST /unfollowUser` - Follow state
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, user_cookie_guard};
pub use routes::{create_router, status_for, ApiError, AppState, ErrorResponse, SESSION_COOKIE};
pub use state::{ServiceState, StoreHealth};
