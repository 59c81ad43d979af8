//! Axum routes for the wiki service.
//!
//! Parameters arrive as form fields (POST) or query strings (GET), using the
//! field names browser clients send (`user`, `pass`, `parentID`, ...).

use axum::{
    extract::{Form, Json, Query, State},
    http::header::{COOKIE, SET_COOKIE},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::WikiError;
use crate::session::Session;
use crate::store::{PostgresWikiStore, WikiStore};
use crate::types::{find_cookie, Cookie, NewUser, RevisionId, User};

use super::middleware::{metrics_middleware, user_cookie_guard};
use super::state::{ServiceState, StoreHealth};

/// Type alias for the service state with PostgresWikiStore.
pub type AppState = ServiceState<PostgresWikiStore>;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "SESSION";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Signup form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    /// userName.
    #[serde(default)]
    pub user: String,
    /// First name.
    #[serde(default)]
    pub first: String,
    /// Last name.
    #[serde(default)]
    pub last: String,
    /// Email.
    #[serde(default)]
    pub email: String,
    /// Password.
    #[serde(default)]
    pub pass: String,
}

/// Login form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    /// userName or email.
    #[serde(default)]
    pub login: String,
    /// Password.
    #[serde(default)]
    pub pass: String,
}

/// Page creation form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePageForm {
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Content.
    #[serde(default)]
    pub content: String,
    /// Parent id, `-1` for a new page.
    #[serde(rename = "parentID")]
    pub parent_id: Option<String>,
}

/// A revision id parameter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdParams {
    /// Revision id.
    pub id: Option<String>,
}

/// A userName parameter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserParams {
    /// Target userName.
    #[serde(default)]
    pub user: String,
}

/// Search parameters, trimmed before use. Quick search reads only `title`.
///
/// An absent parameter differs from an empty one: quick search requires
/// `title`, advanced search requires at least one of the three.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Title substring (quick search: title-or-content substring).
    pub title: Option<String>,
    /// Author userName substring.
    pub user: Option<String>,
    /// Content substring.
    pub content: Option<String>,
}

impl SearchParams {
    fn field(value: &Option<String>) -> &str {
        value.as_deref().map(str::trim).unwrap_or_default()
    }
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded".
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Open sessions.
    pub sessions: usize,
    /// Database connectivity status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseHealth>,
}

/// Database health information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseHealth {
    /// Whether a query succeeded.
    pub connected: bool,
    /// Current pool size.
    pub pool_size: u32,
    /// Idle connections.
    pub pool_idle: usize,
    /// Maximum pool size.
    pub pool_max: u32,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always "alive".
    pub status: String,
}

/// Readiness response with dependency status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether traffic can be served.
    pub ready: bool,
    /// Whether the backend answered.
    pub database: bool,
    /// Explanation when not ready.
    pub details: Option<String>,
}

/// Structured error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// A [`WikiError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub WikiError);

impl From<WikiError> for ApiError {
    fn from(e: WikiError) -> Self {
        Self(e)
    }
}

/// HTTP status for an error kind.
pub fn status_for(error: &WikiError) -> StatusCode {
    match error {
        WikiError::Validation(_) | WikiError::NoChange { .. } | WikiError::NotFound { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        WikiError::Conflict(_) => StatusCode::CONFLICT,
        WikiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        WikiError::Forbidden(_) => StatusCode::FORBIDDEN,
        WikiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if self.0.is_client_error() {
            tracing::debug!(code = self.0.code(), error = %self.0, "Request rejected");
        } else {
            tracing::error!(code = self.0.code(), error = %self.0, "Request failed");
        }
        let body = ErrorResponse::new(self.0.code(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Response, ApiError>;

// ============================================================================
// Helpers
// ============================================================================

/// Resolve the session named by the `SESSION` cookie, if it is active.
pub fn session_from_headers<S: WikiStore + 'static>(
    state: &ServiceState<S>,
    headers: &HeaderMap,
) -> Option<Session> {
    let id = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| find_cookie(h, SESSION_COOKIE))
        .and_then(|v| Uuid::parse_str(v).ok())?;
    state.wiki.sessions().resolve(id)
}

fn session_cookie(session: &Session, max_age: u64) -> Cookie {
    Cookie {
        name: SESSION_COOKIE.to_string(),
        value: session.id.to_string(),
        max_age,
    }
}

fn clear_session_cookie() -> Cookie {
    Cookie {
        name: SESSION_COOKIE.to_string(),
        value: String::new(),
        max_age: 0,
    }
}

/// Attach `Set-Cookie` headers to a response.
fn with_cookies(mut response: Response, cookies: &[Cookie]) -> ApiResult {
    for cookie in cookies {
        let value = HeaderValue::from_str(&cookie.to_header_value())
            .map_err(|e| ApiError(WikiError::internal(e)))?;
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}

fn parse_revision_id(raw: Option<&str>, field: &str) -> Result<RevisionId, ApiError> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(RevisionId::new)
        .ok_or_else(|| ApiError(WikiError::Validation(format!("{} must be an integer", field))))
}

async fn load_user<S: WikiStore + 'static>(state: &ServiceState<S>, session: &Session) -> Result<User, ApiError> {
    state
        .store
        .get_user(session.user_id)
        .await
        .map_err(WikiError::from_store)?
        .ok_or_else(|| ApiError(WikiError::user_not_found(session.user_id)))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Register and log in.
async fn signup_handler<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    Form(form): Form<SignupForm>,
) -> ApiResult {
    let current = session_from_headers(&state, &headers);
    let new_user = NewUser::new(form.user, form.first, form.last, form.email, form.pass);
    let (session, user_cookie) = state.wiki.signup(current.as_ref(), new_user).await?;
    let user = load_user(&state, &session).await?;

    let max_age = state.wiki.config().session_ttl_secs;
    with_cookies(
        Json(user).into_response(),
        &[user_cookie, session_cookie(&session, max_age)],
    )
}

/// Log in by userName or email.
async fn login_handler<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> ApiResult {
    let current = session_from_headers(&state, &headers);
    let (session, user_cookie) = state.wiki.login(current.as_ref(), &form.login, &form.pass).await?;
    let user = load_user(&state, &session).await?;

    let max_age = state.wiki.config().session_ttl_secs;
    with_cookies(
        Json(user).into_response(),
        &[user_cookie, session_cookie(&session, max_age)],
    )
}

/// Close the current session.
async fn logout_handler<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
) -> ApiResult {
    let session = session_from_headers(&state, &headers);
    let clear_user = state.wiki.logout(session.as_ref())?;
    with_cookies(StatusCode::OK.into_response(), &[clear_user, clear_session_cookie()])
}

/// Delete the current account.
async fn delete_user_handler<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
) -> ApiResult {
    let session = session_from_headers(&state, &headers);
    let clear_user = state.wiki.delete_account(session.as_ref()).await?;
    with_cookies(StatusCode::OK.into_response(), &[clear_user, clear_session_cookie()])
}

/// Create a page or an edit.
async fn create_page_handler<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    Form(form): Form<CreatePageForm>,
) -> ApiResult {
    let session = session_from_headers(&state, &headers);
    if session.is_none() {
        return Err(ApiError(WikiError::Forbidden("login required".to_string())));
    }
    let parent_id = form
        .parent_id
        .as_deref()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| ApiError(WikiError::Validation("parentID must be an integer".to_string())))?;

    let page = state
        .wiki
        .create_page(session.as_ref(), &form.title, &form.content, parent_id)
        .await?;
    Ok(Json(page).into_response())
}

/// Retrieve a page, counting a view.
async fn retrieve_page_handler<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    Query(params): Query<IdParams>,
) -> ApiResult {
    let id = parse_revision_id(params.id.as_deref(), "id")?;
    let session = session_from_headers(&state, &headers);
    let (page, is_liked) = state.wiki.retrieve_page(session.as_ref(), id).await?;
    with_cookies(Json(page).into_response(), &[is_liked])
}

/// Every revision of the page containing `id`.
async fn page_history_handler<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Query(params): Query<IdParams>,
) -> ApiResult {
    let id = parse_revision_id(params.id.as_deref(), "id")?;
    let history = state.wiki.page_history(id).await?;
    Ok(Json(history).into_response())
}

/// Title-or-content search.
async fn quick_search_handler<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    let text = params
        .title
        .as_deref()
        .ok_or_else(|| ApiError(WikiError::Validation("title is required".to_string())))?;
    let found = state.wiki.quick_search(text.trim()).await?;
    Ok(Json(found).into_response())
}

/// Three-field search.
async fn advanced_search_handler<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    if params.title.is_none() && params.user.is_none() && params.content.is_none() {
        return Err(ApiError(WikiError::Validation(
            "one of title, user or content is required".to_string(),
        )));
    }
    let found = state
        .wiki
        .search(
            SearchParams::field(&params.title),
            SearchParams::field(&params.user),
            SearchParams::field(&params.content),
        )
        .await?;
    Ok(Json(found).into_response())
}

async fn like_page_handler<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    Form(params): Form<IdParams>,
) -> ApiResult {
    let session = session_from_headers(&state, &headers);
    let id = parse_revision_id(params.id.as_deref(), "id")?;
    state.wiki.like_page(session.as_ref(), id).await?;
    Ok(StatusCode::OK.into_response())
}

async fn unlike_page_handler<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    Form(params): Form<IdParams>,
) -> ApiResult {
    let session = session_from_headers(&state, &headers);
    let id = parse_revision_id(params.id.as_deref(), "id")?;
    state.wiki.unlike_page(session.as_ref(), id).await?;
    Ok(StatusCode::OK.into_response())
}

async fn follow_user_handler<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    Form(params): Form<UserParams>,
) -> ApiResult {
    let session = session_from_headers(&state, &headers);
    state.wiki.follow_user(session.as_ref(), &params.user).await?;
    Ok(StatusCode::OK.into_response())
}

async fn unfollow_user_handler<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    Form(params): Form<UserParams>,
) -> ApiResult {
    let session = session_from_headers(&state, &headers);
    state.wiki.unfollow_user(session.as_ref(), &params.user).await?;
    Ok(StatusCode::OK.into_response())
}

/// Health check endpoint (detailed).
async fn health_handler<S: WikiStore + StoreHealth + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
) -> Json<HealthResponse> {
    let db_healthy = state.store.is_healthy().await;
    let database = state.store.pool_stats().map(|stats| DatabaseHealth {
        connected: db_healthy,
        pool_size: stats.size,
        pool_idle: stats.idle,
        pool_max: stats.max,
    });

    Json(HealthResponse {
        status: if db_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: state.wiki.sessions().session_count(),
        database,
    })
}

/// Liveness probe endpoint. Does not check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 if the backend answers, 503 otherwise.
async fn readiness_handler<S: WikiStore + StoreHealth + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    if state.store.is_healthy().await {
        Ok(Json(ReadinessResponse {
            ready: true,
            database: true,
            details: None,
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                database: false,
                details: Some("Database connection failed".to_string()),
            }),
        ))
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the wiki service.
pub fn create_router<S: WikiStore + StoreHealth + 'static>(state: ServiceState<S>) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Accounts
        .route("/signup", post(signup_handler::<S>))
        .route("/login", post(login_handler::<S>))
        .route("/logout", post(logout_handler::<S>))
        .route("/deleteUser", delete(delete_user_handler::<S>))
        // Pages
        .route("/createWikiPage", post(create_page_handler::<S>))
        .route("/retrieveWikiPage", get(retrieve_page_handler::<S>))
        .route("/retrieveWikiPageHistory", get(page_history_handler::<S>))
        .route("/searchWikiPage", get(quick_search_handler::<S>))
        .route("/advancedSearchWikiPage", get(advanced_search_handler::<S>))
        // Social
        .route("/likePage", post(like_page_handler::<S>))
        .route("/unlikePage", post(unlike_page_handler::<S>))
        .route("/followUser", post(follow_user_handler::<S>))
        .route("/unfollowUser", post(unfollow_user_handler::<S>))
        // Health checks
        .route("/health", get(health_handler::<S>))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler::<S>))
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            user_cookie_guard::<S>,
        ))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .with_state(state)
}
