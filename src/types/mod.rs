//! Core types for the wiki.

pub mod revision;
pub mod user;
pub mod cookie;
pub mod view;

pub use revision::{Revision, RevisionId, RevisionDraft, ParentRef, FingerprintMismatch, ROOT_PARENT_ID};
pub use user::{User, UserId, NewUser, UserDraft, MAX_NAME_LEN, MAX_EMAIL_LEN};
pub use cookie::{Cookie, find_cookie, USER_COOKIE, IS_LIKED_COOKIE, COOKIE_MAX_AGE_SECS};
pub use view::{RevisionSummary, RevisionDetail};
