//! Response cookies clients depend on.
//!
//! | Cookie | Values | Max-Age |
//! |---|---|---|
//! | `user` | userName, or empty to clear | 86400 when set; 0 to clear |
//! | `isLiked` | `"true"` / `"false"`, or empty to clear | 86400 when set; 0 to clear |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the cookie carrying the logged-in userName.
pub const USER_COOKIE: &str = "user";

/// Name of the cookie carrying the like state of the current page.
pub const IS_LIKED_COOKIE: &str = "isLiked";

/// Lifetime of a set cookie, in seconds (one day).
pub const COOKIE_MAX_AGE_SECS: u64 = 86_400;

/// A cookie the caller must attach to its response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Max-Age in seconds; 0 expires the cookie immediately.
    pub max_age: u64,
}

impl Cookie {
    fn set(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            max_age: COOKIE_MAX_AGE_SECS,
        }
    }

    fn clear(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: String::new(),
            max_age: 0,
        }
    }

    /// `user` cookie holding the session's userName.
    pub fn user(user_name: impl Into<String>) -> Self {
        Self::set(USER_COOKIE, user_name)
    }

    /// `user` cookie that overwrites and expires the client's copy.
    pub fn clear_user() -> Self {
        Self::clear(USER_COOKIE)
    }

    /// `isLiked` cookie for the current page.
    pub fn is_liked(liked: bool) -> Self {
        Self::set(IS_LIKED_COOKIE, if liked { "true" } else { "false" })
    }

    /// `isLiked` cookie that overwrites and expires the client's copy.
    pub fn clear_is_liked() -> Self {
        Self::clear(IS_LIKED_COOKIE)
    }

    /// Whether this cookie instructs the client to drop it.
    pub fn is_clearing(&self) -> bool {
        self.max_age == 0
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        format!("{}={}; Max-Age={}; Path=/", self.name, self.value, self.max_age)
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

/// Look up a cookie value in a `Cookie` request header.
///
/// Returns the first value bound to `name`.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_cookie_contract() {
        let c = Cookie::user("testUserName1");
        assert_eq!(c.name, "user");
        assert_eq!(c.value, "testUserName1");
        assert_eq!(c.max_age, 86_400);

        let cleared = Cookie::clear_user();
        assert_eq!(cleared.name, "user");
        assert_eq!(cleared.value, "");
        assert_eq!(cleared.max_age, 0);
        assert!(cleared.is_clearing());
    }

    #[test]
    fn test_is_liked_cookie_contract() {
        assert_eq!(Cookie::is_liked(true).value, "true");
        assert_eq!(Cookie::is_liked(false).value, "false");
        assert_eq!(Cookie::is_liked(false).max_age, 86_400);

        let cleared = Cookie::clear_is_liked();
        assert_eq!(cleared.name, "isLiked");
        assert_eq!(cleared.value, "");
        assert_eq!(cleared.max_age, 0);
    }

    #[test]
    fn test_header_rendering() {
        assert_eq!(
            Cookie::user("bob").to_header_value(),
            "user=bob; Max-Age=86400; Path=/"
        );
        assert_eq!(Cookie::clear_is_liked().to_string(), "isLiked=; Max-Age=0; Path=/");
    }

    #[test]
    fn test_find_cookie() {
        let header = "SESSION=abc; user=bob ; isLiked=true";
        assert_eq!(find_cookie(header, "user"), Some("bob"));
        assert_eq!(find_cookie(header, "isLiked"), Some("true"));
        assert_eq!(find_cookie(header, "missing"), None);
        assert_eq!(find_cookie("user=", "user"), Some(""));
    }
}
