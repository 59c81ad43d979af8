//! Read-side projections of a revision.
//!
//! Built by field selection from a [`Revision`], its author and a like count.
//! Field names follow the wire format the UI reads (`parentID`,
//! `creationDate`, `authorDeleted`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::revision::{ParentRef, Revision, RevisionId};
use super::user::User;

/// Listing view: no content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionSummary {
    /// Revision id.
    pub id: RevisionId,
    /// Page title.
    pub title: String,
    /// Parent link (`-1` for a root).
    #[serde(rename = "parentID")]
    pub parent_id: ParentRef,
    /// Author's userName.
    pub author: String,
    /// Creation time.
    #[serde(rename = "creationDate")]
    pub creation_date: DateTime<Utc>,
    /// View counter.
    pub views: u64,
    /// Number of users liking this revision.
    pub likes: usize,
}

impl RevisionSummary {
    /// Project a revision.
    pub fn project(revision: &Revision, author: &User, likes: usize) -> Self {
        Self {
            id: revision.id,
            title: revision.title.clone(),
            parent_id: revision.parent,
            author: author.user_name.clone(),
            creation_date: revision.created_at,
            views: revision.views,
            likes,
        }
    }
}

/// Page view: summary plus content and the author tombstone flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionDetail {
    /// Listing fields.
    #[serde(flatten)]
    pub summary: RevisionSummary,
    /// Page content.
    pub content: String,
    /// Whether the author's account has been deleted.
    #[serde(rename = "authorDeleted")]
    pub author_deleted: bool,
}

impl RevisionDetail {
    /// Project a revision. `author_deleted` is read from the author at call time.
    pub fn project(revision: &Revision, author: &User, likes: usize) -> Self {
        Self {
            summary: RevisionSummary::project(revision, author, likes),
            content: revision.content.clone(),
            author_deleted: author.is_deleted,
        }
    }

    /// Revision id.
    pub fn id(&self) -> RevisionId {
        self.summary.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::revision::RevisionDraft;
    use crate::types::user::{UserDraft, UserId};

    fn author(deleted: bool) -> User {
        let mut user = User::from_draft(
            UserId::new(4),
            UserDraft {
                user_name: "testUserName1".to_string(),
                first_name: "f".to_string(),
                last_name: "l".to_string(),
                email: "t@example.com".to_string(),
                password_hash: String::new(),
            },
            Utc::now(),
        );
        user.is_deleted = deleted;
        user
    }

    #[test]
    fn test_detail_wire_format() {
        let revision = Revision::from_draft(
            RevisionId::new(9),
            RevisionDraft::new("testTitle", "testContent", ParentRef::Root, UserId::new(4)),
            Utc::now(),
        );
        let detail = RevisionDetail::project(&revision, &author(true), 2);
        let json = serde_json::to_value(&detail).unwrap();

        assert_eq!(json["id"], 9);
        assert_eq!(json["title"], "testTitle");
        assert_eq!(json["content"], "testContent");
        assert_eq!(json["parentID"], -1);
        assert_eq!(json["author"], "testUserName1");
        assert_eq!(json["views"], 0);
        assert_eq!(json["likes"], 2);
        assert_eq!(json["authorDeleted"], true);
        assert!(json.get("creationDate").is_some());
    }

    #[test]
    fn test_summary_omits_content() {
        let revision = Revision::from_draft(
            RevisionId::new(2),
            RevisionDraft::new("t", "secret body", ParentRef::Revision(RevisionId::new(1)), UserId::new(4)),
            Utc::now(),
        );
        let json = serde_json::to_string(&RevisionSummary::project(&revision, &author(false), 0)).unwrap();
        assert!(!json.contains("secret body"));
        assert!(json.contains("\"parentID\":1"));
    }
}
