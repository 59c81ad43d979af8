//! Revision types for the wiki page tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::user::UserId;
use crate::fingerprint::{compute_fingerprint, verify_fingerprint};

/// Raw parent value marking a revision as the root of its tree.
pub const ROOT_PARENT_ID: i64 = -1;

/// Unique identifier for a revision.
///
/// Assigned by the store in strictly increasing order, so ordering by
/// `RevisionId` is ordering by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(i64);

impl RevisionId {
    /// Create a new RevisionId from its raw value.
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RevisionId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Parent link of a revision.
///
/// Serialized as the raw integer the wire format uses: `-1` for a root,
/// otherwise the parent's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum ParentRef {
    /// The revision starts a new tree.
    Root,
    /// The revision edits an existing revision.
    Revision(RevisionId),
}

impl ParentRef {
    /// Parse a raw parent value.
    ///
    /// `-1` is the root sentinel and any positive value is a revision id.
    /// Zero and values below `-1` are rejected.
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            ROOT_PARENT_ID => Some(Self::Root),
            r if r > 0 => Some(Self::Revision(RevisionId(r))),
            _ => None,
        }
    }

    /// Raw wire value.
    pub fn to_raw(&self) -> i64 {
        match self {
            Self::Root => ROOT_PARENT_ID,
            Self::Revision(id) => id.get(),
        }
    }

    /// Whether this is the root sentinel.
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    /// The parent revision id, if any.
    pub fn revision_id(&self) -> Option<RevisionId> {
        match self {
            Self::Root => None,
            Self::Revision(id) => Some(*id),
        }
    }
}

impl From<ParentRef> for i64 {
    fn from(parent: ParentRef) -> Self {
        parent.to_raw()
    }
}

impl TryFrom<i64> for ParentRef {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::from_raw(raw).ok_or_else(|| format!("invalid parent id: {}", raw))
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_raw())
    }
}

/// A validated edit waiting to be persisted.
///
/// The store assigns the id, creation time and view counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionDraft {
    /// Page title (non-empty).
    pub title: String,
    /// Page content (may be empty).
    pub content: String,
    /// Parent link.
    pub parent: ParentRef,
    /// Author of the edit.
    pub author: UserId,
}

impl RevisionDraft {
    /// Create a new draft.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        parent: ParentRef,
        author: UserId,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            parent,
            author,
        }
    }

    /// Whether this draft would produce the same page as `other`.
    pub fn same_page_as(&self, other: &Revision) -> bool {
        self.title == other.title && self.content == other.content
    }

    /// Fingerprint the store persists next to the revision.
    pub fn fingerprint(&self) -> String {
        compute_fingerprint(&self.title, &self.content)
    }
}

/// One persisted version of a page.
///
/// Immutable once stored; only `views` changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Unique revision identifier.
    pub id: RevisionId,
    /// Page title.
    pub title: String,
    /// Page content.
    pub content: String,
    /// Parent link.
    pub parent: ParentRef,
    /// Author of the edit.
    pub author: UserId,
    /// Number of retrievals.
    pub views: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// SHA-256 fingerprint of (title, content).
    pub fingerprint: String,
}

impl Revision {
    /// Materialize a draft with store-assigned fields.
    pub fn from_draft(id: RevisionId, draft: RevisionDraft, created_at: DateTime<Utc>) -> Self {
        let fingerprint = draft.fingerprint();
        Self {
            id,
            title: draft.title,
            content: draft.content,
            parent: draft.parent,
            author: draft.author,
            views: 0,
            created_at,
            fingerprint,
        }
    }

    /// Whether this revision starts a tree.
    pub fn is_root(&self) -> bool {
        self.parent.is_root()
    }

    /// Check the stored fingerprint against the stored title and content.
    pub fn verify_fingerprint(&self) -> Result<(), FingerprintMismatch> {
        if verify_fingerprint(&self.title, &self.content, &self.fingerprint) {
            Ok(())
        } else {
            Err(FingerprintMismatch {
                revision_id: self.id,
                stored: self.fingerprint.clone(),
                computed: compute_fingerprint(&self.title, &self.content),
            })
        }
    }
}

/// Stored fingerprint does not match the stored page (corruption).
#[derive(Debug, Clone, thiserror::Error)]
#[error("Fingerprint mismatch for revision {revision_id}: stored={stored}, computed={computed}")]
pub struct FingerprintMismatch {
    /// Revision where the mismatch was detected.
    pub revision_id: RevisionId,
    /// Fingerprint read from storage.
    pub stored: String,
    /// Fingerprint computed from the stored page.
    pub computed: String,
}
