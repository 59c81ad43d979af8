//! Read-only search over revisions.
//!
//! Matching is case-insensitive substring matching. Results come back in
//! creation order, except that revisions sharing the exact value of the
//! searched field form a tie group: the group is emitted most recent first,
//! at the position of its oldest member. Searching "Pair" over a page titled
//! "testTitlePair" and its edit with the same title returns the edit first.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tracing::debug;

use crate::error::{WikiError, WikiResult};
use crate::store::WikiStore;
use crate::types::Revision;

/// A revision search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Three independent predicates, ANDed. An empty predicate matches
    /// everything for its field. `author` matches the author's userName.
    Fields {
        /// Title substring.
        title: String,
        /// Author userName substring.
        author: String,
        /// Content substring.
        content: String,
    },
    /// One substring matched against title OR content. Empty text matches
    /// nothing.
    Text(String),
}

impl SearchQuery {
    /// Build a three-field query.
    pub fn fields(
        title: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Fields {
            title: title.into(),
            author: author.into(),
            content: content.into(),
        }
    }

    /// Build a title-or-content query.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Whether no revision can match.
    pub fn matches_nothing(&self) -> bool {
        matches!(self, Self::Text(t) if t.is_empty())
    }

    /// Evaluate the query against one revision and its author's userName.
    pub fn matches(&self, revision: &Revision, author_name: &str) -> bool {
        match self {
            Self::Fields { title, author, content } => {
                contains_ignore_case(&revision.title, title)
                    && contains_ignore_case(author_name, author)
                    && contains_ignore_case(&revision.content, content)
            }
            Self::Text(text) => {
                !text.is_empty()
                    && (contains_ignore_case(&revision.title, text)
                        || contains_ignore_case(&revision.content, text))
            }
        }
    }
}

/// Case-insensitive substring test. An empty needle always matches.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Field whose identical values make two results a tie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TieKey {
    Title(String),
    Author(i64),
    Content(String),
}

fn tie_key(query: &SearchQuery, revision: &Revision) -> Option<TieKey> {
    match query {
        SearchQuery::Fields { title, author, content } => {
            if !title.is_empty() {
                Some(TieKey::Title(revision.title.clone()))
            } else if !author.is_empty() {
                Some(TieKey::Author(revision.author.get()))
            } else if !content.is_empty() {
                Some(TieKey::Content(revision.content.clone()))
            } else {
                None
            }
        }
        SearchQuery::Text(_) => Some(TieKey::Title(revision.title.clone())),
    }
}

/// Order results by id, then reverse each group of equal keys in place of
/// its first member.
fn order_ties<K, F>(mut revisions: Vec<Revision>, key: F) -> Vec<Revision>
where
    K: Eq + Hash,
    F: Fn(&Revision) -> K,
{
    revisions.sort_by_key(|r| r.id);

    let mut groups: Vec<Vec<Revision>> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();
    for revision in revisions {
        let k = key(&revision);
        match index.get(&k) {
            Some(&i) => groups[i].push(revision),
            None => {
                index.insert(k, groups.len());
                groups.push(vec![revision]);
            }
        }
    }

    groups
        .into_iter()
        .flat_map(|mut group| {
            group.sort_by(|a, b| b.id.cmp(&a.id));
            group
        })
        .collect()
}

/// Query surface over the revision store.
pub struct SearchIndex<S: WikiStore> {
    store: Arc<S>,
}

impl<S: WikiStore> Clone for SearchIndex<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store) }
    }
}

impl<S: WikiStore> SearchIndex<S> {
    /// Create a search index over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Run a query and apply result ordering.
    pub async fn run(&self, query: &SearchQuery) -> WikiResult<Vec<Revision>> {
        if query.matches_nothing() {
            return Ok(Vec::new());
        }

        let found = self.store.search_revisions(query).await.map_err(WikiError::from_store)?;
        debug!(results = found.len(), ?query, "revision search");

        if has_tie_field(query) {
            Ok(order_ties(found, |r| tie_key(query, r)))
        } else {
            let mut found = found;
            found.sort_by_key(|r| r.id);
            Ok(found)
        }
    }

    /// Three-field search.
    pub async fn advanced(&self, title: &str, author: &str, content: &str) -> WikiResult<Vec<Revision>> {
        self.run(&SearchQuery::fields(title, author, content)).await
    }

    /// Title-or-content search.
    pub async fn quick(&self, text: &str) -> WikiResult<Vec<Revision>> {
        self.run(&SearchQuery::text(text)).await
    }
}

fn has_tie_field(query: &SearchQuery) -> bool {
    match query {
        SearchQuery::Fields { title, author, content } => {
            !(title.is_empty() && author.is_empty() && content.is_empty())
        }
        SearchQuery::Text(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParentRef, RevisionDraft, RevisionId, UserId};
    use chrono::Utc;

    fn rev(id: i64, title: &str, content: &str, author: i64) -> Revision {
        Revision::from_draft(
            RevisionId::new(id),
            RevisionDraft::new(title, content, ParentRef::Root, UserId::new(author)),
            Utc::now(),
        )
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("testTitlePair", "TitLEpair"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("testTitle1", "Title2"));
    }

    #[test]
    fn test_fields_query_ands_predicates() {
        let r = rev(1, "testTitle1", "testContent1", 1);
        assert!(SearchQuery::fields("", "", "").matches(&r, "testUserName1"));
        assert!(SearchQuery::fields("title1", "USERNAME1", "content1").matches(&r, "testUserName1"));
        assert!(!SearchQuery::fields("title1", "someoneElse", "").matches(&r, "testUserName1"));
        assert!(!SearchQuery::fields("", "", "content2").matches(&r, "testUserName1"));
    }

    #[test]
    fn test_text_query_matches_title_or_content() {
        let r = rev(1, "testTitle1", "testContent1", 1);
        assert!(SearchQuery::text("content1").matches(&r, "u"));
        assert!(SearchQuery::text("TITLE1").matches(&r, "u"));
        assert!(!SearchQuery::text("").matches(&r, "u"));
        assert!(SearchQuery::text("").matches_nothing());
    }

    #[test]
    fn test_tie_groups_most_recent_first() {
        let results = vec![
            rev(1, "testTitle1", "a", 1),
            rev(2, "testTitlePair", "b", 2),
            rev(3, "other", "c", 1),
            rev(4, "testTitlePair", "d", 2),
        ];
        let query = SearchQuery::fields("t", "", "");
        let ordered = order_ties(results, |r| tie_key(&query, r));
        let ids: Vec<i64> = ordered.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_no_predicates_keeps_creation_order() {
        assert!(!has_tie_field(&SearchQuery::fields("", "", "")));
        assert!(has_tie_field(&SearchQuery::fields("", "bob", "")));
    }
}
