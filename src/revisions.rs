//! Revision tree operations.
//!
//! Every page version is a node in a tree rooted at a revision whose parent
//! is the root sentinel. Editing never mutates a revision: it appends a child.
//! Walks over the tree are iterative and bounded by
//! [`WikiConfig::max_ancestry_depth`], so a corrupted chain surfaces as an
//! internal error instead of an endless loop.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::WikiConfig;
use crate::error::{WikiError, WikiResult};
use crate::search::SearchIndex;
use crate::store::WikiStore;
use crate::types::{ParentRef, Revision, RevisionDraft, RevisionId, UserId};

/// Validated access to the revision tree.
pub struct RevisionStore<S: WikiStore> {
    store: Arc<S>,
    search: SearchIndex<S>,
    config: WikiConfig,
}

impl<S: WikiStore> Clone for RevisionStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            search: self.search.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: WikiStore> RevisionStore<S> {
    /// Create a revision store over a backend.
    pub fn new(store: Arc<S>, config: WikiConfig) -> Self {
        Self {
            search: SearchIndex::new(Arc::clone(&store)),
            store,
            config,
        }
    }

    /// Create a new revision, either a new page (`parent_id == -1`) or an
    /// edit of an existing revision.
    ///
    /// All checks run before the write. The store records the revision in the
    /// author's created pages in the same atomic operation.
    pub async fn create_revision(
        &self,
        title: &str,
        content: &str,
        parent_id: i64,
        author: UserId,
    ) -> WikiResult<Revision> {
        if title.is_empty() {
            return Err(WikiError::Validation("title must not be empty".to_string()));
        }
        let parent = ParentRef::from_raw(parent_id)
            .ok_or_else(|| WikiError::Validation(format!("invalid parent id: {}", parent_id)))?;

        match self.store.get_user(author).await.map_err(WikiError::from_store)? {
            None => return Err(WikiError::user_not_found(author)),
            Some(user) if user.is_deleted => {
                return Err(WikiError::Forbidden(format!("account {} is deleted", author)))
            }
            Some(_) => {}
        }

        let draft = RevisionDraft::new(title, content, parent, author);
        if let ParentRef::Revision(parent_rev) = parent {
            let parent_revision = self.get(parent_rev).await?;
            if draft.same_page_as(&parent_revision) {
                return Err(WikiError::NoChange { parent: parent_rev.get() });
            }
        }

        let revision = self.store.insert_revision(draft).await.map_err(WikiError::from_store)?;
        info!(
            revision_id = %revision.id,
            parent_id = %revision.parent,
            author_id = %author,
            "Revision created"
        );
        Ok(revision)
    }

    /// Fetch a revision without counting a view.
    pub async fn get(&self, id: RevisionId) -> WikiResult<Revision> {
        self.store
            .get_revision(id)
            .await
            .map_err(WikiError::from_store)?
            .ok_or_else(|| WikiError::revision_not_found(id))
    }

    /// Follow parent links up to the revision that starts the tree.
    pub async fn find_root(&self, id: RevisionId) -> WikiResult<Revision> {
        let mut current = self.get(id).await?;
        let mut hops = 0usize;

        while let ParentRef::Revision(parent_id) = current.parent {
            hops += 1;
            if hops > self.config.max_ancestry_depth {
                warn!(revision_id = %id, hops, "Ancestry walk exceeded depth guard");
                return Err(WikiError::Internal(format!(
                    "parent chain of revision {} exceeds {} hops",
                    id, self.config.max_ancestry_depth
                )));
            }
            current = self
                .store
                .get_revision(parent_id)
                .await
                .map_err(WikiError::from_store)?
                .ok_or_else(|| {
                    warn!(revision_id = %current.id, parent_id = %parent_id, "Dangling parent link");
                    WikiError::Internal(format!(
                        "revision {} points at missing parent {}",
                        current.id, parent_id
                    ))
                })?;
        }

        debug!(revision_id = %id, root_id = %current.id, hops, "Root resolved");
        Ok(current)
    }

    /// Every revision in the subtree under `root_id`, root included, in
    /// ascending id order.
    pub async fn find_descendants(&self, root_id: RevisionId) -> WikiResult<Vec<Revision>> {
        let root = self.get(root_id).await?;

        let mut found = Vec::new();
        let mut visited: HashSet<RevisionId> = HashSet::new();
        let mut frontier: VecDeque<(Revision, usize)> = VecDeque::new();
        visited.insert(root.id);
        frontier.push_back((root, 0));

        while let Some((revision, level)) = frontier.pop_front() {
            let children = self.store.get_children(revision.id).await.map_err(WikiError::from_store)?;
            found.push(revision);

            if children.is_empty() {
                continue;
            }
            if level + 1 > self.config.max_ancestry_depth {
                warn!(root_id = %root_id, level, "Descendant walk exceeded depth guard");
                return Err(WikiError::Internal(format!(
                    "tree under revision {} exceeds {} levels",
                    root_id, self.config.max_ancestry_depth
                )));
            }

            for child_id in children {
                if !visited.insert(child_id) {
                    return Err(WikiError::Internal(format!(
                        "revision {} reached twice under root {}",
                        child_id, root_id
                    )));
                }
                let child = self
                    .store
                    .get_revision(child_id)
                    .await
                    .map_err(WikiError::from_store)?
                    .ok_or_else(|| WikiError::Internal(format!("child {} vanished", child_id)))?;
                frontier.push_back((child, level + 1));
            }
        }

        found.sort_by_key(|r| r.id);
        debug!(root_id = %root_id, revisions = found.len(), "Descendants collected");
        Ok(found)
    }

    /// The whole tree containing `id`. Every member of a tree yields the
    /// same list.
    pub async fn history(&self, id: RevisionId) -> WikiResult<Vec<Revision>> {
        let root = self.find_root(id).await?;
        self.find_descendants(root.id).await
    }

    /// Count one view and return the updated revision.
    pub async fn record_view(&self, id: RevisionId) -> WikiResult<Revision> {
        self.store
            .increment_views(id)
            .await
            .map_err(WikiError::from_store)?
            .ok_or_else(|| WikiError::revision_not_found(id))
    }

    /// Three-field search; see [`SearchIndex::advanced`].
    pub async fn search(&self, title: &str, author: &str, content: &str) -> WikiResult<Vec<Revision>> {
        self.search.advanced(title, author, content).await
    }

    /// The search index over the same backend.
    pub fn search_index(&self) -> &SearchIndex<S> {
        &self.search
    }

    /// Get the backend.
    pub fn store(&self) -> &S {
        &self.store
    }
}
