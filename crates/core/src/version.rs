//! Version snapshots.
//!
//! A snapshot is an immutable copy of a document's `title`, `blocks` and
//! `meta`, written in the same atomic unit as the save that produced it.
//! Versions are numbered per document, so ordering does not depend on clock
//! resolution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::Block;
use crate::document::{ContentDocument, DraftPatch};
use crate::types::{DbId, Timestamp};

/// Default page size when listing versions.
pub const DEFAULT_VERSION_LIMIT: i64 = 50;

/// Maximum page size when listing versions.
pub const MAX_VERSION_LIMIT: i64 = 200;

/// An immutable historical copy of a document's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub id: DbId,
    pub document_id: DbId,
    /// 1-based, strictly increasing per document.
    pub version_number: i32,
    pub title: String,
    pub blocks: Vec<Block>,
    pub meta: Value,
    pub created_at: Timestamp,
    pub created_by: Option<DbId>,
}

impl VersionSnapshot {
    /// Whether `doc` currently carries exactly this snapshot's content.
    pub fn content_matches(&self, doc: &ContentDocument) -> bool {
        self.title == doc.title && self.blocks == doc.blocks && self.meta == doc.meta
    }

    /// The patch that brings a document back to this snapshot's content.
    pub fn restore_patch(&self) -> DraftPatch {
        DraftPatch {
            slug: None,
            title: Some(self.title.clone()),
            blocks: Some(self.blocks.clone()),
            meta: Some(self.meta.clone()),
        }
    }
}

/// Content captured for a new snapshot. The store assigns `id` and
/// `version_number`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVersion {
    pub document_id: DbId,
    pub title: String,
    pub blocks: Vec<Block>,
    pub meta: Value,
    pub created_at: Timestamp,
    pub created_by: Option<DbId>,
}

impl NewVersion {
    /// Capture the committed state of `doc`.
    pub fn capture(doc: &ContentDocument) -> Self {
        Self {
            document_id: doc.id,
            title: doc.title.clone(),
            blocks: doc.blocks.clone(),
            meta: doc.meta.clone(),
            created_at: doc.updated_at,
            created_by: doc.updated_by,
        }
    }
}

/// Clamp a user-provided page size into `1..=max`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Block diff
// ---------------------------------------------------------------------------

/// Block-level differences between two versions, keyed by block id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Present in both with a different position relative to the others.
    pub moved: Vec<String>,
    /// Present in both with different type or data.
    pub changed: Vec<String>,
    pub title_changed: bool,
    pub meta_changed: bool,
}

impl BlockDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.moved.is_empty()
            && self.changed.is_empty()
            && !self.title_changed
            && !self.meta_changed
    }
}

/// Compare `old` against `new`.
pub fn diff_versions(old: &VersionSnapshot, new: &VersionSnapshot) -> BlockDiff {
    let mut diff = diff_blocks(&old.blocks, &new.blocks);
    diff.title_changed = old.title != new.title;
    diff.meta_changed = old.meta != new.meta;
    diff
}

/// Compare two block lists by id.
pub fn diff_blocks(old: &[Block], new: &[Block]) -> BlockDiff {
    let old_by_id: HashMap<&str, &Block> = old.iter().map(|b| (b.id.as_str(), b)).collect();
    let new_by_id: HashMap<&str, &Block> = new.iter().map(|b| (b.id.as_str(), b)).collect();

    let mut diff = BlockDiff::default();
    for block in new {
        match old_by_id.get(block.id.as_str()) {
            None => diff.added.push(block.id.clone()),
            Some(prev) if prev.data != block.data => diff.changed.push(block.id.clone()),
            Some(_) => {}
        }
    }
    for block in old {
        if !new_by_id.contains_key(block.id.as_str()) {
            diff.removed.push(block.id.clone());
        }
    }

    // Relative order of the blocks present on both sides.
    let old_common: Vec<&str> = old
        .iter()
        .map(|b| b.id.as_str())
        .filter(|id| new_by_id.contains_key(id))
        .collect();
    let new_common: Vec<&str> = new
        .iter()
        .map(|b| b.id.as_str())
        .filter(|id| old_by_id.contains_key(id))
        .collect();
    for (i, id) in new_common.iter().enumerate() {
        if old_common.get(i) != Some(id) {
            diff.moved.push((*id).to_string());
        }
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockData, TextBlock};
    use crate::document::{DocumentKind, NewDocument};
    use chrono::Utc;
    use serde_json::json;

    fn text(id: &str, content: &str) -> Block {
        Block::with_id(
            id,
            BlockData::Text(TextBlock {
                content: content.into(),
                alignment: None,
            }),
        )
    }

    #[test]
    fn capture_copies_committed_content() {
        let doc = ContentDocument::from_new(
            3,
            NewDocument::new(DocumentKind::Page, "Pricing")
                .with_blocks(vec![text("b1", "plans")])
                .with_author(8),
            "pricing".into(),
            Utc::now(),
        );
        let version = NewVersion::capture(&doc);
        assert_eq!(version.document_id, 3);
        assert_eq!(version.blocks, doc.blocks);
        assert_eq!(version.created_at, doc.updated_at);
        assert_eq!(version.created_by, Some(8));
    }

    #[test]
    fn restore_patch_keeps_slug() {
        let snapshot = VersionSnapshot {
            id: 1,
            document_id: 3,
            version_number: 1,
            title: "Old".into(),
            blocks: vec![text("b1", "x")],
            meta: json!({"a": 1}),
            created_at: Utc::now(),
            created_by: None,
        };
        let patch = snapshot.restore_patch();
        assert!(patch.slug.is_none());
        assert_eq!(patch.title.as_deref(), Some("Old"));
        assert_eq!(patch.meta, Some(json!({"a": 1})));
    }

    #[test]
    fn clamp_values() {
        assert_eq!(clamp_limit(None, 50, 200), 50);
        assert_eq!(clamp_limit(Some(0), 50, 200), 1);
        assert_eq!(clamp_limit(Some(1000), 50, 200), 200);
        assert_eq!(clamp_offset(Some(-4)), 0);
    }

    #[test]
    fn diff_detects_added_removed_changed_and_moved() {
        let old = vec![text("a", "1"), text("b", "2"), text("c", "3")];
        let new = vec![text("c", "3"), text("a", "1*"), text("d", "4")];
        let diff = diff_blocks(&old, &new);
        assert_eq!(diff.added, vec!["d"]);
        assert_eq!(diff.removed, vec!["b"]);
        assert_eq!(diff.changed, vec!["a"]);
        assert_eq!(diff.moved, vec!["c", "a"]);
    }

    #[test]
    fn identical_lists_have_empty_diff() {
        let blocks = vec![text("a", "1"), text("b", "2")];
        assert!(diff_blocks(&blocks, &blocks).is_empty());
    }
}
