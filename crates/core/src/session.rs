//! Editing sessions.
//!
//! An [`EditSession`] holds a private copy of a document's editable fields
//! under undo/redo history. Every editor operation is recorded in the
//! history; nothing reaches the store until the caller saves the session's
//! draft, and the version store only ticks on that save.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::block::Block;
use crate::document::{ContentDocument, DocumentDraft, DraftField, DraftPatch};
use crate::editor::{ChangeNotifier, Editor};
use crate::error::CoreError;
use crate::history::{History, HistoryConfig};
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditSession {
    document_id: DbId,
    /// `updated_at` of the committed row this session is based on.
    base_updated_at: Timestamp,
    saved: DocumentDraft,
    history: History<DocumentDraft>,
}

/// Feeds every editor state into the session history.
pub struct SessionNotifier<'a> {
    history: &'a mut History<DocumentDraft>,
}

impl ChangeNotifier for SessionNotifier<'_> {
    fn changed(&mut self, draft: &DocumentDraft) {
        self.history.set(draft.clone());
    }
}

impl EditSession {
    pub fn open(doc: &ContentDocument) -> Self {
        Self::open_with_config(doc, HistoryConfig::default())
    }

    pub fn open_with_config(doc: &ContentDocument, config: HistoryConfig) -> Self {
        let draft = doc.draft();
        Self {
            document_id: doc.id,
            base_updated_at: doc.updated_at,
            saved: draft.clone(),
            history: History::with_config(draft, config),
        }
    }

    pub fn document_id(&self) -> DbId {
        self.document_id
    }

    /// The optimistic precondition to send with the next save.
    pub fn base_updated_at(&self) -> Timestamp {
        self.base_updated_at
    }

    pub fn draft(&self) -> &DocumentDraft {
        self.history.present()
    }

    /// The full draft as a save patch.
    pub fn patch(&self) -> DraftPatch {
        DraftPatch::from(self.draft().clone())
    }

    /// Whether the draft differs from the last saved state.
    pub fn is_dirty(&self) -> bool {
        *self.draft() != self.saved
    }

    pub fn history(&self) -> &History<DocumentDraft> {
        &self.history
    }

    /// An editor over the current draft whose changes land in this session.
    pub fn editor(&mut self) -> Editor<SessionNotifier<'_>> {
        let draft = self.history.present().clone();
        Editor::new(
            draft,
            SessionNotifier {
                history: &mut self.history,
            },
        )
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo()
    }

    /// Load a different document, discarding all history.
    pub fn load(&mut self, doc: &ContentDocument) {
        let draft = doc.draft();
        self.document_id = doc.id;
        self.base_updated_at = doc.updated_at;
        self.saved = draft.clone();
        self.history.reset(draft);
    }

    /// Rebase onto the row produced by a successful save, keeping history.
    pub fn mark_saved(&mut self, doc: &ContentDocument) -> Result<(), CoreError> {
        if doc.id != self.document_id {
            return Err(CoreError::Validation(format!(
                "Session is editing document {} but saved document {}",
                self.document_id, doc.id
            )));
        }
        self.base_updated_at = doc.updated_at;
        self.saved = self.draft().clone();
        Ok(())
    }

    // -- Convenience wrappers over the editor --------------------------------

    pub fn update_field(&mut self, field: DraftField) {
        self.editor().update_field(field);
    }

    pub fn update_fields(&mut self, patch: DraftPatch) {
        self.editor().update_fields(patch);
    }

    pub fn add_block(&mut self, block: Block) {
        self.editor().add_block(block);
    }

    pub fn remove_block(&mut self, index: usize) -> Result<(), CoreError> {
        self.editor().remove_block(index).map(|_| ())
    }

    pub fn update_block(&mut self, index: usize, patch: &Map<String, Value>) -> Result<(), CoreError> {
        self.editor().update_block(index, patch).map(|_| ())
    }

    pub fn reorder_blocks(&mut self, from: usize, to: usize) -> Result<(), CoreError> {
        self.editor().reorder_blocks(from, to).map(|_| ())
    }

    pub fn add_block_item(&mut self, index: usize, field: &str, item: Value) -> Result<(), CoreError> {
        self.editor().add_block_item(index, field, item).map(|_| ())
    }

    pub fn remove_block_item(
        &mut self,
        index: usize,
        field: &str,
        item_index: usize,
    ) -> Result<(), CoreError> {
        self.editor()
            .remove_block_item(index, field, item_index)
            .map(|_| ())
    }

    pub fn update_block_item(
        &mut self,
        index: usize,
        field: &str,
        item_index: usize,
        patch: &Map<String, Value>,
    ) -> Result<(), CoreError> {
        self.editor()
            .update_block_item(index, field, item_index, patch)
            .map(|_| ())
    }

    pub fn reorder_block_items(
        &mut self,
        index: usize,
        field: &str,
        from: usize,
        to: usize,
    ) -> Result<(), CoreError> {
        self.editor()
            .reorder_block_items(index, field, from, to)
            .map(|_| ())
    }
}
