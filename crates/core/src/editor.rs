//! Generic block editor.
//!
//! Pure array operations over a document's block list (or any multi-valued
//! field inside a block's `data`), plus an [`Editor`] that applies them to a
//! [`DocumentDraft`] and reports every new state to a [`ChangeNotifier`].
//!
//! Out-of-range indices are precondition violations and return
//! [`CoreError::Validation`] rather than silently doing nothing.

use serde_json::{Map, Value};

use crate::block::{Block, BlockData};
use crate::document::{DocumentDraft, DraftField, DraftPatch};
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Array operations
// ---------------------------------------------------------------------------

fn check_index(len: usize, index: usize) -> Result<(), CoreError> {
    if index < len {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Index {index} is out of bounds for a list of length {len}"
        )))
    }
}

/// Append `item` to the end.
pub fn add_array_item<T: Clone>(items: &[T], item: T) -> Vec<T> {
    let mut next = items.to_vec();
    next.push(item);
    next
}

/// Remove the element at `index`.
pub fn remove_array_item<T: Clone>(items: &[T], index: usize) -> Result<Vec<T>, CoreError> {
    check_index(items.len(), index)?;
    let mut next = items.to_vec();
    next.remove(index);
    Ok(next)
}

/// Move the element at `from` to `to`, shifting the elements in between.
///
/// The result is always a permutation of `items`.
pub fn reorder_array_items<T: Clone>(
    items: &[T],
    from: usize,
    to: usize,
) -> Result<Vec<T>, CoreError> {
    check_index(items.len(), from)?;
    check_index(items.len(), to)?;
    let mut next = items.to_vec();
    let item = next.remove(from);
    next.insert(to, item);
    Ok(next)
}

/// Shallow-merge the keys of `patch` into the JSON object at `index`.
pub fn update_array_item(
    items: &[Value],
    index: usize,
    patch: &Map<String, Value>,
) -> Result<Vec<Value>, CoreError> {
    check_index(items.len(), index)?;
    let mut next = items.to_vec();
    next[index] = merge_object(&next[index], patch)?;
    Ok(next)
}

fn merge_object(target: &Value, patch: &Map<String, Value>) -> Result<Value, CoreError> {
    let mut merged = match target {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            return Err(CoreError::Validation(format!(
                "Cannot merge fields into a non-object value: {other}"
            )))
        }
    };
    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }
    Ok(Value::Object(merged))
}

// ---------------------------------------------------------------------------
// Block-level operations
// ---------------------------------------------------------------------------

/// Shallow-merge `patch` into the `data` of the block at `index`.
///
/// The block keeps its `id` and `type`; the merged data must still be valid
/// for that type.
pub fn update_block(
    blocks: &[Block],
    index: usize,
    patch: &Map<String, Value>,
) -> Result<Vec<Block>, CoreError> {
    check_index(blocks.len(), index)?;
    let block = &blocks[index];
    let merged = merge_object(&block.data.to_value(), patch)?;
    let data = BlockData::from_parts(block.block_type().as_str(), merged)?;
    let mut next = blocks.to_vec();
    next[index] = Block::with_id(block.id.clone(), data);
    Ok(next)
}

/// Apply an array operation to the multi-valued `field` inside a block's data
/// (accordion items, gallery images, stats items).
pub fn edit_block_items<F>(
    blocks: &[Block],
    index: usize,
    field: &str,
    op: F,
) -> Result<Vec<Block>, CoreError>
where
    F: FnOnce(&[Value]) -> Result<Vec<Value>, CoreError>,
{
    check_index(blocks.len(), index)?;
    let block = &blocks[index];
    let mut data = match block.data.to_value() {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let items = match data.get(field) {
        Some(Value::Array(items)) => items.clone(),
        Some(_) | None => {
            return Err(CoreError::Validation(format!(
                "Block '{}' of type {} has no list field '{field}'",
                block.id,
                block.block_type()
            )))
        }
    };
    data.insert(field.to_string(), Value::Array(op(&items)?));
    let typed = BlockData::from_parts(block.block_type().as_str(), Value::Object(data))?;
    let mut next = blocks.to_vec();
    next[index] = Block::with_id(block.id.clone(), typed);
    Ok(next)
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// Receives every new draft state produced by an [`Editor`].
pub trait ChangeNotifier {
    fn changed(&mut self, draft: &DocumentDraft);
}

impl<F: FnMut(&DocumentDraft)> ChangeNotifier for F {
    fn changed(&mut self, draft: &DocumentDraft) {
        self(draft)
    }
}

/// Applies block-model operations to a draft.
///
/// Each successful operation notifies exactly once with the new state. A
/// failed operation leaves the draft untouched and notifies nobody.
pub struct Editor<N: ChangeNotifier> {
    draft: DocumentDraft,
    notifier: N,
}

impl<N: ChangeNotifier> Editor<N> {
    pub fn new(draft: DocumentDraft, notifier: N) -> Self {
        Self { draft, notifier }
    }

    pub fn draft(&self) -> &DocumentDraft {
        &self.draft
    }

    pub fn into_draft(self) -> DocumentDraft {
        self.draft
    }

    fn commit(&mut self, next: DocumentDraft) -> &DocumentDraft {
        self.draft = next;
        self.notifier.changed(&self.draft);
        &self.draft
    }

    fn commit_blocks(&mut self, blocks: Vec<Block>) -> &DocumentDraft {
        let next = self.draft.update_field(DraftField::Blocks(blocks));
        self.commit(next)
    }

    pub fn update_field(&mut self, field: DraftField) -> &DocumentDraft {
        let next = self.draft.update_field(field);
        self.commit(next)
    }

    pub fn update_fields(&mut self, patch: DraftPatch) -> &DocumentDraft {
        let next = self.draft.update_fields(patch);
        self.commit(next)
    }

    pub fn add_block(&mut self, block: Block) -> &DocumentDraft {
        let blocks = add_array_item(&self.draft.blocks, block);
        self.commit_blocks(blocks)
    }

    pub fn remove_block(&mut self, index: usize) -> Result<&DocumentDraft, CoreError> {
        let blocks = remove_array_item(&self.draft.blocks, index)?;
        Ok(self.commit_blocks(blocks))
    }

    pub fn update_block(
        &mut self,
        index: usize,
        patch: &Map<String, Value>,
    ) -> Result<&DocumentDraft, CoreError> {
        let blocks = update_block(&self.draft.blocks, index, patch)?;
        Ok(self.commit_blocks(blocks))
    }

    pub fn reorder_blocks(&mut self, from: usize, to: usize) -> Result<&DocumentDraft, CoreError> {
        let blocks = reorder_array_items(&self.draft.blocks, from, to)?;
        Ok(self.commit_blocks(blocks))
    }

    pub fn add_block_item(
        &mut self,
        index: usize,
        field: &str,
        item: Value,
    ) -> Result<&DocumentDraft, CoreError> {
        let blocks =
            edit_block_items(&self.draft.blocks, index, field, |items| Ok(add_array_item(items, item)))?;
        Ok(self.commit_blocks(blocks))
    }

    pub fn remove_block_item(
        &mut self,
        index: usize,
        field: &str,
        item_index: usize,
    ) -> Result<&DocumentDraft, CoreError> {
        let blocks = edit_block_items(&self.draft.blocks, index, field, |items| {
            remove_array_item(items, item_index)
        })?;
        Ok(self.commit_blocks(blocks))
    }

    pub fn update_block_item(
        &mut self,
        index: usize,
        field: &str,
        item_index: usize,
        patch: &Map<String, Value>,
    ) -> Result<&DocumentDraft, CoreError> {
        let blocks = edit_block_items(&self.draft.blocks, index, field, |items| {
            update_array_item(items, item_index, patch)
        })?;
        Ok(self.commit_blocks(blocks))
    }

    pub fn reorder_block_items(
        &mut self,
        index: usize,
        field: &str,
        from: usize,
        to: usize,
    ) -> Result<&DocumentDraft, CoreError> {
        let blocks = edit_block_items(&self.draft.blocks, index, field, |items| {
            reorder_array_items(items, from, to)
        })?;
        Ok(self.commit_blocks(blocks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{AccordionBlock, AccordionItem, TextBlock};
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

    fn ids(blocks: &[Block]) -> Vec<&str> {
        blocks.iter().map(|b| b.id.as_str()).collect()
    }

    fn empty_draft() -> DocumentDraft {
        DocumentDraft {
            slug: "home".into(),
            title: "Home".into(),
            blocks: vec![],
            meta: json!({}),
        }
    }

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn reorder_moves_forward_and_backward() {
        let blocks: Vec<Block> = ["a", "b", "c", "d"].iter().map(|id| text(id, "")).collect();
        assert_eq!(ids(&reorder_array_items(&blocks, 0, 2).unwrap()), ["b", "c", "a", "d"]);
        assert_eq!(ids(&reorder_array_items(&blocks, 3, 1).unwrap()), ["a", "d", "b", "c"]);
        assert_eq!(ids(&reorder_array_items(&blocks, 2, 2).unwrap()), ["a", "b", "c", "d"]);
    }

    #[test]
    fn reorder_is_a_permutation_for_every_index_pair() {
        let blocks: Vec<Block> = (0..6).map(|i| text(&format!("b{i}"), "x")).collect();
        let mut expected = ids(&blocks);
        expected.sort();
        for from in 0..blocks.len() {
            for to in 0..blocks.len() {
                let next = reorder_array_items(&blocks, from, to).unwrap();
                assert_eq!(next.len(), blocks.len());
                let mut got = ids(&next);
                got.sort();
                assert_eq!(got, expected, "from={from} to={to}");
                assert_eq!(next[to], blocks[from]);
            }
        }
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let blocks = vec![text("a", "")];
        assert!(remove_array_item(&blocks, 1).is_err());
        assert!(reorder_array_items(&blocks, 0, 1).is_err());
        assert!(update_array_item(&[json!({})], 3, &Map::new()).is_err());
        assert!(update_block(&blocks, 5, &Map::new()).is_err());
    }

    #[test]
    fn update_array_item_merges_shallowly() {
        let items = vec![json!({"title": "Q1", "content": "A1"})];
        let next = update_array_item(&items, 0, &obj(json!({"content": "A2"}))).unwrap();
        assert_eq!(next[0], json!({"title": "Q1", "content": "A2"}));
    }

    #[test]
    fn update_block_keeps_id_and_type() {
        let blocks = vec![text("b1", "hello")];
        let next = update_block(&blocks, 0, &obj(json!({"content": "bye"}))).unwrap();
        assert_eq!(next[0].id, "b1");
        match &next[0].data {
            BlockData::Text(t) => assert_eq!(t.content, "bye"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn update_block_rejects_invalid_shape() {
        let blocks = vec![text("b1", "hello")];
        assert!(update_block(&blocks, 0, &obj(json!({"content": 42}))).is_err());
    }

    #[test]
    fn editor_notifies_once_per_operation() {
        let mut seen: Vec<usize> = Vec::new();
        {
            let mut editor = Editor::new(empty_draft(), |d: &DocumentDraft| seen.push(d.blocks.len()));
            editor.add_block(text("b1", "one"));
            editor.add_block(text("b2", "two"));
            editor.reorder_blocks(1, 0).unwrap();
            editor.remove_block(0).unwrap();
            assert!(editor.remove_block(4).is_err());
            editor.update_field(DraftField::Title("Start".into()));
            assert_eq!(ids(&editor.draft().blocks), ["b1"]);
        }
        assert_eq!(seen, vec![1, 2, 2, 1, 1]);
    }

    #[test]
    fn editor_edits_nested_items() {
        let accordion = Block::with_id(
            "acc",
            BlockData::Accordion(AccordionBlock {
                heading: None,
                items: vec![AccordionItem {
                    title: "Shipping".into(),
                    content: "3 days".into(),
                }],
            }),
        );
        let mut editor = Editor::new(empty_draft(), |_: &DocumentDraft| {});
        editor.add_block(accordion);
        editor
            .add_block_item(0, "items", json!({"title": "Returns", "content": "30 days"}))
            .unwrap();
        editor
            .update_block_item(0, "items", 0, &obj(json!({"content": "2 days"})))
            .unwrap();
        editor.reorder_block_items(0, "items", 1, 0).unwrap();
        assert!(editor.add_block_item(0, "missing", json!({})).is_err());

        match &editor.draft().blocks[0].data {
            BlockData::Accordion(a) => {
                assert_eq!(a.items[0].title, "Returns");
                assert_eq!(a.items[1].content, "2 days");
            }
            other => panic!("unexpected {other:?}"),
        }

        editor.remove_block_item(0, "items", 0).unwrap();
        match &editor.draft().blocks[0].data {
            BlockData::Accordion(a) => assert_eq!(a.items.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }
}
