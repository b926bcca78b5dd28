//! Content block model.
//!
//! A [`Block`] is one unit of page/post content, persisted as
//! `{ "id": ..., "type": ..., "data": { ... } }`. The set of block types is a
//! closed sum type ([`BlockData`]); each variant carries its own payload struct.
//! The persisted `data` shape is camelCase to match the stored JSON.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Reading speed used for the derived reading-time field.
pub const WORDS_PER_MINUTE: usize = 200;

// ---------------------------------------------------------------------------
// Block type discriminant
// ---------------------------------------------------------------------------

/// The `type` discriminant of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Hero,
    Text,
    Image,
    Accordion,
    Gallery,
    Cta,
    Stats,
    Quote,
    Video,
    Divider,
}

impl BlockType {
    pub const ALL: [BlockType; 10] = [
        BlockType::Hero,
        BlockType::Text,
        BlockType::Image,
        BlockType::Accordion,
        BlockType::Gallery,
        BlockType::Cta,
        BlockType::Stats,
        BlockType::Quote,
        BlockType::Video,
        BlockType::Divider,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Hero => "hero",
            BlockType::Text => "text",
            BlockType::Image => "image",
            BlockType::Accordion => "accordion",
            BlockType::Gallery => "gallery",
            BlockType::Cta => "cta",
            BlockType::Stats => "stats",
            BlockType::Quote => "quote",
            BlockType::Video => "video",
            BlockType::Divider => "divider",
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeroBlock {
    pub heading: String,
    pub subheading: Option<String>,
    pub background_image: Option<String>,
    pub cta_label: Option<String>,
    pub cta_href: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextBlock {
    pub content: String,
    pub alignment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageBlock {
    pub src: String,
    pub alt: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccordionItem {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccordionBlock {
    pub heading: Option<String>,
    pub items: Vec<AccordionItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GalleryImage {
    pub src: String,
    pub alt: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GalleryBlock {
    pub images: Vec<GalleryImage>,
    pub columns: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CtaBlock {
    pub heading: String,
    pub body: Option<String>,
    pub button_label: String,
    pub button_href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatItem {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsBlock {
    pub items: Vec<StatItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuoteBlock {
    pub text: String,
    pub attribution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoBlock {
    pub url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DividerBlock {
    pub style: Option<String>,
}

// ---------------------------------------------------------------------------
// BlockData
// ---------------------------------------------------------------------------

/// Typed block payload. Serialized adjacently tagged as `{ "type", "data" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BlockData {
    Hero(HeroBlock),
    Text(TextBlock),
    Image(ImageBlock),
    Accordion(AccordionBlock),
    Gallery(GalleryBlock),
    Cta(CtaBlock),
    Stats(StatsBlock),
    Quote(QuoteBlock),
    Video(VideoBlock),
    Divider(DividerBlock),
}

impl BlockData {
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockData::Hero(_) => BlockType::Hero,
            BlockData::Text(_) => BlockType::Text,
            BlockData::Image(_) => BlockType::Image,
            BlockData::Accordion(_) => BlockType::Accordion,
            BlockData::Gallery(_) => BlockType::Gallery,
            BlockData::Cta(_) => BlockType::Cta,
            BlockData::Stats(_) => BlockType::Stats,
            BlockData::Quote(_) => BlockType::Quote,
            BlockData::Video(_) => BlockType::Video,
            BlockData::Divider(_) => BlockType::Divider,
        }
    }

    /// Build a payload from its `type` name and untyped `data` object.
    ///
    /// A missing (`null`) `data` is treated as an empty object so that every
    /// payload field falls back to its default.
    pub fn from_parts(kind: &str, data: Value) -> Result<Self, CoreError> {
        let data = match data {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        serde_json::from_value(serde_json::json!({ "type": kind, "data": data })).map_err(|e| {
            CoreError::Validation(format!("Invalid data for block type '{kind}': {e}"))
        })
    }

    /// The untyped `data` object of this payload.
    pub fn to_value(&self) -> Value {
        let encoded = match self {
            BlockData::Hero(p) => serde_json::to_value(p),
            BlockData::Text(p) => serde_json::to_value(p),
            BlockData::Image(p) => serde_json::to_value(p),
            BlockData::Accordion(p) => serde_json::to_value(p),
            BlockData::Gallery(p) => serde_json::to_value(p),
            BlockData::Cta(p) => serde_json::to_value(p),
            BlockData::Stats(p) => serde_json::to_value(p),
            BlockData::Quote(p) => serde_json::to_value(p),
            BlockData::Video(p) => serde_json::to_value(p),
            BlockData::Divider(p) => serde_json::to_value(p),
        };
        // Payloads are plain structs with string keys; encoding cannot fail.
        encoded.unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A content block with a stable identity.
///
/// `id` survives edits and reorders and is never reused for a different
/// logical block inside the same document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct Block {
    pub id: String,
    pub data: BlockData,
}

impl Block {
    /// Create a block with a freshly generated id.
    pub fn new(data: BlockData) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            data,
        }
    }

    /// Create a block with a caller-chosen id.
    pub fn with_id(id: impl Into<String>, data: BlockData) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.data.block_type()
    }
}

/// Wire representation of a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawBlock {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl TryFrom<RawBlock> for Block {
    type Error = String;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let data = BlockData::from_parts(&raw.kind, raw.data).map_err(|e| e.to_string())?;
        Ok(Block { id: raw.id, data })
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        RawBlock {
            kind: block.block_type().as_str().to_string(),
            data: block.data.to_value(),
            id: block.id,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation & derived fields
// ---------------------------------------------------------------------------

/// Validate a block list: every id must be non-empty and unique.
pub fn validate_blocks(blocks: &[Block]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(blocks.len());
    for (index, block) in blocks.iter().enumerate() {
        if block.id.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Block at index {index} has an empty id"
            )));
        }
        if !seen.insert(block.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate block id '{}'",
                block.id
            )));
        }
    }
    Ok(())
}

/// Count the words across all text blocks.
pub fn text_word_count(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .filter_map(|b| match &b.data {
            BlockData::Text(text) => Some(text.content.split_whitespace().count()),
            _ => None,
        })
        .sum()
}

/// Estimated reading time in whole minutes, rounded up.
///
/// Returns 0 for documents without any text.
pub fn reading_time_minutes(blocks: &[Block]) -> u32 {
    let words = text_word_count(blocks);
    if words == 0 {
        return 0;
    }
    words.div_ceil(WORDS_PER_MINUTE) as u32
}
