//! Content documents (pages and posts), their editable draft, and validation.

use chrono::SubsecRound;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::{reading_time_minutes, validate_blocks, Block};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};
use crate::workflow::DocumentStatus;

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum slug length in characters.
pub const MAX_SLUG_LENGTH: usize = 200;

/// Key under which the derived reading time is stored in `meta`.
pub const META_READING_TIME: &str = "readingTimeMinutes";

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

pub const KIND_PAGE: &str = "page";
pub const KIND_POST: &str = "post";

/// Slugs are unique per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Page,
    Post,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Page => KIND_PAGE,
            DocumentKind::Post => KIND_POST,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            KIND_PAGE => Ok(DocumentKind::Page),
            KIND_POST => Ok(DocumentKind::Post),
            other => Err(CoreError::Validation(format!(
                "Invalid document kind '{other}'. Must be one of: {KIND_PAGE}, {KIND_POST}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ContentDocument
// ---------------------------------------------------------------------------

/// The persisted authored entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub id: DbId,
    pub kind: DocumentKind,
    pub slug: String,
    pub title: String,
    pub blocks: Vec<Block>,
    pub meta: Value,
    pub status: DocumentStatus,
    /// Only meaningful while `status` is `reviewing`.
    pub scheduled_at: Option<Timestamp>,
    pub published_at: Option<Timestamp>,
    pub author_id: Option<DbId>,
    pub reviewer_id: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub review_feedback: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub created_by: Option<DbId>,
    pub updated_by: Option<DbId>,
}

impl ContentDocument {
    /// Materialize a freshly created draft document.
    pub fn from_new(id: DbId, input: NewDocument, slug: String, now: Timestamp) -> Self {
        let now = now.trunc_subsecs(6);
        let meta = with_derived_fields(input.meta, &input.blocks);
        Self {
            id,
            kind: input.kind,
            slug,
            title: input.title,
            blocks: input.blocks,
            meta,
            status: DocumentStatus::Draft,
            scheduled_at: None,
            published_at: None,
            author_id: input.author_id,
            reviewer_id: None,
            reviewed_at: None,
            review_feedback: None,
            created_at: now,
            updated_at: now,
            created_by: input.author_id,
            updated_by: input.author_id,
        }
    }

    /// Copy out the editable fields. The draft never aliases this document.
    pub fn draft(&self) -> DocumentDraft {
        DocumentDraft {
            slug: self.slug.clone(),
            title: self.title.clone(),
            blocks: self.blocks.clone(),
            meta: self.meta.clone(),
        }
    }

    /// Produce the next committed state with `draft` applied.
    pub fn with_draft(&self, draft: DocumentDraft, actor: Option<DbId>, now: Timestamp) -> Self {
        let mut next = self.clone();
        next.meta = with_derived_fields(draft.meta, &draft.blocks);
        next.slug = draft.slug;
        next.title = draft.title;
        next.blocks = draft.blocks;
        next.updated_at = advance_timestamp(self.updated_at, now);
        next.updated_by = actor.or(self.updated_by);
        next
    }
}

/// Input for creating a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub kind: DocumentKind,
    pub title: String,
    /// Generated from the title when absent.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default = "empty_meta")]
    pub meta: Value,
    #[serde(default)]
    pub author_id: Option<DbId>,
}

impl NewDocument {
    pub fn new(kind: DocumentKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            slug: None,
            blocks: Vec::new(),
            meta: empty_meta(),
            author_id: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_author(mut self, author_id: DbId) -> Self {
        self.author_id = Some(author_id);
        self
    }

    /// Resolve the slug (generating one if needed) and validate everything.
    pub fn resolve_slug(&self) -> Result<String, CoreError> {
        validate_title(&self.title)?;
        let slug = match &self.slug {
            Some(s) => s.clone(),
            None => generate_slug(&self.title),
        };
        validate_slug(&slug)?;
        validate_blocks(&self.blocks)?;
        Ok(slug)
    }
}

fn empty_meta() -> Value {
    Value::Object(Default::default())
}

// ---------------------------------------------------------------------------
// Draft & field updates
// ---------------------------------------------------------------------------

/// The editable portion of a document, as held by an edit session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub slug: String,
    pub title: String,
    pub blocks: Vec<Block>,
    pub meta: Value,
}

/// One top-level field replacement.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftField {
    Slug(String),
    Title(String),
    Blocks(Vec<Block>),
    Meta(Value),
}

/// A partial update of several top-level fields. Absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftPatch {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub blocks: Option<Vec<Block>>,
    #[serde(default)]
    pub meta: Option<Value>,
}

impl DraftPatch {
    pub fn is_empty(&self) -> bool {
        self.slug.is_none() && self.title.is_none() && self.blocks.is_none() && self.meta.is_none()
    }
}

impl From<DocumentDraft> for DraftPatch {
    fn from(draft: DocumentDraft) -> Self {
        Self {
            slug: Some(draft.slug),
            title: Some(draft.title),
            blocks: Some(draft.blocks),
            meta: Some(draft.meta),
        }
    }
}

impl DocumentDraft {
    /// Replace a single field.
    pub fn update_field(&self, field: DraftField) -> DocumentDraft {
        let mut next = self.clone();
        match field {
            DraftField::Slug(v) => next.slug = v,
            DraftField::Title(v) => next.title = v,
            DraftField::Blocks(v) => next.blocks = v,
            DraftField::Meta(v) => next.meta = v,
        }
        next
    }

    /// Replace every field present in `patch`.
    pub fn update_fields(&self, patch: DraftPatch) -> DocumentDraft {
        let mut next = self.clone();
        if let Some(v) = patch.slug {
            next.slug = v;
        }
        if let Some(v) = patch.title {
            next.title = v;
        }
        if let Some(v) = patch.blocks {
            next.blocks = v;
        }
        if let Some(v) = patch.meta {
            next.meta = v;
        }
        next
    }

    /// Validate the draft before it is committed.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_title(&self.title)?;
        validate_slug(&self.slug)?;
        validate_blocks(&self.blocks)
    }
}

// ---------------------------------------------------------------------------
// Slugs & validation
// ---------------------------------------------------------------------------

/// Generate a URL-safe slug from a title.
///
/// Lowercases, maps every non-alphanumeric run to a single hyphen, and trims
/// leading and trailing hyphens.
pub fn generate_slug(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut prev_hyphen = true;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }
    result.trim_end_matches('-').to_string()
}

/// Validate a document title (non-empty, at most 200 chars).
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a slug (non-empty, lowercase alphanumerics and hyphens only).
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.is_empty() {
        return Err(CoreError::Validation("Slug must not be empty".into()));
    }
    if slug.len() > MAX_SLUG_LENGTH {
        return Err(CoreError::Validation(format!(
            "Slug must be at most {MAX_SLUG_LENGTH} characters"
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CoreError::Validation(
            "Slug must contain only lowercase alphanumeric characters and hyphens".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Derived fields & timestamps
// ---------------------------------------------------------------------------

/// Refresh derived fields inside an object `meta`. Non-object meta is kept as is.
pub fn with_derived_fields(mut meta: Value, blocks: &[Block]) -> Value {
    if let Value::Object(map) = &mut meta {
        map.insert(
            META_READING_TIME.to_string(),
            Value::from(reading_time_minutes(blocks)),
        );
    }
    meta
}

/// Next `updated_at` value: `now` at microsecond precision, but always
/// strictly after `previous`.
pub fn advance_timestamp(previous: Timestamp, now: Timestamp) -> Timestamp {
    let now = now.trunc_subsecs(6);
    let floor = previous + chrono::Duration::microseconds(1);
    if now >= floor {
        now
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockData, TextBlock};
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn generate_slug_from_title() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
        assert_eq!(generate_slug("  Spring -- Sale! 2026 "), "spring-sale-2026");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn slug_validation() {
        assert!(validate_slug("about-us").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("About").is_err());
        assert!(validate_slug("a b").is_err());
    }

    #[test]
    fn title_validation() {
        assert!(validate_title("Home").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(201)).is_err());
    }

    #[test]
    fn resolve_slug_generates_from_title() {
        let input = NewDocument::new(DocumentKind::Post, "Launch Notes");
        assert_eq!(input.resolve_slug().unwrap(), "launch-notes");

        let untitled = NewDocument::new(DocumentKind::Post, "");
        assert!(untitled.resolve_slug().is_err());
    }

    #[test]
    fn update_fields_keeps_absent_fields() {
        let draft = DocumentDraft {
            slug: "home".into(),
            title: "Home".into(),
            blocks: vec![],
            meta: json!({"seo": {"title": "Home"}}),
        };
        let next = draft.update_fields(DraftPatch {
            title: Some("Welcome".into()),
            ..Default::default()
        });
        assert_eq!(next.title, "Welcome");
        assert_eq!(next.slug, "home");
        assert_eq!(next.meta, draft.meta);

        let renamed = draft.update_field(DraftField::Slug("start".into()));
        assert_eq!(renamed.slug, "start");
        assert_eq!(draft.slug, "home");
    }

    #[test]
    fn reading_time_is_materialized_into_object_meta() {
        let blocks = vec![Block::with_id(
            "b1",
            BlockData::Text(TextBlock {
                content: "a few words".into(),
                alignment: None,
            }),
        )];
        let meta = with_derived_fields(json!({"seo": {}}), &blocks);
        assert_eq!(meta[META_READING_TIME], 1);
        assert_eq!(with_derived_fields(Value::Null, &blocks), Value::Null);
    }

    #[test]
    fn advance_timestamp_is_strictly_increasing() {
        let now = Utc::now();
        let prev = now + chrono::Duration::seconds(10);
        assert!(advance_timestamp(prev, now) > prev);
        let earlier = now - chrono::Duration::seconds(10);
        assert_eq!(advance_timestamp(earlier, now), now.trunc_subsecs(6));
        assert!(advance_timestamp(now, now) > now);
    }

    #[test]
    fn with_draft_advances_updated_at() {
        let doc = ContentDocument::from_new(
            7,
            NewDocument::new(DocumentKind::Page, "Home"),
            "home".into(),
            Utc::now(),
        );
        let mut draft = doc.draft();
        draft.title = "Home page".into();
        let next = doc.with_draft(draft.clone(), Some(2), doc.updated_at);
        assert!(next.updated_at > doc.updated_at);
        assert_eq!(next.title, "Home page");
        assert_eq!(next.updated_by, Some(2));
        assert_eq!(next.draft().blocks, draft.blocks);
    }
}
