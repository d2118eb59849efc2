//! Editor Document Model
//!
//! This module defines the structured document body edited in the rich-text
//! editor and the identifiers that tie a document to its owner entity.
//!
//! # Shape
//!
//! Documents are trees of typed nodes serialised in the editor's JSON shape:
//!
//! ```json
//! { "type": "doc", "content": [
//!     { "type": "paragraph", "content": [ { "type": "text", "text": "Hello" } ] }
//! ] }
//! ```
//!
//! Equality is structural over the whole tree (derived `PartialEq`). An absent
//! `content` array and an empty one are different values, matching the deep
//! equality the editor layer performs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Classification of a node's `type` string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    TaskList,
    TaskItem,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    HardBreak,
    Image,
    Youtube,
    Text,
    Other,
}

impl NodeKind {
    /// Parse the editor's camelCase type name
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "doc" => NodeKind::Doc,
            "paragraph" => NodeKind::Paragraph,
            "heading" => NodeKind::Heading,
            "bulletList" => NodeKind::BulletList,
            "orderedList" => NodeKind::OrderedList,
            "listItem" => NodeKind::ListItem,
            "taskList" => NodeKind::TaskList,
            "taskItem" => NodeKind::TaskItem,
            "blockquote" => NodeKind::Blockquote,
            "codeBlock" => NodeKind::CodeBlock,
            "horizontalRule" => NodeKind::HorizontalRule,
            "hardBreak" => NodeKind::HardBreak,
            "image" => NodeKind::Image,
            "youtube" => NodeKind::Youtube,
            "text" => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    /// Leaf nodes cannot hold children; each one counts as a single character
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::HorizontalRule | NodeKind::HardBreak | NodeKind::Image | NodeKind::Youtube
        )
    }

    /// Embedded media referenced by URL in `attrs.src`
    pub fn is_media(&self) -> bool {
        matches!(self, NodeKind::Image | NodeKind::Youtube)
    }
}

/// Inline formatting attached to a text node (bold, link, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
}

/// A node of the editor document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    /// Node type name (e.g. "doc", "paragraph", "text")
    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<DocumentNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<Mark>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DocumentNode {
    /// Create a bare node of the given type
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            attrs: None,
            content: None,
            marks: None,
            text: None,
        }
    }

    /// Root `doc` node with the given blocks
    pub fn doc(children: Vec<DocumentNode>) -> Self {
        Self::new("doc").with_content(children)
    }

    /// Paragraph; an empty child list produces a paragraph without `content`
    pub fn paragraph(children: Vec<DocumentNode>) -> Self {
        let node = Self::new("paragraph");
        if children.is_empty() {
            node
        } else {
            node.with_content(children)
        }
    }

    pub fn heading(level: u8, children: Vec<DocumentNode>) -> Self {
        let mut attrs = Map::new();
        attrs.insert("level".to_string(), Value::from(level));
        let node = Self::new("heading").with_attrs(attrs);
        if children.is_empty() {
            node
        } else {
            node.with_content(children)
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        let mut node = Self::new("text");
        node.text = Some(text.into());
        node
    }

    pub fn image(src: impl Into<String>) -> Self {
        Self::media("image", src)
    }

    pub fn youtube(src: impl Into<String>) -> Self {
        Self::media("youtube", src)
    }

    fn media(node_type: &str, src: impl Into<String>) -> Self {
        let mut attrs = Map::new();
        attrs.insert("src".to_string(), Value::String(src.into()));
        Self::new(node_type).with_attrs(attrs)
    }

    pub fn with_content(mut self, children: Vec<DocumentNode>) -> Self {
        self.content = Some(children);
        self
    }

    pub fn with_attrs(mut self, attrs: Map<String, Value>) -> Self {
        self.attrs = Some(attrs);
        self
    }

    pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
        self.marks = Some(marks);
        self
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::from_type_name(&self.node_type)
    }

    /// Child nodes (empty slice when `content` is absent)
    pub fn children(&self) -> &[DocumentNode] {
        self.content.as_deref().unwrap_or(&[])
    }

    /// Number of characters the editor's counter reports for this subtree
    ///
    /// Text contributes its Unicode scalar values, every leaf node (image,
    /// embed, hard break, rule) contributes one, and block boundaries add
    /// nothing.
    pub fn character_count(&self) -> usize {
        let kind = self.kind();
        if kind == NodeKind::Text {
            return self.text.as_deref().map_or(0, |t| t.chars().count());
        }
        if kind.is_leaf() {
            return 1;
        }
        self.children().iter().map(DocumentNode::character_count).sum()
    }

    /// URLs of embedded media (images, videos) in document order
    pub fn media_sources(&self) -> Vec<&str> {
        let mut sources = Vec::new();
        self.collect_media(&mut sources);
        sources
    }

    fn collect_media<'a>(&'a self, out: &mut Vec<&'a str>) {
        if self.kind().is_media() {
            if let Some(src) = self
                .attrs
                .as_ref()
                .and_then(|attrs| attrs.get("src"))
                .and_then(Value::as_str)
            {
                out.push(src);
            }
        }
        for child in self.children() {
            child.collect_media(out);
        }
    }
}

/// Reference values treated as "no content"
///
/// A document equal to either value is never persisted; the stored record is
/// removed instead.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDocuments {
    /// What the editor emits after all text is cleared
    pub empty: DocumentNode,
    /// Template shown when an editor is opened without stored content
    pub default_template: DocumentNode,
}

impl CanonicalDocuments {
    pub fn new(empty: DocumentNode, default_template: DocumentNode) -> Self {
        Self {
            empty,
            default_template,
        }
    }

    /// True when `doc` equals the canonical empty value or the default template
    pub fn is_blank(&self, doc: &DocumentNode) -> bool {
        *doc == self.empty || *doc == self.default_template
    }

    pub fn is_empty(&self, doc: &DocumentNode) -> bool {
        *doc == self.empty
    }
}

impl Default for CanonicalDocuments {
    fn default() -> Self {
        Self {
            empty: DocumentNode::doc(vec![DocumentNode::paragraph(vec![])]),
            default_template: DocumentNode::doc(vec![
                DocumentNode::heading(2, vec![DocumentNode::text("Introduction")]),
                DocumentNode::paragraph(vec![DocumentNode::text(
                    "Describe what your app does and who it is for.",
                )]),
            ]),
        }
    }
}

/// Identifies the parent entity (an app, a story) an editor belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentKey {
    pub owner_id: String,
    pub slug: String,
}

impl ContentKey {
    pub fn new(owner_id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            slug: slug.into(),
        }
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.slug)
    }
}

/// Document opened in an editor for one owner entity
#[derive(Debug, Clone, PartialEq)]
pub struct EditableContent {
    pub key: ContentKey,
    pub body: DocumentNode,
}

impl EditableContent {
    pub fn new(owner_id: impl Into<String>, slug: impl Into<String>, body: DocumentNode) -> Self {
        Self {
            key: ContentKey::new(owner_id, slug),
            body,
        }
    }

    /// Open an editor with stored content, or the default template when nothing is stored
    pub fn open(key: ContentKey, stored: Option<DocumentNode>, canon: &CanonicalDocuments) -> Self {
        Self {
            key,
            body: stored.unwrap_or_else(|| canon.default_template.clone()),
        }
    }

    pub fn char_count(&self) -> usize {
        self.body.character_count()
    }
}

/// Persisted form of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    /// Record identifier (UUID v4), stable across upserts
    pub id: String,
    pub owner_id: String,
    pub slug: String,
    pub body: DocumentNode,
    pub char_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    /// Build a fresh record for a first write
    pub fn new(owner_id: &str, slug: &str, body: DocumentNode) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            slug: slug.to_string(),
            char_count: body.character_count(),
            body,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the body of an existing record, keeping its identity
    pub fn upsert(
        existing: Option<ContentRecord>,
        owner_id: &str,
        slug: &str,
        body: DocumentNode,
    ) -> Self {
        match existing {
            Some(mut record) => {
                record.char_count = body.character_count();
                record.body = body;
                record.updated_at = Utc::now();
                record
            }
            None => Self::new(owner_id, slug, body),
        }
    }

    pub fn key(&self) -> ContentKey {
        ContentKey::new(self.owner_id.clone(), self.slug.clone())
    }
}
