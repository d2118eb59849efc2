//! Domain Events for Content Stores
//!
//! Stores emit these events after a write or delete completes, using a tokio
//! broadcast channel so any number of observers (UI bridges, tests) can follow
//! persistence without coupling to a store implementation.

use crate::models::ContentRecord;
use serde::{Deserialize, Serialize};

/// Change notification emitted by a content store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentEvent {
    /// A document was upserted
    #[serde(rename = "contentWritten")]
    ContentWritten(ContentRecord),

    /// A stored document was removed
    #[serde(rename = "contentDeleted", rename_all = "camelCase")]
    ContentDeleted { owner_id: String, slug: String },
}

impl ContentEvent {
    pub fn event_type(&self) -> &str {
        match self {
            ContentEvent::ContentWritten(_) => "content:written",
            ContentEvent::ContentDeleted { .. } => "content:deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentNode;

    /// Observers rely on the flat, internally tagged JSON shape
    #[test]
    fn test_content_event_serialization_contract() {
        let deleted = ContentEvent::ContentDeleted {
            owner_id: "app-1".to_string(),
            slug: "my-app".to_string(),
        };
        let parsed = serde_json::to_value(&deleted).unwrap();
        assert_eq!(parsed.get("type").unwrap(), "contentDeleted");
        assert_eq!(parsed.get("ownerId").unwrap(), "app-1");
        assert_eq!(parsed.get("slug").unwrap(), "my-app");

        let record = crate::models::ContentRecord::new(
            "app-1",
            "my-app",
            DocumentNode::doc(vec![DocumentNode::paragraph(vec![DocumentNode::text("Hi")])]),
        );
        let written = ContentEvent::ContentWritten(record);
        let parsed = serde_json::to_value(&written).unwrap();
        assert_eq!(parsed.get("type").unwrap(), "contentWritten");
        assert_eq!(parsed.get("charCount").unwrap(), 2);
        assert_eq!(written.event_type(), "content:written");
    }
}
