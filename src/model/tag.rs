//! Tag instances attached to labels.
//!
//! A tag instance pairs a schema tag definition with an optional value.
//! Marker tags such as "error" carry no value.

use serde::{Deserialize, Serialize};

use super::{TagId, TagMetaId};

/// A tag attached to one label, as reported by the tagging service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagInstance {
    /// Unique identifier of this tag instance
    pub id: TagId,
    /// Schema tag definition this instance belongs to
    #[serde(rename = "tagId")]
    pub tag_meta_id: TagMetaId,
    /// Tag value; absent for marker tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl TagInstance {
    /// Create a new tag instance.
    pub fn new(id: TagId, tag_meta_id: TagMetaId, value: Option<&str>) -> Self {
        Self {
            id,
            tag_meta_id,
            value: value.map(|v| serde_json::Value::String(v.to_string())),
        }
    }

    /// Value rendered as text, if any.
    pub fn value_text(&self) -> Option<String> {
        match self.value.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
