//! Project tag schema ("project meta").
//!
//! Only the tag definitions are modelled; object classes and any other
//! schema sections are carried through untouched so that pushing an
//! extended schema back to the project service never drops them.

use serde::{Deserialize, Serialize};

use super::TagMetaId;

/// Value type of a tag definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagValueType {
    /// Marker tag without a value
    None,
    /// Free-form string value
    AnyString,
    /// Numeric value
    AnyNumber,
    /// One value out of a fixed list
    #[serde(rename = "oneof_string")]
    OneOf,
}

impl TagValueType {
    /// Whether tags of this type carry a value.
    pub fn has_value(&self) -> bool {
        !matches!(self, TagValueType::None)
    }
}

/// A named tag definition in a project schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagMeta {
    /// Server-assigned identifier; absent until the schema has been stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TagMetaId>,
    /// Tag name, unique within the project
    pub name: String,
    /// Value type
    pub value_type: TagValueType,
    /// Allowed values for `oneof_string` tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    /// Remaining fields (color, hotkey, ...) kept verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TagMeta {
    /// Create a tag definition that has not been stored yet.
    pub fn new(name: &str, value_type: TagValueType) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            value_type,
            values: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Set the server-assigned identifier.
    pub fn with_id(mut self, id: TagMetaId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Tag schema of one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMeta {
    /// Tag definitions
    #[serde(default)]
    pub tags: Vec<TagMeta>,
    /// Object classes and other schema sections, kept verbatim
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl ProjectMeta {
    /// Parse a schema document from the project service.
    pub fn from_json(json: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json)
    }

    /// Serialize back to the project service's document shape.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Look up a tag definition by name.
    pub fn tag_meta(&self, name: &str) -> Option<&TagMeta> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    /// Add a tag definition unless one with the same name exists.
    ///
    /// Returns true if the schema changed.
    pub fn add_tag_meta(&mut self, tag: TagMeta) -> bool {
        if self.tag_meta(&tag.name).is_some() {
            return false;
        }
        self.tags.push(tag);
        true
    }
}
