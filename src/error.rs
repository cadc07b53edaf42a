//! Top-level error type of the tagging workflow.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::model::{ImageId, LabelId, ProjectId, UserId};
use crate::services::ServiceError;

/// Errors surfaced by event handling and initialization.
#[derive(Error, Debug)]
pub enum AppError {
    /// External service failure, passed through unchanged
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Reference input or catalog build failure
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Malformed annotation or schema document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Selected label missing even after refreshing the annotation
    #[error("Label {label_id} not found in annotation of image {image_id}")]
    LabelNotFound {
        /// The missing label
        label_id: LabelId,
        /// The image searched
        image_id: ImageId,
    },

    /// Label has no geometry to derive a bounding box from
    #[error("Label {label_id} has no usable geometry")]
    MissingGeometry {
        /// The label without points
        label_id: LabelId,
    },

    /// Tag name not defined (or not yet stored) in the project schema
    #[error("Tag '{name}' is not defined in project {project_id}")]
    UnknownTag {
        /// Requested tag name
        name: String,
        /// Project searched
        project_id: ProjectId,
    },

    /// Schema still lacks a required tag after pushing the extension
    #[error("Project {project_id} still lacks tag '{name}' after schema update")]
    SchemaNotExtended {
        /// Tag that did not appear
        name: String,
        /// Project updated
        project_id: ProjectId,
    },

    /// Event name not handled by this application
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Session state lacks the user's selection
    #[error("No {field} selected for user {user_id}")]
    MissingSelection {
        /// User whose selection is missing
        user_id: UserId,
        /// Session-state field consulted
        field: &'static str,
    },

    /// Selected worklist index beyond the user's worklist
    #[error("Worklist index {index} out of range for user {user_id}")]
    WorklistIndexOutOfRange {
        /// User whose worklist was consulted
        user_id: UserId,
        /// Requested index
        index: usize,
    },
}
