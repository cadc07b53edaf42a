//! Data models for the UPC tagging workflow.

mod annotation;
mod meta;
mod tag;
mod upc;

pub use annotation::{Annotation, Bitmap, BitmapError, BoundingBox, Label, Points};
pub use meta::{ProjectMeta, TagMeta, TagValueType};
pub use tag::TagInstance;
pub use upc::Upc;

/// Identifier of an image in the annotation tool.
pub type ImageId = u64;

/// Identifier of a project (owner of the tag schema).
pub type ProjectId = u64;

/// Identifier of a label, called a "figure" by the annotation tool.
pub type LabelId = u64;

/// Identifier of a tag definition in a project schema.
pub type TagMetaId = u64;

/// Identifier of one tag instance attached to a label.
pub type TagId = u64;

/// Identifier of a team member.
pub type UserId = u64;

/// Identifier of a team.
pub type TeamId = u64;

/// Identifier of the running application task.
pub type TaskId = u64;
