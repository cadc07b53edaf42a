//! Interfaces of the external collaborators.
//!
//! The annotation platform owns storage, transport and the UI. Each of its
//! services is a trait here so the tagging logic can run against the real
//! platform client, the local adapters in [`crate::local`] or test fakes.
//! All calls block the calling thread; timeouts and retries belong to the
//! implementations.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ImageId, LabelId, ProjectId, TagId, TagInstance, TagMetaId, TaskId, TeamId, UserId};

/// Failure reported by an external service. Passed through unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{service} service error: {message}")]
pub struct ServiceError {
    /// Which collaborator failed
    pub service: &'static str,
    /// Error text as reported by the collaborator
    pub message: String,
}

impl ServiceError {
    /// Create a service error.
    pub fn new(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            message: message.into(),
        }
    }
}

/// Downloads image annotations.
pub trait AnnotationService: Send + Sync {
    /// Fetch the current annotation document of an image.
    fn download(&self, image_id: ImageId) -> Result<serde_json::Value, ServiceError>;
}

/// Reads and writes project tag schemas.
pub trait ProjectMetaService: Send + Sync {
    /// Fetch the schema document of a project.
    fn get_meta(&self, project_id: ProjectId) -> Result<serde_json::Value, ServiceError>;

    /// Replace the schema document of a project. Does not return the
    /// identifiers assigned to new definitions.
    fn update_meta(
        &self,
        project_id: ProjectId,
        meta: &serde_json::Value,
    ) -> Result<(), ServiceError>;
}

/// Attaches and detaches tags on labels.
pub trait TaggingService: Send + Sync {
    /// Attach a tag to a label. Marker tags pass no value.
    fn add_tag(
        &self,
        tag_meta_id: TagMetaId,
        label_id: LabelId,
        value: Option<&str>,
    ) -> Result<(), ServiceError>;

    /// Detach one tag instance from a label.
    fn remove_tag(
        &self,
        tag_meta_id: TagMetaId,
        label_id: LabelId,
        tag_id: TagId,
    ) -> Result<(), ServiceError>;

    /// List the tag instances currently attached to a label.
    fn object_tags(&self, label_id: LabelId) -> Result<Vec<TagInstance>, ServiceError>;
}

/// A member of a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Stable user id
    pub id: UserId,
    /// Login name
    pub login: String,
}

/// Resolves team membership.
pub trait MembershipService: Send + Sync {
    /// Resolve a login to a user id, None if the login is not a team member.
    fn resolve_user(&self, team_id: TeamId, login: &str) -> Result<Option<UserId>, ServiceError>;

    /// List all members of a team.
    fn list_team_members(&self, team_id: TeamId) -> Result<Vec<TeamMember>, ServiceError>;

    /// Display name of a team, used in error reports.
    fn team_name(&self, team_id: TeamId) -> Result<String, ServiceError>;
}

/// Team file storage.
pub trait FileService: Send + Sync {
    /// Check whether a remote file exists.
    fn exists(&self, team_id: TeamId, remote_path: &str) -> Result<bool, ServiceError>;

    /// Download a remote file to a local path.
    fn download(
        &self,
        team_id: TeamId,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<(), ServiceError>;
}

/// Bridge to the annotation tool UI.
pub trait UiBridge: Send + Sync {
    /// Set a field of the application's data/state tree (e.g. `state.dialogVisible`).
    fn set_field(
        &self,
        task_id: TaskId,
        field_path: &str,
        value: serde_json::Value,
    ) -> Result<(), ServiceError>;

    /// Make a label the active figure of an annotation session.
    fn set_active_figure(&self, session_id: &str, label_id: LabelId) -> Result<(), ServiceError>;

    /// Zoom an annotation session onto a label.
    fn zoom_to_figure(
        &self,
        session_id: &str,
        label_id: LabelId,
        scale: f64,
    ) -> Result<(), ServiceError>;
}

/// Handles to every external collaborator.
#[derive(Clone)]
pub struct Api {
    /// Annotation downloads
    pub annotations: Arc<dyn AnnotationService>,
    /// Project schemas
    pub projects: Arc<dyn ProjectMetaService>,
    /// Tag mutations
    pub tagging: Arc<dyn TaggingService>,
    /// Team membership
    pub members: Arc<dyn MembershipService>,
    /// Team files
    pub files: Arc<dyn FileService>,
    /// UI bridge
    pub ui: Arc<dyn UiBridge>,
}
