//! In-memory fakes of the external services for unit tests.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use crate::model::{
    ImageId, LabelId, ProjectId, TagId, TagInstance, TagMetaId, TaskId, TeamId, UserId,
};
use crate::services::{
    AnnotationService, Api, FileService, MembershipService, ProjectMetaService, ServiceError,
    TaggingService, TeamMember, UiBridge,
};

/// Schema tag id of "UPC CODE" in [`FakeProjects::with_required_tags`].
pub const UPC_TAG_ID: TagMetaId = 100;
/// Schema tag id of "error" in [`FakeProjects::with_required_tags`].
pub const ERROR_TAG_ID: TagMetaId = 101;

/// Rectangle label document.
pub fn rect(id: LabelId, class: &str, left: f64, top: f64, right: f64, bottom: f64) -> Value {
    json!({
        "id": id,
        "classTitle": class,
        "geometryType": "rectangle",
        "points": {"exterior": [[left, top], [right, bottom]], "interior": []}
    })
}

/// Bitmap label document with a `width` x `height` mask at `(x, y)`.
pub fn bitmap(id: LabelId, class: &str, x: f64, y: f64, width: u32, height: u32) -> Value {
    use base64::Engine;

    let mut png = Vec::new();
    image::GrayImage::from_pixel(width, height, image::Luma([255]))
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let mut encoder =
        flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&png).unwrap();
    let data = base64::engine::general_purpose::STANDARD.encode(encoder.finish().unwrap());

    json!({
        "id": id,
        "classTitle": class,
        "geometryType": "bitmap",
        "bitmap": {"origin": [x, y], "data": data}
    })
}

/// Annotation document from label documents.
pub fn annotation_json(objects: &[Value]) -> Value {
    json!({"description": "", "tags": [], "objects": objects})
}

/// Schema document from `(id, name, value_type)` triples.
pub fn meta_json(tags: &[(TagMetaId, &str, &str)]) -> Value {
    let tags: Vec<Value> = tags
        .iter()
        .map(|(id, name, value_type)| json!({"id": id, "name": name, "value_type": value_type}))
        .collect();
    json!({"classes": [], "tags": tags})
}

// ============================================================================
// Annotation service
// ============================================================================

#[derive(Default)]
pub struct FakeAnnotations {
    documents: Mutex<HashMap<ImageId, Value>>,
    downloads: Mutex<HashMap<ImageId, usize>>,
}

impl FakeAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, image_id: ImageId, document: Value) {
        self.documents.lock().unwrap().insert(image_id, document);
    }

    pub fn download_count(&self, image_id: ImageId) -> usize {
        self.downloads.lock().unwrap().get(&image_id).copied().unwrap_or(0)
    }
}

impl AnnotationService for FakeAnnotations {
    fn download(&self, image_id: ImageId) -> Result<Value, ServiceError> {
        *self.downloads.lock().unwrap().entry(image_id).or_default() += 1;
        self.documents
            .lock()
            .unwrap()
            .get(&image_id)
            .cloned()
            .ok_or_else(|| ServiceError::new("annotation", format!("image {image_id} not found")))
    }
}

// ============================================================================
// Project service
// ============================================================================

/// Stores schemas; an update assigns ids to new tag definitions, like the
/// real service does, unless built with [`FakeProjects::dropping_updates`].
#[derive(Default)]
pub struct FakeProjects {
    metas: Mutex<HashMap<ProjectId, Value>>,
    gets: Mutex<usize>,
    updates: Mutex<usize>,
    drop_updates: bool,
}

impl FakeProjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service holding a complete schema for one project.
    pub fn with_required_tags(project_id: ProjectId) -> Self {
        let projects = Self::new();
        projects.insert(
            project_id,
            meta_json(&[(UPC_TAG_ID, "UPC CODE", "any_string"), (ERROR_TAG_ID, "error", "none")]),
        );
        projects
    }

    /// Accept updates without storing them.
    pub fn dropping_updates(mut self) -> Self {
        self.drop_updates = true;
        self
    }

    pub fn insert(&self, project_id: ProjectId, meta: Value) {
        self.metas.lock().unwrap().insert(project_id, meta);
    }

    pub fn stored(&self, project_id: ProjectId) -> Value {
        self.metas.lock().unwrap()[&project_id].clone()
    }

    pub fn get_count(&self) -> usize {
        *self.gets.lock().unwrap()
    }

    pub fn update_count(&self) -> usize {
        *self.updates.lock().unwrap()
    }
}

impl ProjectMetaService for FakeProjects {
    fn get_meta(&self, project_id: ProjectId) -> Result<Value, ServiceError> {
        *self.gets.lock().unwrap() += 1;
        self.metas
            .lock()
            .unwrap()
            .get(&project_id)
            .cloned()
            .ok_or_else(|| ServiceError::new("project", format!("project {project_id} not found")))
    }

    fn update_meta(&self, project_id: ProjectId, meta: &Value) -> Result<(), ServiceError> {
        *self.updates.lock().unwrap() += 1;
        if self.drop_updates {
            return Ok(());
        }
        let mut meta = meta.clone();
        if let Some(tags) = meta["tags"].as_array_mut() {
            let mut next_id = 500;
            for tag in tags.iter_mut().filter(|t| t.get("id").is_none()) {
                tag["id"] = json!(next_id);
                next_id += 1;
            }
        }
        self.insert(project_id, meta);
        Ok(())
    }
}

// ============================================================================
// Tagging service
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum TagCall {
    Add(TagMetaId, LabelId, Option<String>),
    Remove(TagMetaId, LabelId, TagId),
}

#[derive(Default)]
pub struct FakeTagging {
    tags: Mutex<HashMap<LabelId, Vec<TagInstance>>>,
    calls: Mutex<Vec<TagCall>>,
    next_id: Mutex<TagId>,
}

impl FakeTagging {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(1000),
            ..Self::default()
        }
    }

    /// Attach a tag without recording a call.
    pub fn seed(&self, label_id: LabelId, tag: TagInstance) {
        self.tags.lock().unwrap().entry(label_id).or_default().push(tag);
    }

    pub fn tags_of(&self, label_id: LabelId) -> Vec<TagInstance> {
        self.tags.lock().unwrap().get(&label_id).cloned().unwrap_or_default()
    }

    /// Values of one schema tag on a label.
    pub fn values_of(&self, label_id: LabelId, tag_meta_id: TagMetaId) -> Vec<Option<String>> {
        self.tags_of(label_id)
            .iter()
            .filter(|t| t.tag_meta_id == tag_meta_id)
            .map(TagInstance::value_text)
            .collect()
    }

    pub fn calls(&self) -> Vec<TagCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Labels that received an add call, in call order.
    pub fn added_labels(&self) -> Vec<LabelId> {
        self.calls()
            .iter()
            .filter_map(|call| match call {
                TagCall::Add(_, label, _) => Some(*label),
                TagCall::Remove(..) => None,
            })
            .collect()
    }
}

impl TaggingService for FakeTagging {
    fn add_tag(
        &self,
        tag_meta_id: TagMetaId,
        label_id: LabelId,
        value: Option<&str>,
    ) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push(TagCall::Add(
            tag_meta_id,
            label_id,
            value.map(str::to_string),
        ));
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        self.seed(label_id, TagInstance::new(*next_id, tag_meta_id, value));
        Ok(())
    }

    fn remove_tag(
        &self,
        tag_meta_id: TagMetaId,
        label_id: LabelId,
        tag_id: TagId,
    ) -> Result<(), ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push(TagCall::Remove(tag_meta_id, label_id, tag_id));
        let mut tags = self.tags.lock().unwrap();
        let list = tags.entry(label_id).or_default();
        let before = list.len();
        list.retain(|t| t.id != tag_id);
        if list.len() == before {
            return Err(ServiceError::new("tagging", format!("tag {tag_id} not on {label_id}")));
        }
        Ok(())
    }

    fn object_tags(&self, label_id: LabelId) -> Result<Vec<TagInstance>, ServiceError> {
        Ok(self.tags_of(label_id))
    }
}

// ============================================================================
// Membership, files, UI
// ============================================================================

#[derive(Default)]
pub struct FakeMembers {
    pub members: Vec<TeamMember>,
    pub team_name: String,
}

impl FakeMembers {
    pub fn new(team_name: &str, members: &[(UserId, &str)]) -> Self {
        Self {
            team_name: team_name.to_string(),
            members: members
                .iter()
                .map(|(id, login)| TeamMember {
                    id: *id,
                    login: login.to_string(),
                })
                .collect(),
        }
    }
}

impl MembershipService for FakeMembers {
    fn resolve_user(&self, _team_id: TeamId, login: &str) -> Result<Option<UserId>, ServiceError> {
        Ok(self.members.iter().find(|m| m.login == login).map(|m| m.id))
    }

    fn list_team_members(&self, _team_id: TeamId) -> Result<Vec<TeamMember>, ServiceError> {
        Ok(self.members.clone())
    }

    fn team_name(&self, _team_id: TeamId) -> Result<String, ServiceError> {
        Ok(self.team_name.clone())
    }
}

/// File service without any files.
pub struct NoFiles;

impl FileService for NoFiles {
    fn exists(&self, _team_id: TeamId, _remote_path: &str) -> Result<bool, ServiceError> {
        Ok(false)
    }

    fn download(&self, _team_id: TeamId, remote_path: &str, _local: &Path) -> Result<(), ServiceError> {
        Err(ServiceError::new("file", format!("{remote_path} not found")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiCall {
    SetField(TaskId, String, Value),
    SetFigure(String, LabelId),
    Zoom(String, LabelId, f64),
}

#[derive(Default)]
pub struct FakeUi {
    calls: Mutex<Vec<UiCall>>,
}

impl FakeUi {
    pub fn calls(&self) -> Vec<UiCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Last value set for a field path.
    pub fn field(&self, path: &str) -> Option<Value> {
        self.calls().into_iter().rev().find_map(|call| match call {
            UiCall::SetField(_, p, value) if p == path => Some(value),
            _ => None,
        })
    }

    /// Label made active most recently.
    pub fn active_figure(&self) -> Option<LabelId> {
        self.calls().into_iter().rev().find_map(|call| match call {
            UiCall::SetFigure(_, label) => Some(label),
            _ => None,
        })
    }
}

impl UiBridge for FakeUi {
    fn set_field(&self, task_id: TaskId, field_path: &str, value: Value) -> Result<(), ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push(UiCall::SetField(task_id, field_path.to_string(), value));
        Ok(())
    }

    fn set_active_figure(&self, session_id: &str, label_id: LabelId) -> Result<(), ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push(UiCall::SetFigure(session_id.to_string(), label_id));
        Ok(())
    }

    fn zoom_to_figure(&self, session_id: &str, label_id: LabelId, scale: f64) -> Result<(), ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push(UiCall::Zoom(session_id.to_string(), label_id, scale));
        Ok(())
    }
}

// ============================================================================
// Bundle
// ============================================================================

/// All fakes plus an [`Api`] pointing at them.
pub struct Fakes {
    pub annotations: Arc<FakeAnnotations>,
    pub projects: Arc<FakeProjects>,
    pub tagging: Arc<FakeTagging>,
    pub members: Arc<FakeMembers>,
    pub ui: Arc<FakeUi>,
}

impl Fakes {
    /// Fakes with a complete schema for `project_id`.
    pub fn new(project_id: ProjectId, members: FakeMembers) -> Self {
        Self {
            annotations: Arc::new(FakeAnnotations::new()),
            projects: Arc::new(FakeProjects::with_required_tags(project_id)),
            tagging: Arc::new(FakeTagging::new()),
            members: Arc::new(members),
            ui: Arc::new(FakeUi::default()),
        }
    }

    pub fn api(&self) -> Api {
        Api {
            annotations: self.annotations.clone(),
            projects: self.projects.clone(),
            tagging: self.tagging.clone(),
            members: self.members.clone(),
            files: Arc::new(NoFiles),
            ui: self.ui.clone(),
        }
    }
}
