//! Project schema cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::model::{ProjectId, ProjectMeta, TagMeta, TagValueType};
use crate::services::ProjectMetaService;

/// Memoizes one tag schema per project and makes sure the tag definitions
/// the workflow writes exist before anything is assigned.
pub struct MetaCache {
    service: Arc<dyn ProjectMetaService>,
    required: Vec<TagMeta>,
    entries: Mutex<HashMap<ProjectId, Arc<ProjectMeta>>>,
}

impl MetaCache {
    /// Create a cache that guarantees the given tag definitions.
    pub fn new(service: Arc<dyn ProjectMetaService>, required: Vec<TagMeta>) -> Self {
        Self {
            service,
            required,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cache guaranteeing a string UPC tag and a marker error tag.
    pub fn for_tags(service: Arc<dyn ProjectMetaService>, upc_tag: &str, error_tag: &str) -> Self {
        Self::new(
            service,
            vec![
                TagMeta::new(upc_tag, TagValueType::AnyString),
                TagMeta::new(error_tag, TagValueType::None),
            ],
        )
    }

    /// Get the schema of a project, fetching it on a miss or when `force` is set.
    pub fn get(&self, project_id: ProjectId, force: bool) -> Result<Arc<ProjectMeta>, AppError> {
        let cached = if force {
            None
        } else {
            super::lock(&self.entries).get(&project_id).cloned()
        };
        if let Some(meta) = cached {
            return Ok(meta);
        }

        let meta = Arc::new(self.fetch(project_id)?);
        super::lock(&self.entries).insert(project_id, Arc::clone(&meta));
        Ok(meta)
    }

    /// Drop the cached schema of a project. Returns true if one was cached.
    pub fn invalidate(&self, project_id: ProjectId) -> bool {
        super::lock(&self.entries).remove(&project_id).is_some()
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        super::lock(&self.entries).len()
    }

    /// Check if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch a schema, extending it with missing required tags.
    ///
    /// The update call does not return the ids of new definitions, so the
    /// schema is fetched again after pushing the extension.
    fn fetch(&self, project_id: ProjectId) -> Result<ProjectMeta, AppError> {
        let mut meta = ProjectMeta::from_json(self.service.get_meta(project_id)?)?;

        let mut added = Vec::new();
        for tag in &self.required {
            match meta.tag_meta(&tag.name) {
                Some(existing) if existing.value_type != tag.value_type => {
                    log::warn!(
                        "Tag '{}' in project {} has value type {:?}, expected {:?}",
                        tag.name,
                        project_id,
                        existing.value_type,
                        tag.value_type
                    );
                }
                Some(_) => {}
                None => {
                    meta.add_tag_meta(tag.clone());
                    added.push(tag.name.as_str());
                }
            }
        }

        if added.is_empty() {
            log::debug!("Loaded schema of project {}", project_id);
            return Ok(meta);
        }

        log::info!("Adding tags {:?} to project {}", added, project_id);
        self.service.update_meta(project_id, &meta.to_json()?)?;

        let meta = ProjectMeta::from_json(self.service.get_meta(project_id)?)?;
        for tag in &self.required {
            if meta.tag_meta(&tag.name).and_then(|t| t.id).is_none() {
                return Err(AppError::SchemaNotExtended {
                    name: tag.name.clone(),
                    project_id,
                });
            }
        }
        Ok(meta)
    }
}
