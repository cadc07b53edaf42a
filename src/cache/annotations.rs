//! Image annotation cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::MetaCache;
use crate::error::AppError;
use crate::model::{Annotation, ImageId, LabelId, ProjectId};
use crate::services::AnnotationService;

/// Memoizes one annotation per image.
///
/// An entry is stale when an event references a label the cached annotation
/// does not know (the user drew a new figure since the last fetch); such a
/// request refetches the annotation together with its project schema.
pub struct AnnotationCache {
    service: Arc<dyn AnnotationService>,
    metas: Arc<MetaCache>,
    entries: Mutex<HashMap<ImageId, Arc<Annotation>>>,
}

impl AnnotationCache {
    /// Create an empty cache.
    pub fn new(service: Arc<dyn AnnotationService>, metas: Arc<MetaCache>) -> Self {
        Self {
            service,
            metas,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get the annotation of an image.
    ///
    /// With `figure_id`, the returned annotation is guaranteed to be at least
    /// as new as the figure: a cached entry lacking it is refreshed.
    pub fn get(
        &self,
        image_id: ImageId,
        project_id: ProjectId,
        figure_id: Option<LabelId>,
    ) -> Result<Arc<Annotation>, AppError> {
        let cached = super::lock(&self.entries).get(&image_id).cloned();
        let annotation = match cached {
            Some(annotation) => annotation,
            None => self.refresh(image_id, project_id, false)?,
        };

        match figure_id {
            Some(figure_id) if !annotation.contains_label(figure_id) => {
                log::debug!(
                    "Figure {} unknown to cached annotation of image {}, refreshing",
                    figure_id,
                    image_id
                );
                self.refresh(image_id, project_id, true)
            }
            _ => Ok(annotation),
        }
    }

    /// Drop the cached annotation of an image. Returns true if one was cached.
    pub fn invalidate(&self, image_id: ImageId) -> bool {
        super::lock(&self.entries).remove(&image_id).is_some()
    }

    /// Number of cached annotations.
    pub fn len(&self) -> usize {
        super::lock(&self.entries).len()
    }

    /// Check if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn refresh(
        &self,
        image_id: ImageId,
        project_id: ProjectId,
        force: bool,
    ) -> Result<Arc<Annotation>, AppError> {
        self.metas.get(project_id, force)?;
        let json = self.service.download(image_id)?;
        let annotation = Arc::new(Annotation::from_json(image_id, json)?);
        log::debug!(
            "Fetched annotation of image {} ({} labels)",
            image_id,
            annotation.len()
        );
        super::lock(&self.entries).insert(image_id, Arc::clone(&annotation));
        Ok(annotation)
    }
}
