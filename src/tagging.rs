//! Tag assignment on labels.
//!
//! Every write replaces: existing instances of the schema tag are removed
//! from the label before the new one is added, so a label never carries two
//! values of the same tag.

use std::sync::Arc;

use crate::cache::{AnnotationCache, MetaCache};
use crate::error::AppError;
use crate::model::{ImageId, LabelId, ProjectId, TagMetaId, TagValueType};
use crate::services::TaggingService;

/// Writes tags on one label or on all labels overlapping it.
pub struct TagAssigner {
    metas: Arc<MetaCache>,
    annotations: Arc<AnnotationCache>,
    tagging: Arc<dyn TaggingService>,
}

impl TagAssigner {
    /// Create an assigner.
    pub fn new(
        metas: Arc<MetaCache>,
        annotations: Arc<AnnotationCache>,
        tagging: Arc<dyn TaggingService>,
    ) -> Self {
        Self {
            metas,
            annotations,
            tagging,
        }
    }

    /// Tag the active figure. Returns the number of labels written: 0 when
    /// no figure is active, 1 otherwise.
    pub fn assign_single(
        &self,
        project_id: ProjectId,
        figure_id: Option<LabelId>,
        tag_name: &str,
        value: Option<&str>,
    ) -> Result<usize, AppError> {
        let Some(figure_id) = figure_id else {
            log::warn!("Figure is not selected, '{}' not assigned", tag_name);
            return Ok(0);
        };

        let (tag_meta_id, value) = self.resolve(project_id, tag_name, value)?;
        self.replace(tag_meta_id, figure_id, value)?;
        log::info!("Tagged figure {} with '{}' = {:?}", figure_id, tag_name, value);
        Ok(1)
    }

    /// Tag the active figure and every label whose bounding box touches it,
    /// whatever their class. Returns the number of labels written.
    pub fn assign_multi(
        &self,
        project_id: ProjectId,
        image_id: ImageId,
        figure_id: Option<LabelId>,
        tag_name: &str,
        value: Option<&str>,
    ) -> Result<usize, AppError> {
        let Some(figure_id) = figure_id else {
            log::warn!("Figure is not selected, '{}' not assigned", tag_name);
            return Ok(0);
        };

        let (tag_meta_id, value) = self.resolve(project_id, tag_name, value)?;
        let annotation = self.annotations.get(image_id, project_id, Some(figure_id))?;
        let selected = annotation
            .label(figure_id)
            .ok_or(AppError::LabelNotFound {
                label_id: figure_id,
                image_id,
            })?;
        let selected_box = selected
            .bounding_box()
            .ok_or(AppError::MissingGeometry { label_id: figure_id })?;

        let mut tagged = 0;
        for label in annotation.labels() {
            let Some(bbox) = label.bounding_box() else {
                log::debug!("Skipping label {} without usable geometry", label.id);
                continue;
            };
            if bbox.intersects(&selected_box) {
                self.replace(tag_meta_id, label.id, value)?;
                tagged += 1;
            }
        }

        log::info!(
            "Tagged {} labels overlapping figure {} with '{}' = {:?}",
            tagged,
            figure_id,
            tag_name,
            value
        );
        Ok(tagged)
    }

    /// Schema id of a tag; marker tags drop any value.
    fn resolve<'v>(
        &self,
        project_id: ProjectId,
        tag_name: &str,
        value: Option<&'v str>,
    ) -> Result<(TagMetaId, Option<&'v str>), AppError> {
        let meta = self.metas.get(project_id, false)?;
        let tag = meta.tag_meta(tag_name).ok_or_else(|| AppError::UnknownTag {
            name: tag_name.to_string(),
            project_id,
        })?;
        let id = tag.id.ok_or_else(|| AppError::UnknownTag {
            name: tag_name.to_string(),
            project_id,
        })?;

        if tag.value_type == TagValueType::None {
            Ok((id, None))
        } else {
            Ok((id, value))
        }
    }

    fn replace(
        &self,
        tag_meta_id: TagMetaId,
        label_id: LabelId,
        value: Option<&str>,
    ) -> Result<(), AppError> {
        let existing = self.tagging.object_tags(label_id)?;
        for tag in existing.iter().filter(|t| t.tag_meta_id == tag_meta_id) {
            self.tagging.remove_tag(tag_meta_id, label_id, tag.id)?;
        }
        self.tagging.add_tag(tag_meta_id, label_id, value)?;
        Ok(())
    }
}
