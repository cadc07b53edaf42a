//! Label navigation.
//!
//! Walks the labels of an annotation in their stored order, stopping only at
//! labels of one object class. The active label itself is located by id
//! regardless of its class, so navigating away from a label of another class
//! still works.

use crate::model::{Annotation, Label, LabelId};

/// Direction of a navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the start of the label list
    Previous,
    /// Towards the end of the label list
    Next,
}

/// Finds first/previous/next labels of one object class.
#[derive(Debug, Clone)]
pub struct LabelNavigator {
    class_name: String,
}

impl LabelNavigator {
    /// Create a navigator for an object class.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }

    /// The object class this navigator stops at.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    fn is_target(&self, label: &Label) -> bool {
        label.class_title == self.class_name
    }

    /// First label of the target class.
    pub fn first(&self, annotation: &Annotation) -> Option<LabelId> {
        annotation
            .labels()
            .iter()
            .find(|label| self.is_target(label))
            .map(|label| label.id)
    }

    /// Closest target-class label before `active`.
    ///
    /// None when `active` is the first target label or is not in the annotation.
    pub fn previous(&self, annotation: &Annotation, active: LabelId) -> Option<LabelId> {
        let mut last_seen = None;
        for label in annotation.labels() {
            if label.id == active {
                return last_seen;
            }
            if self.is_target(label) {
                last_seen = Some(label.id);
            }
        }
        None
    }

    /// Closest target-class label after `active`.
    ///
    /// None when nothing follows or `active` is not in the annotation.
    pub fn next(&self, annotation: &Annotation, active: LabelId) -> Option<LabelId> {
        annotation
            .labels()
            .iter()
            .skip_while(|label| label.id != active)
            .skip(1)
            .find(|label| self.is_target(label))
            .map(|label| label.id)
    }

    /// Resolve the label to select: the first target label when nothing is
    /// active, otherwise one step in `direction`.
    pub fn resolve(
        &self,
        annotation: &Annotation,
        active: Option<LabelId>,
        direction: Direction,
    ) -> Option<LabelId> {
        match (active, direction) {
            (None, _) => self.first(annotation),
            (Some(active), Direction::Previous) => self.previous(annotation, active),
            (Some(active), Direction::Next) => self.next(annotation, active),
        }
    }
}
