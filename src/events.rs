//! Events delivered by the annotation tool.
//!
//! Every event carries the context of the user action (who, which image,
//! which annotation session, which figure is active) and a snapshot of the
//! application state tree at the time of the action.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::Attributes;
use crate::error::AppError;
use crate::model::{ImageId, LabelId, ProjectId, UserId};

/// Events handled by the tagger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// Select the previous product label
    PrevObject,
    /// Select the next product label, showing a dialog at the end
    NextObject,
    /// Publish the tags of the active figure
    RefreshUpc,
    /// Tag the active figure with the selected worklist UPC
    AssignTag,
    /// Tag the active figure with the selected catalog UPC
    AssignTagCatalog,
    /// Tag the active figure and its overlaps with the selected worklist UPC
    MultiAssignTag,
    /// Tag the active figure and its overlaps with the selected catalog UPC
    MultiAssignTagCatalog,
    /// Flag the active figure as erroneous
    MarkAsError,
    /// The user clicked another figure
    ManualSelectedFigureChanged,
}

impl Event {
    /// Every event, in registration order.
    pub const ALL: [Event; 9] = [
        Event::PrevObject,
        Event::NextObject,
        Event::RefreshUpc,
        Event::AssignTag,
        Event::AssignTagCatalog,
        Event::MultiAssignTag,
        Event::MultiAssignTagCatalog,
        Event::MarkAsError,
        Event::ManualSelectedFigureChanged,
    ];

    /// Name used by the host to route the event.
    pub fn name(&self) -> &'static str {
        match self {
            Event::PrevObject => "prev_object",
            Event::NextObject => "next_object",
            Event::RefreshUpc => "refresh_upc",
            Event::AssignTag => "assign_tag",
            Event::AssignTagCatalog => "assign_tag_catalog",
            Event::MultiAssignTag => "multi_assign_tag",
            Event::MultiAssignTagCatalog => "multi_assign_tag_catalog",
            Event::MarkAsError => "mark_as_error",
            Event::ManualSelectedFigureChanged => "manual_selected_figure_changed",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Event {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Event::ALL
            .into_iter()
            .find(|event| event.name() == s)
            .ok_or_else(|| AppError::UnknownEvent(s.to_string()))
    }
}

/// Who triggered an event and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    /// Acting user
    pub user_id: UserId,
    /// Image open in the tool
    pub image_id: ImageId,
    /// Project of the image
    pub project_id: ProjectId,
    /// Annotation tool session
    pub session_id: String,
    /// Active figure, if any
    #[serde(default)]
    pub figure_id: Option<LabelId>,
}

/// The parts of the host state tree the handlers read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Selected worklist index per user
    #[serde(rename = "user2selectedUpc", default)]
    pub user2selected_upc: BTreeMap<UserId, usize>,
    /// Selected catalog row per user
    #[serde(rename = "user2selectedRowData", default)]
    pub user2selected_row_data: BTreeMap<UserId, Option<Attributes>>,
}

impl SessionState {
    /// Selected worklist index of a user.
    pub fn selected_index(&self, user_id: UserId) -> Result<usize, AppError> {
        self.user2selected_upc
            .get(&user_id)
            .copied()
            .ok_or(AppError::MissingSelection {
                user_id,
                field: "worklist item",
            })
    }

    /// Selected catalog row of a user.
    pub fn selected_row(&self, user_id: UserId) -> Result<&Attributes, AppError> {
        self.user2selected_row_data
            .get(&user_id)
            .and_then(Option::as_ref)
            .ok_or(AppError::MissingSelection {
                user_id,
                field: "catalog row",
            })
    }

    /// Set the selected worklist index of a user.
    pub fn with_selected_index(mut self, user_id: UserId, index: usize) -> Self {
        self.user2selected_upc.insert(user_id, index);
        self
    }

    /// Set the selected catalog row of a user.
    pub fn with_selected_row(mut self, user_id: UserId, row: Attributes) -> Self {
        self.user2selected_row_data.insert(user_id, Some(row));
        self
    }
}
