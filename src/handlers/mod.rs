//! Event handlers.
//!
//! One function per host event. Handlers read the session snapshot, talk to
//! the platform through the caches and services held by [`TaggerApp`], and
//! report results by setting fields of the host state tree:
//!
//! | Field | Set by |
//! |-------|--------|
//! | `state.dialogVisible` | `next_object` past the last product |
//! | `state.user2figureUpc.<user>` | assignments, `refresh_upc` |
//! | `state.user2figureError.<user>` | `mark_as_error`, `refresh_upc` |
//! | `state.user2selectedUpc.<user>` | `refresh_upc` when the UPC is in the worklist |

use serde_json::{Value, json};

use crate::app::TaggerApp;
use crate::error::AppError;
use crate::events::{EventContext, SessionState};
use crate::model::{LabelId, Upc, UserId};
use crate::navigation::Direction;

#[cfg(test)]
mod tests;

fn figure_upc_field(user_id: UserId) -> String {
    format!("state.user2figureUpc.{user_id}")
}

fn figure_error_field(user_id: UserId) -> String {
    format!("state.user2figureError.{user_id}")
}

fn selected_upc_field(user_id: UserId) -> String {
    format!("state.user2selectedUpc.{user_id}")
}

fn set_field(app: &TaggerApp, path: &str, value: Value) -> Result<(), AppError> {
    app.api().ui.set_field(app.config().task_id, path, value)?;
    Ok(())
}

// ============================================================================
// Navigation
// ============================================================================

/// Select a product label relative to the active figure and focus it.
///
/// Without an active figure the first product is selected. Returns the
/// selected label, None when there is nothing in `direction`.
pub fn select_object(
    app: &TaggerApp,
    ctx: &EventContext,
    direction: Direction,
    show_msg: bool,
) -> Result<Option<LabelId>, AppError> {
    let annotation = app
        .annotations()
        .get(ctx.image_id, ctx.project_id, ctx.figure_id)?;
    let target = app.navigator().resolve(&annotation, ctx.figure_id, direction);

    let Some(label_id) = target else {
        log::debug!(
            "No {:?} '{}' label from {:?} in image {}",
            direction,
            app.navigator().class_name(),
            ctx.figure_id,
            ctx.image_id
        );
        if show_msg && ctx.figure_id.is_some() {
            set_field(app, "state.dialogVisible", json!(true))?;
        }
        return Ok(None);
    };

    let ui = &app.api().ui;
    ui.set_active_figure(&ctx.session_id, label_id)?;
    ui.zoom_to_figure(&ctx.session_id, label_id, app.config().tagging.zoom_scale)?;
    log::debug!("Selected figure {} in session {}", label_id, ctx.session_id);
    Ok(Some(label_id))
}

/// `prev_object`
pub fn prev_object(app: &TaggerApp, ctx: &EventContext, _state: &SessionState) -> Result<(), AppError> {
    select_object(app, ctx, Direction::Previous, false)?;
    Ok(())
}

/// `next_object`: shows the end-of-image dialog when nothing follows.
pub fn next_object(app: &TaggerApp, ctx: &EventContext, _state: &SessionState) -> Result<(), AppError> {
    select_object(app, ctx, Direction::Next, true)?;
    Ok(())
}

// ============================================================================
// UPC selection
// ============================================================================

/// UPC at the user's selected worklist index.
pub fn worklist_upc(app: &TaggerApp, user_id: UserId, state: &SessionState) -> Result<Upc, AppError> {
    let index = state.selected_index(user_id)?;
    app.index()
        .worklist_entry(user_id, index)
        .map(|entry| entry.upc.clone())
        .ok_or(AppError::WorklistIndexOutOfRange { user_id, index })
}

/// UPC of the user's selected catalog row.
pub fn catalog_upc(app: &TaggerApp, user_id: UserId, state: &SessionState) -> Result<Upc, AppError> {
    let row = state.selected_row(user_id)?;
    row.get(&app.config().tagging.catalog_upc_column)
        .and_then(Upc::from_value)
        .ok_or(AppError::MissingSelection {
            user_id,
            field: "catalog UPC",
        })
}

// ============================================================================
// Tagging
// ============================================================================

fn assign_upc(app: &TaggerApp, ctx: &EventContext, upc: &Upc, multi: bool) -> Result<(), AppError> {
    let tag = &app.config().tagging.upc_tag;
    let written = if multi {
        app.assigner().assign_multi(
            ctx.project_id,
            ctx.image_id,
            ctx.figure_id,
            tag,
            Some(upc.as_str()),
        )?
    } else {
        app.assigner()
            .assign_single(ctx.project_id, ctx.figure_id, tag, Some(upc.as_str()))?
    };

    if written > 0 {
        set_field(app, &figure_upc_field(ctx.user_id), json!(upc.as_str()))?;
    }
    Ok(())
}

/// `assign_tag`
pub fn assign_tag(app: &TaggerApp, ctx: &EventContext, state: &SessionState) -> Result<(), AppError> {
    let upc = worklist_upc(app, ctx.user_id, state)?;
    assign_upc(app, ctx, &upc, false)
}

/// `assign_tag_catalog`
pub fn assign_tag_catalog(
    app: &TaggerApp,
    ctx: &EventContext,
    state: &SessionState,
) -> Result<(), AppError> {
    let upc = catalog_upc(app, ctx.user_id, state)?;
    assign_upc(app, ctx, &upc, false)
}

/// `multi_assign_tag`
pub fn multi_assign_tag(
    app: &TaggerApp,
    ctx: &EventContext,
    state: &SessionState,
) -> Result<(), AppError> {
    let upc = worklist_upc(app, ctx.user_id, state)?;
    assign_upc(app, ctx, &upc, true)
}

/// `multi_assign_tag_catalog`
pub fn multi_assign_tag_catalog(
    app: &TaggerApp,
    ctx: &EventContext,
    state: &SessionState,
) -> Result<(), AppError> {
    let upc = catalog_upc(app, ctx.user_id, state)?;
    assign_upc(app, ctx, &upc, true)
}

/// `mark_as_error`: the error tag is a marker, it carries no value.
pub fn mark_as_error(app: &TaggerApp, ctx: &EventContext, _state: &SessionState) -> Result<(), AppError> {
    let written = app.assigner().assign_single(
        ctx.project_id,
        ctx.figure_id,
        &app.config().tagging.error_tag,
        None,
    )?;
    if written > 0 {
        set_field(app, &figure_error_field(ctx.user_id), json!(true))?;
    }
    Ok(())
}

// ============================================================================
// Figure tags
// ============================================================================

/// Tags of the active figure as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureTags {
    /// Value of the UPC tag
    pub upc: Option<String>,
    /// Whether the error marker is attached
    pub error: bool,
}

/// Read the UPC and error tags currently attached to a figure.
pub fn figure_tags(app: &TaggerApp, ctx: &EventContext, figure_id: LabelId) -> Result<FigureTags, AppError> {
    let meta = app.metas().get(ctx.project_id, false)?;
    let tagging = &app.config().tagging;
    let upc_id = meta.tag_meta(&tagging.upc_tag).and_then(|tag| tag.id);
    let error_id = meta.tag_meta(&tagging.error_tag).and_then(|tag| tag.id);

    let tags = app.api().tagging.object_tags(figure_id)?;
    let upc = tags
        .iter()
        .find(|tag| Some(tag.tag_meta_id) == upc_id)
        .and_then(|tag| tag.value_text());
    let error = tags.iter().any(|tag| Some(tag.tag_meta_id) == error_id);

    Ok(FigureTags { upc, error })
}

/// `refresh_upc`: publish the tags of the active figure, and move the
/// worklist selection to the figure's UPC when the user has it.
pub fn refresh_upc(app: &TaggerApp, ctx: &EventContext, _state: &SessionState) -> Result<(), AppError> {
    let Some(figure_id) = ctx.figure_id else {
        log::warn!("Figure is not selected, nothing to refresh");
        return Ok(());
    };

    let tags = figure_tags(app, ctx, figure_id)?;
    set_field(app, &figure_upc_field(ctx.user_id), json!(tags.upc))?;
    set_field(app, &figure_error_field(ctx.user_id), json!(tags.error))?;

    let position = tags
        .upc
        .as_deref()
        .and_then(Upc::parse)
        .and_then(|upc| app.index().position_in_worklist(ctx.user_id, &upc));
    if let Some(position) = position {
        set_field(app, &selected_upc_field(ctx.user_id), json!(position))?;
    }

    log::debug!("Figure {} tags: {:?}", figure_id, tags);
    Ok(())
}

/// `manual_selected_figure_changed`: make sure the cached annotation knows
/// the new figure, then refresh its tags.
pub fn manual_selected_figure_changed(
    app: &TaggerApp,
    ctx: &EventContext,
    state: &SessionState,
) -> Result<(), AppError> {
    if ctx.figure_id.is_some() {
        app.annotations()
            .get(ctx.image_id, ctx.project_id, ctx.figure_id)?;
    }
    refresh_upc(app, ctx, state)
}
