//! Tests for the assignment and error-marking events.

use serde_json::{Map, json};

use super::{PROJECT, USER, ctx, fixture, state};
use crate::app::TaggerApp;
use crate::catalog::{CatalogIndexer, CatalogInputs, CatalogSheet};
use crate::error::AppError;
use crate::events::SessionState;
use crate::handlers::{
    assign_tag, assign_tag_catalog, mark_as_error, multi_assign_tag, multi_assign_tag_catalog,
};
use crate::testing::{ERROR_TAG_ID, FakeProjects, TagCall, UPC_TAG_ID, meta_json};

fn upc_values(f: &super::Fixture, label: u64) -> Vec<Option<String>> {
    f.fakes.tagging.values_of(label, UPC_TAG_ID)
}

#[test]
fn test_assign_tag_uses_selected_worklist_item() {
    let f = fixture();
    assign_tag(&f.app, &ctx(Some(10)), &state()).unwrap();

    assert_eq!(upc_values(&f, 10), vec![Some("222".to_string())]);
    assert_eq!(f.fakes.ui.field("state.user2figureUpc.7"), Some(json!("222")));
}

#[test]
fn test_assign_tag_catalog_coerces_numeric_cell() {
    let f = fixture();
    assign_tag_catalog(&f.app, &ctx(Some(30)), &state()).unwrap();

    assert_eq!(upc_values(&f, 30), vec![Some("111".to_string())]);
    assert_eq!(f.fakes.ui.field("state.user2figureUpc.7"), Some(json!("111")));
}

#[test]
fn test_assign_keeps_upc_text_as_listed() {
    let f = fixture();
    let inputs = CatalogInputs::from_json_values(
        json!({"049000028911": ["cola.jpg"]}),
        json!({"1": ["049000028911"]}),
        json!({"alice": [1]}),
        // The sheet stored the code as a number and lost the zero.
        CatalogSheet::from_csv_reader("UPC CODE,BRAND
49000028911,Cola
".as_bytes()).unwrap(),
    )
    .unwrap();
    let index = CatalogIndexer::new(f.fakes.members.as_ref(), 1)
        .build(&inputs)
        .unwrap();
    let app = TaggerApp::new(f.app.api().clone(), f.app.config().clone(), index);

    assign_tag(&app, &ctx(Some(10)), &state().with_selected_index(USER, 0)).unwrap();

    assert_eq!(upc_values(&f, 10), vec![Some("049000028911".to_string())]);
    assert_eq!(
        f.fakes.ui.field("state.user2figureUpc.7"),
        Some(json!("049000028911"))
    );
    let data = serde_json::to_value(app.host_data()).unwrap();
    assert_eq!(data["user2upc"]["7"][0]["upc"], json!("049000028911"));
    assert_eq!(data["user2upcIndex2Info"]["7"]["0"]["BRAND"], json!("Cola"));
}

#[test]
fn test_reassign_keeps_one_value() {
    let f = fixture();
    assign_tag(&f.app, &ctx(Some(10)), &state()).unwrap();
    assign_tag(&f.app, &ctx(Some(10)), &state().with_selected_index(USER, 2)).unwrap();

    assert_eq!(upc_values(&f, 10), vec![Some("333".to_string())]);
}

#[test]
fn test_multi_assign_tags_overlapping_labels() {
    let f = fixture();
    multi_assign_tag(&f.app, &ctx(Some(10)), &state()).unwrap();

    // The note inside product 10 and the touching product 30 are tagged too.
    assert_eq!(f.fakes.tagging.added_labels(), vec![10, 20, 30]);
    for label in [10, 20, 30] {
        assert_eq!(upc_values(&f, label), vec![Some("222".to_string())]);
    }
    assert!(f.fakes.tagging.tags_of(40).is_empty());
}

#[test]
fn test_multi_assign_catalog_isolated_label() {
    let f = fixture();
    multi_assign_tag_catalog(&f.app, &ctx(Some(40)), &state()).unwrap();
    assert_eq!(f.fakes.tagging.added_labels(), vec![40]);
    assert_eq!(upc_values(&f, 40), vec![Some("111".to_string())]);
}

#[test]
fn test_multi_assign_unknown_figure_fails() {
    let f = fixture();
    let err = multi_assign_tag(&f.app, &ctx(Some(77)), &state()).unwrap_err();
    assert!(matches!(err, AppError::LabelNotFound { label_id: 77, .. }));
    assert!(f.fakes.ui.calls().is_empty());
}

#[test]
fn test_no_active_figure_writes_nothing() {
    let f = fixture();
    assign_tag(&f.app, &ctx(None), &state()).unwrap();
    multi_assign_tag_catalog(&f.app, &ctx(None), &state()).unwrap();
    mark_as_error(&f.app, &ctx(None), &state()).unwrap();

    assert!(f.fakes.tagging.calls().is_empty());
    assert!(f.fakes.ui.calls().is_empty());
}

#[test]
fn test_selection_errors() {
    let f = fixture();

    let err = assign_tag(&f.app, &ctx(Some(10)), &SessionState::default()).unwrap_err();
    assert!(matches!(err, AppError::MissingSelection { user_id: USER, .. }));

    let out_of_range = state().with_selected_index(USER, 5);
    let err = assign_tag(&f.app, &ctx(Some(10)), &out_of_range).unwrap_err();
    assert!(matches!(
        err,
        AppError::WorklistIndexOutOfRange {
            user_id: USER,
            index: 5
        }
    ));

    let mut row = Map::new();
    row.insert("BRAND".to_string(), json!("Acme"));
    let no_upc = state().with_selected_row(USER, row);
    let err = assign_tag_catalog(&f.app, &ctx(Some(10)), &no_upc).unwrap_err();
    assert!(matches!(
        err,
        AppError::MissingSelection {
            field: "catalog UPC",
            ..
        }
    ));
    assert!(f.fakes.tagging.calls().is_empty());
}

#[test]
fn test_mark_as_error() {
    let f = fixture();
    mark_as_error(&f.app, &ctx(Some(30)), &state()).unwrap();
    mark_as_error(&f.app, &ctx(Some(30)), &state()).unwrap();

    assert_eq!(f.fakes.tagging.values_of(30, ERROR_TAG_ID), vec![None]);
    assert_eq!(
        f.fakes.tagging.calls().first(),
        Some(&TagCall::Add(ERROR_TAG_ID, 30, None))
    );
    assert_eq!(f.fakes.ui.field("state.user2figureError.7"), Some(json!(true)));
}

#[test]
fn test_schema_extended_before_first_assignment() {
    let f = fixture();
    let projects = FakeProjects::new();
    projects.insert(PROJECT + 1, meta_json(&[]));
    // Swap in a project service whose schema lacks both tags.
    let projects = std::sync::Arc::new(projects);
    let mut api = f.app.api().clone();
    api.projects = projects.clone();
    let app = crate::app::TaggerApp::new(api, f.app.config().clone(), f.app.index().clone());

    let mut context = ctx(Some(10));
    context.project_id = PROJECT + 1;
    assign_tag(&app, &context, &state()).unwrap();
    assign_tag(&app, &context, &state()).unwrap();

    assert_eq!(projects.update_count(), 1);
    let stored = projects.stored(PROJECT + 1);
    assert_eq!(stored["tags"].as_array().unwrap().len(), 2);
    // New tag definitions get ids from the service.
    assert_eq!(f.fakes.tagging.values_of(10, 500), vec![Some("222".to_string())]);
}
