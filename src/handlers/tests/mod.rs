//! Event handler scenarios against in-memory platform fakes.

mod tagging_tests;

use serde_json::{Map, json};

use crate::app::TaggerApp;
use crate::catalog::{CatalogIndexer, CatalogInputs, CatalogSheet};
use crate::config::AppConfig;
use crate::events::{EventContext, SessionState};
use crate::model::{ImageId, LabelId, ProjectId, TaskId, UserId};
use crate::testing::{FakeMembers, Fakes, annotation_json, rect};

const PROJECT: ProjectId = 3;
const IMAGE: ImageId = 11;
const USER: UserId = 7;
const TASK: TaskId = 99;
const SESSION: &str = "session-1";

/// App wired to fakes.
///
/// Alice (user 7) has the worklist `[111, 222, 333]`; the catalog knows
/// 111 and 222. The image holds, in order:
///
/// | id | class | box |
/// |----|-------|-----|
/// | 10 | Product | (0,0)-(10,10) |
/// | 20 | Note | (5,5)-(8,8) |
/// | 30 | Product | (9,9)-(20,20) |
/// | 40 | Product | (100,100)-(110,110) |
struct Fixture {
    fakes: Fakes,
    app: TaggerApp,
}

fn fixture() -> Fixture {
    let fakes = Fakes::new(
        PROJECT,
        FakeMembers::new("Shelf Team", &[(USER, "alice"), (8, "bob")]),
    );

    let inputs = CatalogInputs::from_json_values(
        json!({"111": ["a.jpg"], "222": ["b_full.jpg", "b.jpg"], "333": ["c.jpg"]}),
        json!({"1": ["111", "222"], "2": ["333"]}),
        json!({"alice": [1, 2]}),
        CatalogSheet::from_csv_reader("UPC CODE,BRAND\n111,Acme\n222,Beta\n".as_bytes()).unwrap(),
    )
    .unwrap();
    let index = CatalogIndexer::new(fakes.members.as_ref(), 1)
        .build(&inputs)
        .unwrap();

    let mut config = AppConfig::new();
    config.task_id = TASK;
    let app = TaggerApp::new(fakes.api(), config, index);

    fakes.annotations.insert(IMAGE, image_objects());
    Fixture { fakes, app }
}

fn image_objects() -> serde_json::Value {
    annotation_json(&[
        rect(10, "Product", 0.0, 0.0, 10.0, 10.0),
        rect(20, "Note", 5.0, 5.0, 8.0, 8.0),
        rect(30, "Product", 9.0, 9.0, 20.0, 20.0),
        rect(40, "Product", 100.0, 100.0, 110.0, 110.0),
    ])
}

fn ctx(figure_id: Option<LabelId>) -> EventContext {
    EventContext {
        user_id: USER,
        image_id: IMAGE,
        project_id: PROJECT,
        session_id: SESSION.to_string(),
        figure_id,
    }
}

/// Alice has worklist item 1 (UPC 222) and catalog row 111 selected.
fn state() -> SessionState {
    let mut row = Map::new();
    row.insert("UPC CODE".to_string(), json!(111));
    row.insert("BRAND".to_string(), json!("Acme"));
    SessionState::default()
        .with_selected_index(USER, 1)
        .with_selected_row(USER, row)
}
