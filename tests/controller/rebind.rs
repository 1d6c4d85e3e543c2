use ontobind::tests_cfg::{
    self,
    repo::{CONTEXT_URL, CORE_TURTLE, PRODUCTION_CONTEXT_URL},
};
use serde_json::json;

use super::{post, post_json};

#[tokio::test]
async fn rebinds_to_production_by_default() {
    let app = tests_cfg::app::get_app_context();

    let res = post_json(
        app.router(),
        "/api/rebind",
        &json!({ "content": "<http://localhost:8080/onto/core#A>" }),
    )
    .await;

    assert_eq!(res.status, 200);
    assert_eq!(
        res.json(),
        json!({ "content": "<https://example.org/onto/core#A>" })
    );
}

#[tokio::test]
async fn round_trips_through_both_targets() {
    let app = tests_cfg::app::get_app_context();
    let document = format!("{CORE_TURTLE}# context: {CONTEXT_URL}\n");

    let production = post_json(
        app.router(),
        "/api/rebind",
        &json!({ "target": "production", "content": document }),
    )
    .await
    .json()["content"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(production.contains(PRODUCTION_CONTEXT_URL));
    assert!(!production.contains("localhost"));

    let again = post_json(
        app.router(),
        "/api/rebind",
        &json!({ "target": "production", "content": production }),
    )
    .await;
    assert_eq!(again.json()["content"], production.as_str());

    let back = post_json(
        app.router(),
        "/api/rebind",
        &json!({ "target": "localhost", "content": production }),
    )
    .await;
    assert_eq!(back.json()["content"], document.as_str());
}

#[tokio::test]
async fn rejects_invalid_targets_and_missing_content() {
    let app = tests_cfg::app::get_app_context();

    let res = post_json(
        app.router(),
        "/api/rebind",
        &json!({ "target": "staging", "content": "x" }),
    )
    .await;
    assert_eq!(res.status, 400);
    assert_eq!(
        res.text(),
        "Invalid target; expected 'localhost' or 'production'"
    );

    let res = post_json(app.router(), "/api/rebind", &json!({ "target": "localhost" })).await;
    assert_eq!(res.status, 400);

    let res = post(app.router(), "/api/rebind", "application/json", "[").await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn rebinding_never_touches_the_store() {
    let app = tests_cfg::app::get_app_context();

    post_json(app.router(), "/api/rebind", &json!({ "content": CORE_TURTLE })).await;

    assert_eq!(app.ctx.store.transactions_opened(), 0);
}
