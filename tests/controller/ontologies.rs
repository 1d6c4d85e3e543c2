use ontobind::tests_cfg::{
    self,
    repo::{CONTEXT_URL, CORE_LOCALHOST, CORE_PRODUCTION},
};
use serde_json::json;

use super::get;

#[tokio::test]
async fn lists_registry_entries() {
    let app = tests_cfg::app::get_app_context();

    let res = get(app.router(), "/api/ontologies").await;

    assert_eq!(res.status, 200);
    assert_eq!(
        res.json(),
        json!([{
            "key": "core",
            "localhost_iri": CORE_LOCALHOST,
            "production_iri": CORE_PRODUCTION,
            "context_url": CONTEXT_URL,
            "file": "ontology/core.ttl"
        }])
    );
}

#[tokio::test]
async fn shows_one_entry_or_not_found() {
    let app = tests_cfg::app::get_app_context();

    let res = get(app.router(), "/api/ontologies/core").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.json()["production_iri"], CORE_PRODUCTION);

    let res = get(app.router(), "/api/ontologies/unknown").await;
    assert_eq!(res.status, 404);
}
