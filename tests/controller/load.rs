use ontobind::tests_cfg::{self, repo::CORE_TURTLE};
use serde_json::json;

use super::post;

#[tokio::test]
async fn loads_turtle_into_the_default_graph() {
    let app = tests_cfg::app::get_app_context();

    let res = post(app.router(), "/api/load", "text/turtle", CORE_TURTLE).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.json(), json!({ "ok": true, "triples_loaded": 2 }));
    assert_eq!(app.ctx.store.begin_read().default_graph().len(), 2);
}

#[tokio::test]
async fn loading_twice_does_not_deduplicate() {
    let app = tests_cfg::app::get_app_context();

    for _ in 0..2 {
        let res = post(app.router(), "/api/load", "text/turtle; charset=utf-8", CORE_TURTLE).await;
        assert_eq!(res.json()["triples_loaded"], 2);
    }

    let read = app.ctx.store.begin_read();
    assert_eq!(read.default_graph().len(), 4);
    assert_eq!(read.union_graph().len(), 2);
}

#[tokio::test]
async fn missing_content_type_defaults_to_turtle() {
    let app = tests_cfg::app::get_app_context();
    let request = axum::http::Request::builder()
        .uri("/api/load")
        .method("POST")
        .body(axum::body::Body::from(CORE_TURTLE))
        .unwrap();

    let res = super::send(app.router(), request).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.json()["triples_loaded"], 2);
}

#[tokio::test]
async fn accepts_safe_jsonld() {
    let app = tests_cfg::app::get_app_context();
    let document = json!({
        "@context": {
            "@base": "http://localhost:8080/onto/core#",
            "label": "http://www.w3.org/2000/01/rdf-schema#label"
        },
        "@id": "http://localhost:8080/onto/core#Functor",
        "label": "Functor"
    });

    let res = post(app.router(), "/api/load", "application/ld+json", document.to_string()).await;

    assert_eq!(res.status, 200, "{}", res.text());
    assert_eq!(res.json()["triples_loaded"], 1);
}

#[tokio::test]
async fn rejects_unregistered_base_before_parsing() {
    let app = tests_cfg::app::get_app_context();
    let opened = app.ctx.store.transactions_opened();
    let document = json!({
        "@context": { "@base": "http://evil.example/" },
        "@id": "Foo"
    });

    let res = post(app.router(), "/api/load", "application/ld+json", document.to_string()).await;

    assert_eq!(res.status, 400);
    assert_eq!(
        res.json(),
        json!({
            "ok": false,
            "base_iri": "http://evil.example/",
            "errors": ["base_iri_not_registered: http://evil.example/"]
        })
    );
    assert_eq!(app.ctx.store.transactions_opened(), opened);
}

#[tokio::test]
async fn rejects_unregistered_base_in_nested_node() {
    let app = tests_cfg::app::get_app_context();
    let document = json!({
        "@context": { "@base": "http://localhost:8080/onto/core#" },
        "@graph": [{
            "@context": { "@base": "http://evil.example/" },
            "@id": "Foo",
            "http://www.w3.org/2000/01/rdf-schema#label": "Foo"
        }]
    });

    let res = post(app.router(), "/api/load", "application/ld+json", document.to_string()).await;

    assert_eq!(res.status, 400);
    assert_eq!(
        res.json()["errors"],
        json!(["base_iri_not_registered: http://evil.example/"])
    );
    assert!(app.ctx.store.begin_read().default_graph().is_empty());
}

#[tokio::test]
async fn rejects_network_path_ids() {
    let app = tests_cfg::app::get_app_context();
    let document = json!({
        "@context": { "@base": "http://localhost:8080/onto/core#" },
        "@id": "//evil.example/Foo",
        "http://www.w3.org/2000/01/rdf-schema#label": "Foo"
    });

    let res = post(app.router(), "/api/load", "application/ld+json", document.to_string()).await;

    assert_eq!(res.status, 400);
    assert_eq!(
        res.json()["errors"],
        json!(["iri_not_allowed: http://evil.example/Foo"])
    );
    assert!(app.ctx.store.begin_read().default_graph().is_empty());
}

#[tokio::test]
async fn rejects_malformed_jsonld_with_report() {
    let app = tests_cfg::app::get_app_context();

    let res = post(app.router(), "/api/load", "application/json", "{\"@context\": ").await;

    assert_eq!(res.status, 400);
    let report = res.json();
    assert_eq!(report["ok"], false);
    assert!(report["errors"][0]
        .as_str()
        .unwrap()
        .starts_with("invalid_json: "));
}

#[tokio::test]
async fn malformed_turtle_is_a_bad_request() {
    let app = tests_cfg::app::get_app_context();

    let res = post(app.router(), "/api/load", "text/turtle", "<a> <b> .").await;

    assert_eq!(res.status, 400);
    assert!(res.text().starts_with("Unable to parse RDF payload"));
    assert!(app.ctx.store.begin_read().default_graph().is_empty());
}
