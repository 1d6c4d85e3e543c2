use ontobind::tests_cfg::{self, repo::CORE_TURTLE};
use serde_json::json;

use super::{post, post_json};

#[tokio::test]
async fn ask_is_false_on_an_empty_store_and_true_after_a_load() {
    let app = tests_cfg::app::get_app_context();
    let ask = json!({ "query": "ASK { ?s ?p ?o }" });

    let res = post_json(app.router(), "/api/query", &ask).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.json(), json!({ "boolean": false }));

    post(app.router(), "/api/load", "text/turtle", CORE_TURTLE).await;

    let res = post_json(app.router(), "/api/query", &ask).await;
    assert_eq!(res.json(), json!({ "boolean": true }));
}

#[tokio::test]
async fn select_returns_sparql_results_json() {
    let app = tests_cfg::app::get_app_context();
    post(app.router(), "/api/load", "text/turtle", CORE_TURTLE).await;

    let res = post_json(
        app.router(),
        "/api/query",
        &json!({ "query": "SELECT ?s WHERE { ?s <http://localhost:8080/onto/core#rel> <http://localhost:8080/onto/core#C> }" }),
    )
    .await;

    assert_eq!(res.status, 200);
    assert!(res.content_type().starts_with("application/sparql-results+json"));
    assert_eq!(
        res.json(),
        json!({
            "head": { "vars": ["s"] },
            "results": { "bindings": [
                { "s": { "type": "uri", "value": "http://localhost:8080/onto/core#B" } }
            ] }
        })
    );
}

#[tokio::test]
async fn construct_is_serialized_in_the_requested_format() {
    let app = tests_cfg::app::get_app_context();
    post(app.router(), "/api/load", "text/turtle", CORE_TURTLE).await;
    let construct = "CONSTRUCT { ?s ?p ?o } WHERE { ?s ?p ?o }";

    let res = post_json(app.router(), "/api/query", &json!({ "query": construct })).await;
    assert_eq!(res.status, 200);
    assert!(res.content_type().starts_with("text/turtle"));
    assert!(res.text().contains("http://localhost:8080/onto/core#A"));

    let res = post_json(
        app.router(),
        "/api/query",
        &json!({ "query": construct, "format": "rdfxml" }),
    )
    .await;
    assert!(res.content_type().starts_with("application/rdf+xml"));
    assert!(res.text().contains("rdf:RDF"));
}

#[tokio::test]
async fn invalid_sparql_opens_no_transaction() {
    let app = tests_cfg::app::get_app_context();
    assert_eq!(app.ctx.store.transactions_opened(), 0);

    let res = post_json(app.router(), "/api/query", &json!({ "query": "SELECT WHERE {" })).await;

    assert_eq!(res.status, 400);
    assert!(res.text().starts_with("Invalid SPARQL query"));
    assert_eq!(app.ctx.store.transactions_opened(), 0);
}

#[tokio::test]
async fn missing_query_and_bad_json_are_bad_requests() {
    let app = tests_cfg::app::get_app_context();

    let res = post_json(app.router(), "/api/query", &json!({ "format": "turtle" })).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.text(), "Missing required field 'query'");

    let res = post_json(app.router(), "/api/query", &json!({ "query": "   " })).await;
    assert_eq!(res.status, 400);

    let res = post(app.router(), "/api/query", "application/json", "{not json").await;
    assert_eq!(res.status, 400);
    assert!(res.text().starts_with("Invalid JSON body"));
    assert_eq!(app.ctx.store.transactions_opened(), 0);
}

#[tokio::test]
async fn slow_queries_answer_service_unavailable() {
    let app = tests_cfg::app::get_app_context_with(|config| config.sparql.timeout = 50);
    let turtle: String = (0..150)
        .map(|i| format!("<http://localhost:8080/onto/core#s{i}> <http://localhost:8080/onto/core#p> {i} .\n"))
        .collect();
    let res = post(app.router(), "/api/load", "text/turtle", turtle).await;
    assert_eq!(res.json()["triples_loaded"], 150);

    let started = std::time::Instant::now();
    let res = post_json(
        app.router(),
        "/api/query",
        &json!({ "query": "ASK { ?a ?b ?c . ?d ?e ?f . ?g ?h ?i FILTER(CONCAT(STR(?a), STR(?d), STR(?g)) = \"never\") }" }),
    )
    .await;

    assert_eq!(res.status, 503);
    assert_eq!(res.text(), "Query evaluation exceeded 50ms");
    assert!(started.elapsed() < std::time::Duration::from_secs(3));
}
