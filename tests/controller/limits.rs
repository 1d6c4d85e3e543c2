use axum::{body::Body, http::Request};
use ontobind::tests_cfg;

use super::{get, post, send};

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let app = tests_cfg::app::get_app_context();
    let oversized = format!(
        "# {}\n",
        "x".repeat(app.ctx.config.server.body_limit_bytes().unwrap() + 1)
    );

    let res = post(app.router(), "/api/load", "text/turtle", oversized).await;

    assert_eq!(res.status, 413);
    assert!(app.ctx.store.begin_read().default_graph().is_empty());
}

#[tokio::test]
async fn unsupported_methods_are_not_allowed() {
    let app = tests_cfg::app::get_app_context();

    let res = get(app.router(), "/api/load").await;
    assert_eq!(res.status, 405);
    assert_eq!(res.text(), "Method Not Allowed");

    let request = Request::builder()
        .uri("/api/graph")
        .method("DELETE")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(app.router(), request).await.status, 405);

    let res = post(app.router(), "/ontology/core.ttl", "text/plain", "").await;
    assert_eq!(res.status, 405);
}

#[tokio::test]
async fn health_answers_ok() {
    let app = tests_cfg::app::get_app_context();

    let res = get(app.router(), "/health").await;

    assert_eq!(res.status, 200);
    assert_eq!(res.text(), "ok");
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = tests_cfg::app::get_app_context();

    assert_eq!(get(app.router(), "/api/unknown").await.status, 404);
}
