use ontobind::{
    store::{format::parse_graph, RdfFormat},
    tests_cfg::{self, repo::CORE_TURTLE},
};

use super::{get, post};

#[tokio::test]
async fn exports_the_union_graph_as_turtle_by_default() {
    let app = tests_cfg::app::get_app_context();
    post(app.router(), "/api/load", "text/turtle", CORE_TURTLE).await;
    post(app.router(), "/api/load", "text/turtle", CORE_TURTLE).await;

    let res = get(app.router(), "/api/graph").await;

    assert_eq!(res.status, 200);
    assert!(res.content_type().starts_with("text/turtle"));
    let graph = parse_graph(&res.body, RdfFormat::Turtle, None).expect("turtle export");
    assert_eq!(graph.len(), 2);
}

#[tokio::test]
async fn export_format_is_selected_by_parameter() {
    let app = tests_cfg::app::get_app_context();
    post(app.router(), "/api/load", "text/turtle", CORE_TURTLE).await;

    let res = get(app.router(), "/api/graph?format=jsonld").await;
    assert_eq!(res.status, 200);
    assert!(res.content_type().starts_with("application/ld+json"));
    let graph = parse_graph(&res.body, RdfFormat::JsonLd, None).expect("json-ld export");
    assert_eq!(graph.len(), 2);

    let res = get(app.router(), "/api/graph?format=unknown").await;
    assert!(res.content_type().starts_with("text/turtle"));
}

#[tokio::test]
async fn empty_store_exports_an_empty_graph() {
    let app = tests_cfg::app::get_app_context();

    let res = get(app.router(), "/api/graph").await;

    assert_eq!(res.status, 200);
    let graph = parse_graph(&res.body, RdfFormat::Turtle, None).expect("turtle export");
    assert!(graph.is_empty());
}
