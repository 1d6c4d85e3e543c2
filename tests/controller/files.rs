use ontobind::tests_cfg::{self, repo::CORE_TURTLE};
use rstest::rstest;

use super::get;

#[tokio::test]
async fn serves_files_with_content_type_by_extension() {
    let app = tests_cfg::app::get_app_context();

    let res = get(app.router(), "/ontology/core.ttl").await;
    assert_eq!(res.status, 200);
    assert!(res.content_type().starts_with("text/turtle"));
    assert_eq!(res.text(), CORE_TURTLE);

    let res = get(app.router(), "/ontology/context.jsonld").await;
    assert!(res.content_type().starts_with("application/ld+json"));

    let res = get(app.router(), "/ontology/README.md").await;
    assert!(res.content_type().starts_with("text/markdown"));

    let res = get(app.router(), "/ontology/nested/notes.bin").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.content_type(), "application/octet-stream");
    assert_eq!(&res.body[..], &[0_u8, 1, 2]);
}

#[tokio::test]
async fn missing_files_and_directories_are_not_found() {
    let app = tests_cfg::app::get_app_context();

    assert_eq!(get(app.router(), "/ontology/absent.ttl").await.status, 404);
    assert_eq!(get(app.router(), "/ontology/nested").await.status, 404);
}

#[rstest]
#[case("/ontology/../secret.txt")]
#[case("/ontology/nested/../../secret.txt")]
#[case("/ontology/%2e%2e/secret.txt")]
#[case("/ontology/%2E%2E%2Fsecret.txt")]
#[case("/ontology/nested/%2e%2e/%2e%2e/secret.txt")]
#[case("/ontology/..%5Csecret.txt")]
#[case("/ontology//etc/passwd")]
#[case("/ontology/%2Fetc%2Fpasswd")]
#[case("/ontology/%252e%252e/secret.txt")]
#[tokio::test]
async fn traversal_never_escapes_the_root(#[case] uri: &str) {
    let app = tests_cfg::app::get_app_context();

    let res = get(app.router(), uri).await;

    assert!(
        res.status == 400 || res.status == 404,
        "{uri} answered {}",
        res.status
    );
    assert!(!res.text().contains("do not serve"));
}

#[rstest]
#[case("/ontology/%2e%2e/secret.txt")]
#[case("/ontology/..%5Csecret.txt")]
#[case("/ontology//etc/passwd")]
#[tokio::test]
async fn traversal_syntax_is_rejected_as_bad_request(#[case] uri: &str) {
    let app = tests_cfg::app::get_app_context();

    let res = get(app.router(), uri).await;

    assert_eq!(res.status, 400, "{uri}");
    assert_eq!(res.text(), "Invalid path");
}
