//! Spec loading, server resolution and reduction
//!
//! Behavior of the OpenAPI helpers the API tools are built on: where a spec
//! comes from, how its server URL is decided, and what the reduced view keeps.

mod common;

use common::{sample_spec, write_temp};
use etendo_tools::openapi::{
    load_spec, paths_with_tag, resolve_servers, ReducedSpec, SpecError,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const YAML_SPEC: &str = r#"
openapi: 3.0.1
info:
  title: Purchase
  description: Purchase API
  version: "1.0"
servers:
  - url: https://declared.example/api
paths:
  /a:
    get:
      description: List A
      tags: [x]
      parameters:
        - name: limit
          in: query
          required: false
        - name: org
          in: query
          required: true
      responses:
        200:
          description: A list
        404:
          description: Missing
  /b:
    post:
      description: Create B
      tags: [y]
      requestBody:
        content:
          application/json:
            schema:
              type: object
      responses:
        201:
          description: Created
  /c:
    delete:
      description: Remove C
"#;

#[tokio::test]
async fn test_local_json_and_yaml_load_to_the_same_document() {
    let client = reqwest::Client::new();
    let json_file = write_temp(&sample_spec().to_string());
    let yaml_file = write_temp(YAML_SPEC);

    let from_json = load_spec(json_file.path().to_str().unwrap(), &client)
        .await
        .unwrap();
    let from_yaml = load_spec(yaml_file.path().to_str().unwrap(), &client)
        .await
        .unwrap();

    assert_eq!(from_json, sample_spec());
    assert_eq!(from_yaml, from_json);
}

#[tokio::test]
async fn test_remote_spec_is_downloaded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc/openapi.yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(YAML_SPEC))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/doc/openapi.yaml", mock_server.uri());
    let doc = load_spec(&url, &reqwest::Client::new()).await.unwrap();

    assert_eq!(doc["info"]["description"], "Purchase API");
    assert_eq!(doc["paths"]["/a"]["get"]["responses"]["200"]["description"], "A list");
}

#[tokio::test]
async fn test_remote_error_status_is_reported() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing.json", mock_server.uri());
    let result = load_spec(&url, &reqwest::Client::new()).await;

    assert!(matches!(result, Err(SpecError::FetchStatus { status: 404, .. })));
}

#[tokio::test]
async fn test_source_that_is_neither_file_nor_url() {
    let result = load_spec("/definitely/not/here.json", &reqwest::Client::new()).await;
    assert!(matches!(result, Err(SpecError::InvalidSource(_))));

    let result = load_spec("ftp://example.com/spec.json", &reqwest::Client::new()).await;
    assert!(matches!(result, Err(SpecError::InvalidSource(_))));
}

#[tokio::test]
async fn test_unparseable_file() {
    let file = write_temp("{ this is: [not valid");
    let result = load_spec(file.path().to_str().unwrap(), &reqwest::Client::new()).await;
    assert!(matches!(result, Err(SpecError::Parse(_))));
}

#[test]
fn test_legacy_host_and_base_path() {
    let mut doc = json!({"host": "h.com", "basePath": "/v1", "paths": {}});
    resolve_servers(&mut doc, None).unwrap();
    assert_eq!(doc["servers"], json!([{"url": "h.com/v1"}]));
}

#[test]
fn test_missing_server_is_a_configuration_error() {
    let mut doc = json!({"paths": {}});
    let err = resolve_servers(&mut doc, None).unwrap_err();
    assert!(matches!(err, SpecError::MissingServer));
    assert!(err.to_string().contains("server_url"));
}

#[test]
fn test_reduction_keeps_what_callers_need() {
    let reduced = ReducedSpec::from_document(&sample_spec()).unwrap();

    let keys: Vec<&str> = reduced.endpoints.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["GET /a", "POST /b", "DELETE /c"]);
    assert_eq!(reduced.description, "Purchase API");

    let get_a = reduced.find("GET /a").unwrap();
    assert_eq!(
        get_a.docs,
        json!({
            "description": "List A",
            "parameters": [{"name": "org", "in": "query", "required": true}],
            "responses": {"description": "A list"}
        })
    );

    // No 200 response: the first 2xx is used
    let post_b = reduced.find("POST /b").unwrap();
    assert_eq!(post_b.docs["responses"], json!({"description": "Created"}));
    assert!(post_b.docs["requestBody"]["content"].is_object());
}

#[test]
fn test_tag_filter_ignores_untagged_operations() {
    let doc = sample_spec();
    let tagged = paths_with_tag(&doc, "x").unwrap();
    assert_eq!(tagged.len(), 1);
    assert!(tagged.contains("GET /a"));

    assert!(paths_with_tag(&doc, "nope").unwrap().is_empty());
}

fn server_url_strategy() -> impl Strategy<Value = String> {
    "https?://[a-z]{1,10}\\.example(/[a-z]{0,8})?"
}

proptest! {
    #[test]
    fn override_always_wins(
        url in server_url_strategy(),
        declared in proptest::collection::vec(server_url_strategy(), 0..3),
    ) {
        let servers: Vec<Value> = declared.iter().map(|u| json!({"url": u})).collect();
        let mut doc = json!({"servers": servers, "paths": {}});

        resolve_servers(&mut doc, Some(&url)).unwrap();
        prop_assert_eq!(&doc["servers"], &json!([{"url": &url}]));
    }

    #[test]
    fn declared_servers_are_left_untouched(
        declared in proptest::collection::vec(server_url_strategy(), 1..4),
    ) {
        let servers: Vec<Value> = declared.iter().map(|u| json!({"url": u})).collect();
        let mut doc = json!({"servers": servers.clone(), "host": "ignored", "basePath": "/x"});

        resolve_servers(&mut doc, None).unwrap();
        prop_assert_eq!(&doc["servers"], &Value::Array(servers));
    }

    #[test]
    fn legacy_fields_are_concatenated(host in "[a-z]{1,12}\\.com", base in "(/[a-z]{1,6}){0,3}") {
        let mut doc = json!({"host": &host, "basePath": &base});
        resolve_servers(&mut doc, None).unwrap();
        prop_assert_eq!(
            doc["servers"][0]["url"].as_str().unwrap(),
            format!("{host}{base}")
        );
    }
}
