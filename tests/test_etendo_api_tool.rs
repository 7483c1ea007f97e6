//! `etendo_api` tool behavior through the tool system boundary
//!
//! Every outcome is observed as the envelope the orchestrating agent receives.

mod common;

use common::{sample_spec, test_config, tool_system, with_tools, write_temp};
use etendo_tools::tools::builtin::NO_TOKEN_MESSAGE;
use etendo_tools::{RequestContext, ToolResponse};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOST: &str = "http://erp.example/etendo";

#[tokio::test]
async fn test_tag_filter_lists_matching_endpoints() {
    let spec = write_temp(&sample_spec().to_string());
    let config = with_tools(test_config(HOST, spec.path().to_str().unwrap()), &["etendo_api"]);
    let tools = tool_system(&config, None).await;

    let response = tools
        .invoke("etendo_api", &json!({"tag": "x"}), &RequestContext::with_token("tok"))
        .await;

    assert_eq!(
        response.into_value(),
        json!({
            "message": {
                "token": "tok",
                "url": HOST,
                "description": "Purchase API",
                "endpoints": [{"path": "GET /a", "description": "List A"}]
            }
        })
    );
}

#[tokio::test]
async fn test_listing_without_tag_includes_every_endpoint() {
    let spec = write_temp(&sample_spec().to_string());
    let config = with_tools(test_config(HOST, spec.path().to_str().unwrap()), &["etendo_api"]);
    let tools = tool_system(&config, None).await;

    let response = tools
        .invoke("etendo_api", &json!({}), &RequestContext::with_token("tok"))
        .await;

    let ToolResponse::Message(message) = response else {
        panic!("expected a message envelope");
    };
    let paths: Vec<&str> = message["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["GET /a", "POST /b", "DELETE /c"]);
    // Listing entries carry no parameters or responses
    assert!(message["endpoints"][0].get("responses").is_none());
}

#[tokio::test]
async fn test_exact_endpoint_ignores_tag() {
    let spec = write_temp(&sample_spec().to_string());
    let config = with_tools(test_config(HOST, spec.path().to_str().unwrap()), &["etendo_api"]);
    let tools = tool_system(&config, None).await;

    let response = tools
        .invoke(
            "etendo_api",
            &json!({"endpoint": "GET /a", "tag": "y"}),
            &RequestContext::with_token("tok"),
        )
        .await;

    assert_eq!(
        response.into_value(),
        json!({
            "message": {
                "path": "GET /a",
                "description": "List A",
                "requestBody": null,
                "responses": {"description": "A list"}
            }
        })
    );
}

#[tokio::test]
async fn test_unknown_endpoint() {
    let spec = write_temp(&sample_spec().to_string());
    let config = with_tools(test_config(HOST, spec.path().to_str().unwrap()), &["etendo_api"]);
    let tools = tool_system(&config, None).await;

    let response = tools
        .invoke(
            "etendo_api",
            &json!({"endpoint": "DELETE /nonexistent"}),
            &RequestContext::with_token("tok"),
        )
        .await;

    assert_eq!(response.into_value(), json!({"error": "Endpoint not found"}));
}

#[tokio::test]
async fn test_missing_token_never_touches_the_spec() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_spec()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let spec_url = format!("{}/doc/openapi.json", mock_server.uri());
    let config = with_tools(test_config(HOST, &spec_url), &["etendo_api"]);
    let tools = tool_system(&config, None).await;

    for context in [
        RequestContext::empty(),
        RequestContext::new(json!({"auth": {}})),
        RequestContext::with_token(""),
    ] {
        let response = tools.invoke("etendo_api", &json!({}), &context).await;
        assert_eq!(response, ToolResponse::Error(NO_TOKEN_MESSAGE.to_string()));
    }
}

#[tokio::test]
async fn test_remote_spec_with_configured_server_url() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc/openapi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_spec()))
        .mount(&mock_server)
        .await;

    let spec_url = format!("{}/doc/openapi.json", mock_server.uri());
    let mut config = with_tools(test_config(HOST, &spec_url), &["etendo_api"]);
    config.etendo.server_url = Some("http://internal:8080/etendo".to_string());
    let tools = tool_system(&config, None).await;

    let response = tools
        .invoke("etendo_api", &json!({"tag": "y"}), &RequestContext::with_token("tok"))
        .await;

    let ToolResponse::Message(message) = response else {
        panic!("expected a message envelope");
    };
    // The listing reports the host, not the server written into the spec
    assert_eq!(message["url"], HOST);
    assert_eq!(message["endpoints"], json!([{"path": "POST /b", "description": "Create B"}]));
}

#[tokio::test]
async fn test_spec_download_failure_is_an_error_envelope() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let spec_url = format!("{}/doc/openapi.json", mock_server.uri());
    let config = with_tools(test_config(HOST, &spec_url), &["etendo_api"]);
    let tools = tool_system(&config, None).await;

    let response = tools
        .invoke("etendo_api", &json!({}), &RequestContext::with_token("tok"))
        .await;

    match response {
        ToolResponse::Error(message) => assert!(message.contains("HTTP 500")),
        other => panic!("expected error envelope, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_string_parameters_are_rejected() {
    let spec = write_temp(&sample_spec().to_string());
    let config = with_tools(test_config(HOST, spec.path().to_str().unwrap()), &["etendo_api"]);
    let tools = tool_system(&config, None).await;

    let response = tools
        .invoke("etendo_api", &json!({"tag": 5}), &RequestContext::with_token("tok"))
        .await;

    assert!(response.is_error());
}
