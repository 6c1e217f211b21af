// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Transport behaviour: auth headers, error mapping, empty bodies, timeouts.

mod common;

use std::time::Duration;

use serde_json::json;
use struai_client::{ApiErrorKind, ClientConfig, StruAiClient, StruAiError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{client_for, project_path};

#[tokio::test]
async fn sends_bearer_token_and_parses_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("accept", "application/json"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projects": [
                {"id": "proj_1", "name": "Tower A", "sheets_count": 12},
                {"id": "proj_2", "name": "Podium", "description": "Levels B1-2"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let projects = client_for(&server).projects().list(Some(5)).await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].sheets_count, 12);
    assert_eq!(projects[1].description.as_deref(), Some("Levels B1-2"));
}

#[tokio::test]
async fn api_error_carries_status_code_and_request_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("x-request-id", "req_42")
                .set_body_json(json!({
                    "error": {"message": "Project not found", "code": "project_not_found"}
                })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .projects()
        .get("missing")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    match err {
        StruAiError::Api {
            status,
            code,
            message,
            request_id,
            retry_after,
        } => {
            assert_eq!(status, 404);
            assert_eq!(code.as_deref(), Some("project_not_found"));
            assert_eq!(message, "Project not found");
            assert_eq!(request_id.as_deref(), Some("req_42"));
            assert_eq!(retry_after, None);
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_exposes_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_string("slow down"),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).projects().list(None).await.unwrap_err();
    assert_eq!(err.api_kind(), Some(ApiErrorKind::RateLimit));
    assert!(matches!(
        err,
        StruAiError::Api { retry_after: Some(7), ref message, .. } if message == "slow down"
    ));
}

#[tokio::test]
async fn no_content_delete_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(project_path("sheets/S111")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let project = client_for(&server).projects().open("proj", None).unwrap();
    let deleted = project.sheets().delete("S111").await.unwrap();
    assert!(deleted.is_none());
}

#[tokio::test]
async fn delete_with_body_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/projects/proj_9"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"deleted": true, "project_id": "proj_9"})),
        )
        .mount(&server)
        .await;

    let deleted = client_for(&server)
        .projects()
        .delete("proj_9")
        .await
        .unwrap()
        .unwrap();
    assert!(deleted.deleted);
    assert_eq!(deleted.id.as_deref(), Some("proj_9"));
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"projects\": ["))
        .mount(&server)
        .await;

    let err = client_for(&server).projects().list(None).await.unwrap_err();
    assert!(matches!(err, StruAiError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"projects": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = ClientConfig::new("sk-test")
        .with_base_url(format!("{}/v1", server.uri()))
        .with_timeout(Duration::from_millis(200));
    let client = StruAiClient::new(config).unwrap();

    let err = client.projects().list(None).await.unwrap_err();
    assert!(matches!(err, StruAiError::Timeout(_)), "got {err:?}");
    assert!(err.is_transport());
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let client = StruAiClient::new(ClientConfig::new("sk-test").with_base_url("http://127.0.0.1:1/v1"))
        .unwrap();
    let err = client.projects().list(None).await.unwrap_err();
    assert!(matches!(err, StruAiError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn blank_identifiers_fail_before_any_request() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    assert!(matches!(
        client.projects().get("  ").await,
        Err(StruAiError::Validation(_))
    ));
    assert!(matches!(
        client.drawings().get("").await,
        Err(StruAiError::Validation(_))
    ));
    assert_eq!(common::request_count(&server).await, 0);
}
