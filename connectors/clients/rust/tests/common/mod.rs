// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};
use struai_client::projects::ProjectHandle;
use struai_client::{ClientConfig, StruAiClient};
use wiremock::MockServer;

pub const API_KEY: &str = "sk-test";
pub const PROJECT_ID: &str = "proj";

/// Client pointed at the mock server's `/v1` prefix.
pub fn client_for(server: &MockServer) -> StruAiClient {
    let config = ClientConfig::new(API_KEY)
        .with_base_url(format!("{}/v1", server.uri()))
        .with_timeout(Duration::from_secs(5));
    StruAiClient::new(config).expect("valid test config")
}

/// Mock server plus a handle for the `proj` project (no network call).
pub async fn project_fixture() -> (MockServer, ProjectHandle) {
    let server = MockServer::start().await;
    let project = client_for(&server)
        .projects()
        .open(PROJECT_ID, Some("Fixture"))
        .expect("valid project id");
    (server, project)
}

/// Path under the fixture project.
pub fn project_path(suffix: &str) -> String {
    format!("/v1/projects/{PROJECT_ID}/{suffix}")
}

/// Server envelope for a graph query.
pub fn cypher_payload(records: Value) -> Value {
    let count = records.as_array().map_or(0, Vec::len);
    json!({
        "ok": true,
        "command": "cypher",
        "input": {},
        "records": records,
        "record_count": count,
        "truncated": false,
        "summary": {"database": "neo4j", "query_type": "r"}
    })
}

/// Job status payload.
pub fn job_status(job_id: &str, status: &str) -> Value {
    json!({"job_id": job_id, "status": status})
}

/// Completed job status payload with a sheet result.
pub fn job_complete(job_id: &str, sheet_id: &str) -> Value {
    json!({
        "job_id": job_id,
        "status": "complete",
        "result": {"sheet_id": sheet_id, "entities_created": 10, "relationships_created": 20},
        "status_log": []
    })
}

/// Body of the `n`th request the server received, as text.
pub async fn request_body(server: &MockServer, n: usize) -> String {
    let requests = server.received_requests().await.expect("recording enabled");
    String::from_utf8_lossy(&requests[n].body).into_owned()
}

/// Number of requests the server received.
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map_or(0, |requests| requests.len())
}
