// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Sheet ingestion and job polling.

mod common;

use std::time::{Duration, Instant};

use serde_json::json;
use struai_client::jobs::{Ingestion, WaitOptions};
use struai_client::sheets::{OnSheetExists, SheetIngestRequest};
use struai_client::StruAiError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{job_complete, job_status, project_fixture, project_path, request_body};

fn fast() -> WaitOptions {
    WaitOptions::new(Duration::from_secs(5), Duration::from_millis(10))
}

async fn mount_ingest(server: &MockServer, jobs: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(project_path("sheets")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobs": jobs })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, job_id: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(project_path(&format!("jobs/{job_id}"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn single_job_response_yields_single_handle() {
    let (server, project) = project_fixture().await;
    mount_ingest(&server, json!([{"job_id": "job_single", "page": 1}])).await;

    let ingestion = project
        .sheets()
        .add(
            SheetIngestRequest::new(1)
                .file_hash("abc123")
                .on_sheet_exists(OnSheetExists::Skip),
        )
        .await
        .unwrap();

    match &ingestion {
        Ingestion::Single(job) => {
            assert_eq!(job.id(), "job_single");
            assert_eq!(job.page(), Some(1));
            assert_eq!(job.project_id(), "proj");
        }
        Ingestion::Batch(_) => panic!("expected a single job"),
    }
    assert!(!ingestion.is_batch());

    let body = request_body(&server, 0).await;
    assert!(body.contains("name=\"on_sheet_exists\""));
    assert!(body.contains("skip"));
    assert!(body.contains("abc123"));
}

#[tokio::test]
async fn batch_ids_keep_server_order() {
    let (server, project) = project_fixture().await;
    mount_ingest(
        &server,
        json!([
            {"job_id": "job_c", "page": 3},
            {"job_id": "job_a", "page": 1},
            {"job_id": "job_b", "page": 2}
        ]),
    )
    .await;

    let ingestion = project
        .sheets()
        .add(SheetIngestRequest::new("1-3").file_hash("abc123"))
        .await
        .unwrap();

    let Ingestion::Batch(batch) = &ingestion else {
        panic!("expected a batch");
    };
    assert_eq!(batch.ids(), vec!["job_c", "job_a", "job_b"]);
    assert_eq!(ingestion.ids(), batch.ids());
    assert_eq!(batch.len(), 3);
}

#[tokio::test]
async fn complete_job_returns_without_sleeping() {
    let (server, project) = project_fixture().await;
    mount_ingest(&server, json!([{"job_id": "job_1", "page": 1}])).await;
    Mock::given(method("GET"))
        .and(path(project_path("jobs/job_1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_complete("job_1", "S111")))
        .expect(1)
        .mount(&server)
        .await;

    let ingestion = project
        .sheets()
        .add(SheetIngestRequest::new(1).file_hash("abc123"))
        .await
        .unwrap();
    let Ingestion::Single(job) = ingestion else {
        panic!("expected a single job");
    };

    let started = Instant::now();
    let result = job
        .wait(WaitOptions::new(Duration::from_secs(30), Duration::from_secs(10)))
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(result.sheet_id.as_deref(), Some("S111"));
    assert_eq!(result.entities_created, 10);
    assert_eq!(result.relationships_created, 20);
}

#[tokio::test]
async fn failed_job_errors_after_one_poll() {
    let (server, project) = project_fixture().await;
    mount_ingest(&server, json!([{"job_id": "job_bad", "page": 4}])).await;
    Mock::given(method("GET"))
        .and(path(project_path("jobs/job_bad")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "job_bad",
            "status": "failed",
            "error": "PDF page is blank"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ingestion = project
        .sheets()
        .add(SheetIngestRequest::new(4).file_hash("abc123"))
        .await
        .unwrap();
    let outcomes = ingestion.wait_all(fast()).await;
    assert_eq!(outcomes.len(), 1);
    match &outcomes[0] {
        Err(StruAiError::JobFailed { job_id, message }) => {
            assert_eq!(job_id, "job_bad");
            assert_eq!(message, "PDF page is blank");
        }
        other => panic!("expected job failure, got {other:?}"),
    }
}

#[tokio::test]
async fn failure_without_message_uses_placeholder() {
    let (server, project) = project_fixture().await;
    mount_ingest(&server, json!([{"job_id": "job_x"}])).await;
    mount_status(&server, "job_x", job_status("job_x", "failed")).await;

    let ingestion = project
        .sheets()
        .add(SheetIngestRequest::new(1).file_hash("abc123"))
        .await
        .unwrap();
    let Ingestion::Single(job) = ingestion else {
        panic!("expected a single job");
    };
    let err = job.wait(fast()).await.unwrap_err();
    assert_eq!(err.to_string(), "Job job_x failed: Unknown error");
}

#[tokio::test]
async fn polls_until_complete() {
    let (server, project) = project_fixture().await;
    mount_ingest(&server, json!([{"job_id": "job_1", "page": 1}])).await;
    Mock::given(method("GET"))
        .and(path(project_path("jobs/job_1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_status("job_1", "running")))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(project_path("jobs/job_1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_complete("job_1", "S200")))
        .expect(1)
        .mount(&server)
        .await;

    let ingestion = project
        .sheets()
        .add(SheetIngestRequest::new(1).file_hash("abc123"))
        .await
        .unwrap();
    let Ingestion::Single(job) = ingestion else {
        panic!("expected a single job");
    };
    let result = job.wait(fast()).await.unwrap();
    assert_eq!(result.sheet_id.as_deref(), Some("S200"));
}

#[tokio::test]
async fn wait_times_out_no_earlier_than_limit() {
    let (server, project) = project_fixture().await;
    mount_ingest(&server, json!([{"job_id": "job_slow", "page": 1}])).await;
    mount_status(&server, "job_slow", job_status("job_slow", "queued")).await;

    let ingestion = project
        .sheets()
        .add(SheetIngestRequest::new(1).file_hash("abc123"))
        .await
        .unwrap();
    let Ingestion::Single(job) = ingestion else {
        panic!("expected a single job");
    };

    let limit = Duration::from_millis(150);
    let started = Instant::now();
    let err = job
        .wait(WaitOptions::new(limit, Duration::from_millis(20)))
        .await
        .unwrap_err();
    assert!(started.elapsed() >= limit);
    match err {
        StruAiError::JobTimeout { job_id, timeout } => {
            assert_eq!(job_id, "job_slow");
            assert_eq!(timeout, limit);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn wait_never_sleeps_past_the_deadline() {
    let (server, project) = project_fixture().await;
    mount_ingest(&server, json!([{"job_id": "job_slow", "page": 1}])).await;
    mount_status(&server, "job_slow", job_status("job_slow", "running")).await;

    let ingestion = project
        .sheets()
        .add(SheetIngestRequest::new(1).file_hash("abc123"))
        .await
        .unwrap();
    let Ingestion::Single(job) = ingestion else {
        panic!("expected a single job");
    };

    let limit = Duration::from_millis(150);
    let started = Instant::now();
    let err = job
        .wait(WaitOptions::new(limit, Duration::from_secs(30)))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();
    assert!(matches!(err, StruAiError::JobTimeout { .. }), "got {err:?}");
    assert!(elapsed >= limit);
    assert!(elapsed < Duration::from_secs(5), "overshot deadline: {elapsed:?}");
}

#[tokio::test]
async fn batch_members_are_polled_concurrently() {
    let (server, project) = project_fixture().await;
    mount_ingest(
        &server,
        json!([
            {"job_id": "job_1", "page": 1},
            {"job_id": "job_2", "page": 2},
            {"job_id": "job_3", "page": 3}
        ]),
    )
    .await;
    for (job_id, sheet_id) in [("job_1", "S101"), ("job_2", "S102"), ("job_3", "S103")] {
        Mock::given(method("GET"))
            .and(path(project_path(&format!("jobs/{job_id}"))))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(job_complete(job_id, sheet_id))
                    .set_delay(Duration::from_millis(400)),
            )
            .mount(&server)
            .await;
    }

    let ingestion = project
        .sheets()
        .add(SheetIngestRequest::new("1-3").file_hash("abc123"))
        .await
        .unwrap();
    let Ingestion::Batch(batch) = &ingestion else {
        panic!("expected a batch");
    };

    let started = Instant::now();
    let statuses = batch.status_all().await;
    assert!(statuses.iter().all(|s| s.as_ref().unwrap().is_complete()));
    assert!(started.elapsed() < Duration::from_millis(1000));

    let started = Instant::now();
    let outcomes = batch.wait_all(fast()).await;
    let elapsed = started.elapsed();
    let sheets: Vec<_> = outcomes
        .iter()
        .map(|o| o.as_ref().unwrap().sheet_id.clone().unwrap())
        .collect();
    assert_eq!(sheets, vec!["S101", "S102", "S103"]);
    assert!(elapsed < Duration::from_millis(1000), "polled sequentially: {elapsed:?}");
}

#[tokio::test]
async fn batch_wait_reports_each_job() {
    let (server, project) = project_fixture().await;
    mount_ingest(
        &server,
        json!([
            {"job_id": "job_ok", "page": 1},
            {"job_id": "job_bad", "page": 2},
            {"job_id": "job_ok2", "page": 3}
        ]),
    )
    .await;
    mount_status(&server, "job_ok", job_complete("job_ok", "S101")).await;
    mount_status(
        &server,
        "job_bad",
        json!({"job_id": "job_bad", "status": "failed", "error": "OCR crashed"}),
    )
    .await;
    mount_status(&server, "job_ok2", job_complete("job_ok2", "S103")).await;

    let ingestion = project
        .sheets()
        .add(SheetIngestRequest::new("all").file_hash("abc123"))
        .await
        .unwrap();
    let Ingestion::Batch(batch) = &ingestion else {
        panic!("expected a batch");
    };

    let statuses = batch.status_all().await;
    assert!(statuses[0].as_ref().unwrap().is_complete());
    assert!(statuses[1].as_ref().unwrap().is_failed());

    let outcomes = batch.wait_all(fast()).await;
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].as_ref().unwrap().sheet_id.as_deref(), Some("S101"));
    assert!(matches!(outcomes[1], Err(StruAiError::JobFailed { .. })));
    assert_eq!(outcomes[2].as_ref().unwrap().sheet_id.as_deref(), Some("S103"));
}

#[tokio::test]
async fn ingestion_validates_before_any_request() {
    let (server, project) = project_fixture().await;

    let err = project
        .sheets()
        .add(SheetIngestRequest::new("  ").file_hash("abc123"))
        .await
        .unwrap_err();
    assert!(matches!(err, StruAiError::Validation(_)));

    let err = project
        .sheets()
        .add(SheetIngestRequest::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, StruAiError::Validation(_)));

    assert_eq!(common::request_count(&server).await, 0);
}
