// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! # StruAI Client SDK
//!
//! A Rust client library for the StruAI drawing-analysis API: Tier 1 single-page
//! detection, Tier 2 projects with asynchronous sheet ingestion, project search,
//! and DocQuery graph traversal with client-side consistency reports.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use struai_client::client::StruAiClient;
//! use struai_client::jobs::WaitOptions;
//! use struai_client::sheets::SheetIngestRequest;
//! use struai_client::upload::Upload;
//!
//! #[tokio::main]
//! async fn main() -> struai_client::error::Result<()> {
//!     let client = StruAiClient::from_env()?;
//!     let project = client.projects().create("Tower A", None).await?;
//!
//!     let ingestion = project
//!         .sheets()
//!         .add(SheetIngestRequest::new(12).file(Upload::path("structural.pdf")))
//!         .await?;
//!     for outcome in ingestion.wait_all(WaitOptions::default()).await {
//!         let sheet = outcome?;
//!         println!("{:?}: {} entities", sheet.sheet_id, sheet.entities_created);
//!     }
//!
//!     let report = project.docquery().sheet_list().await?;
//!     println!("{} sheet nodes", report.totals.sheet_node_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`client`] — Client construction, authentication, and HTTP transport.
//! - [`config`] — Client configuration and `STRUAI_*` environment lookup.
//! - [`types`] — Response records for drawings, projects, sheets, jobs, and entities.
//! - [`upload`] — File hashing, cache-aware upload planning, and page selectors.
//! - [`drawings`] — Tier 1 drawing detection.
//! - [`projects`] — Projects and the per-project handle.
//! - [`sheets`] — Sheet ingestion and sheet records.
//! - [`jobs`] — Ingestion job polling, singly or in batches.
//! - [`entities`] — Entity and relationship listings.
//! - [`search`] — Project-level semantic search.
//! - [`docquery`] — Graph traversal, custom queries, crops, and sheet reports.
//! - [`error`] — Error types and the crate-level `Result` alias.
//!
//! Logging goes through `tracing`; install a subscriber in the application to
//! see it.

pub mod client;
pub mod config;
pub mod types;
pub mod upload;
pub mod drawings;
pub mod projects;
pub mod sheets;
pub mod jobs;
pub mod entities;
pub mod search;
pub mod docquery;
pub mod error;

pub use client::StruAiClient;
pub use config::ClientConfig;
pub use error::{ApiErrorKind, Result, StruAiError};
