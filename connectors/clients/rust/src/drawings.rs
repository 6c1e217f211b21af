// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Tier 1 drawing detection.
//!
//! Analyses one page of a PDF and returns the detected annotations (leaders,
//! section and detail tags, revision markers) plus the title block. Uploads go
//! through the cache probe in [`crate::upload`].

use reqwest::multipart::Form;
use tracing::{info, warn};

use crate::client::{require_id, StruAiClient};
use crate::error::Result;
use crate::types::{DrawingCacheStatus, DrawingDeleteResult, DrawingResult};
use crate::upload::{plan_upload, Upload};

/// Parameters for [`Drawings::analyze`].
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    /// 1-indexed page number.
    pub page: u32,
    pub file: Option<Upload>,
    pub file_hash: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(page: u32) -> Self {
        Self {
            page,
            file: None,
            file_hash: None,
        }
    }

    pub fn file(mut self, file: Upload) -> Self {
        self.file = Some(file);
        self
    }

    pub fn file_hash(mut self, file_hash: impl Into<String>) -> Self {
        self.file_hash = Some(file_hash.into());
        self
    }
}

/// Tier 1 drawings API.
#[derive(Debug, Clone, Copy)]
pub struct Drawings<'a> {
    client: &'a StruAiClient,
}

impl<'a> Drawings<'a> {
    pub(crate) fn new(client: &'a StruAiClient) -> Self {
        Self { client }
    }

    /// Analyse one page via `POST /drawings`.
    ///
    /// # Errors
    ///
    /// Returns [`StruAiError::Validation`](crate::error::StruAiError::Validation)
    /// before any request if neither or both of `file` / `file_hash` are set.
    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<DrawingResult> {
        let plan = plan_upload(self.client, request.file, request.file_hash).await?;
        let hash_only = plan.is_hash_only();
        let form = plan.apply(Form::new().text("page", request.page.to_string()))?;

        let url = self.client.endpoint(&["drawings"])?;
        let result: DrawingResult = self.client.post_form(url, form).await?;
        info!(
            drawing_id = %result.id,
            page = result.page,
            hash_only,
            processing_ms = result.processing_ms,
            "Drawing analysed"
        );
        Ok(result)
    }

    /// Check the PDF cache status for a content hash.
    pub async fn check_cache(&self, file_hash: &str) -> Result<DrawingCacheStatus> {
        let file_hash = require_id("file_hash", file_hash)?;
        let url = self.client.endpoint(&["drawings", "cache", file_hash])?;
        self.client.get(url, &[]).await
    }

    /// Best-effort cache probe: any failure counts as "not cached".
    pub(crate) async fn is_cached(&self, file_hash: &str) -> bool {
        match self.check_cache(file_hash).await {
            Ok(status) => status.cached,
            Err(err) if err.is_not_found() => false,
            Err(err) => {
                warn!(file_hash = %file_hash, error = %err, "Cache probe failed, uploading file");
                false
            }
        }
    }

    /// Retrieve a drawing result by id.
    pub async fn get(&self, drawing_id: &str) -> Result<DrawingResult> {
        let drawing_id = require_id("drawing_id", drawing_id)?;
        let url = self.client.endpoint(&["drawings", drawing_id])?;
        self.client.get(url, &[]).await
    }

    /// Delete a drawing result by id.
    ///
    /// Returns `None` when the server answers 204 without a body.
    pub async fn delete(&self, drawing_id: &str) -> Result<Option<DrawingDeleteResult>> {
        let drawing_id = require_id("drawing_id", drawing_id)?;
        let url = self.client.endpoint(&["drawings", drawing_id])?;
        self.client.delete(url).await
    }

    /// Compute the server-compatible hash for `file` without contacting the API.
    pub async fn compute_file_hash(&self, file: &Upload) -> Result<String> {
        file.content_hash().await
    }
}
