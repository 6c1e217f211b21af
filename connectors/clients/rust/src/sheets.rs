// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Sheet ingestion and sheet records within a project.

use std::fmt;

use reqwest::multipart::Form;
use serde::Deserialize;
use tracing::info;

use crate::client::{require_id, StruAiClient};
use crate::error::Result;
use crate::jobs::{Ingestion, Job};
use crate::types::{SheetAnnotations, SheetDeleteResult, SheetDetail, SheetIngestResponse, SheetSummary};
use crate::upload::{plan_upload, PageSelector, Upload};

/// What the server does when a page has already been ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnSheetExists {
    Error,
    Skip,
    Rebuild,
}

impl OnSheetExists {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Skip => "skip",
            Self::Rebuild => "rebuild",
        }
    }
}

impl fmt::Display for OnSheetExists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How derived project indexes are refreshed after ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexUpdateMode {
    Incremental,
    Rebuild,
}

impl IndexUpdateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Rebuild => "rebuild",
        }
    }
}

impl fmt::Display for IndexUpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for [`Sheets::add`].
///
/// ```rust
/// use struai_client::sheets::{OnSheetExists, SheetIngestRequest};
/// use struai_client::upload::Upload;
///
/// let request = SheetIngestRequest::new("1,3,5-7")
///     .file(Upload::path("structural.pdf"))
///     .on_sheet_exists(OnSheetExists::Skip);
/// assert!(request.file_hash.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SheetIngestRequest {
    pub page: PageSelector,
    pub file: Option<Upload>,
    pub file_hash: Option<String>,
    pub source_description: Option<String>,
    pub on_sheet_exists: Option<OnSheetExists>,
    pub community_update_mode: Option<IndexUpdateMode>,
    pub semantic_index_update_mode: Option<IndexUpdateMode>,
}

impl SheetIngestRequest {
    pub fn new(page: impl Into<PageSelector>) -> Self {
        Self {
            page: page.into(),
            ..Self::default()
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

    pub fn source_description(mut self, description: impl Into<String>) -> Self {
        self.source_description = Some(description.into());
        self
    }

    pub fn on_sheet_exists(mut self, mode: OnSheetExists) -> Self {
        self.on_sheet_exists = Some(mode);
        self
    }

    pub fn community_update_mode(mut self, mode: IndexUpdateMode) -> Self {
        self.community_update_mode = Some(mode);
        self
    }

    pub fn semantic_index_update_mode(mut self, mode: IndexUpdateMode) -> Self {
        self.semantic_index_update_mode = Some(mode);
        self
    }

    /// Text fields of the multipart body, excluding the document itself.
    fn form_fields(&self) -> Result<Vec<(&'static str, String)>> {
        let mut fields = vec![("page", self.page.to_form_value()?)];
        if let Some(description) = &self.source_description {
            fields.push(("source_description", description.clone()));
        }
        if let Some(mode) = self.on_sheet_exists {
            fields.push(("on_sheet_exists", mode.to_string()));
        }
        if let Some(mode) = self.community_update_mode {
            fields.push(("community_update_mode", mode.to_string()));
        }
        if let Some(mode) = self.semantic_index_update_mode {
            fields.push(("semantic_index_update_mode", mode.to_string()));
        }
        Ok(fields)
    }
}

#[derive(Deserialize)]
struct SheetList {
    #[serde(default)]
    sheets: Vec<SheetSummary>,
}

/// Sheets of one project.
#[derive(Debug, Clone, Copy)]
pub struct Sheets<'a> {
    client: &'a StruAiClient,
    project_id: &'a str,
}

impl<'a> Sheets<'a> {
    pub(crate) fn new(client: &'a StruAiClient, project_id: &'a str) -> Self {
        Self { client, project_id }
    }

    /// Queue ingestion jobs for the selected page(s).
    ///
    /// All local validation (exactly one of file / hash, non-blank page
    /// selector) happens before the cache probe or the upload.
    pub async fn add(&self, request: SheetIngestRequest) -> Result<Ingestion> {
        let fields = request.form_fields()?;
        let plan = plan_upload(self.client, request.file, request.file_hash).await?;

        let form = fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));
        let form = plan.apply(form)?;

        let url = self.client.endpoint(&["projects", self.project_id, "sheets"])?;
        let response: SheetIngestResponse = self.client.post_form(url, form).await?;

        let jobs: Vec<Job> = response
            .jobs
            .into_iter()
            .map(|d| Job::new(self.client.clone(), self.project_id, d.job_id, d.page))
            .collect();
        info!(
            project_id = %self.project_id,
            page = %request.page,
            jobs = jobs.len(),
            "Sheet ingestion queued"
        );
        Ok(Ingestion::from_jobs(jobs))
    }

    pub async fn list(&self, limit: Option<u32>) -> Result<Vec<SheetSummary>> {
        let url = self.client.endpoint(&["projects", self.project_id, "sheets"])?;
        let query: Vec<(&str, String)> = limit.map(|l| ("limit", l.to_string())).into_iter().collect();
        let list: SheetList = self.client.get(url, &query).await?;
        Ok(list.sheets)
    }

    pub async fn get(&self, sheet_id: &str) -> Result<SheetDetail> {
        let sheet_id = require_id("sheet_id", sheet_id)?;
        let url = self
            .client
            .endpoint(&["projects", self.project_id, "sheets", sheet_id])?;
        self.client.get(url, &[]).await
    }

    /// Raw annotations stored for one sheet.
    pub async fn annotations(&self, sheet_id: &str) -> Result<SheetAnnotations> {
        let sheet_id = require_id("sheet_id", sheet_id)?;
        let url = self.client.endpoint(&[
            "projects",
            self.project_id,
            "sheets",
            sheet_id,
            "annotations",
        ])?;
        self.client.get(url, &[]).await
    }

    /// Delete a sheet and its derived entities. `None` on a bodyless 204.
    pub async fn delete(&self, sheet_id: &str) -> Result<Option<SheetDeleteResult>> {
        let sheet_id = require_id("sheet_id", sheet_id)?;
        let url = self
            .client
            .endpoint(&["projects", self.project_id, "sheets", sheet_id])?;
        let result: Option<SheetDeleteResult> = self.client.delete(url).await?;
        info!(project_id = %self.project_id, sheet_id = %sheet_id, "Sheet deleted");
        Ok(result)
    }
}
