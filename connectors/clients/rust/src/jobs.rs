// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Handles for asynchronous sheet-ingestion jobs.
//!
//! Ingesting a sheet queues one server-side job per page. A [`Job`] polls a
//! single job; a [`JobBatch`] fans out over the jobs of a multi-page request
//! and reports one outcome per job, in request order, so a failed page never
//! hides the pages that succeeded.
//!
//! Polling is a fixed-interval loop against a monotonic clock. There is no
//! backoff and no retry: a transport error while polling ends the wait.

use std::time::Duration;

use futures::future::join_all;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::client::StruAiClient;
use crate::error::{Result, StruAiError};
use crate::types::{JobState, JobStatus, SheetResult};

/// Default upper bound for [`Job::wait`].
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(120_000);

/// Default delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2_000);

/// Timing for [`Job::wait`] and [`JobBatch::wait_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Give up once this much time has passed since the first poll.
    pub timeout: Duration,
    /// Fixed delay between polls.
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitOptions {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Handle for one sheet-ingestion job.
#[derive(Debug, Clone)]
pub struct Job {
    client: StruAiClient,
    project_id: String,
    job_id: String,
    page: Option<u32>,
}

impl Job {
    pub(crate) fn new(
        client: StruAiClient,
        project_id: impl Into<String>,
        job_id: impl Into<String>,
        page: Option<u32>,
    ) -> Self {
        Self {
            client,
            project_id: project_id.into(),
            job_id: job_id.into(),
            page,
        }
    }

    pub fn id(&self) -> &str {
        &self.job_id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Page this job ingests, when the server reported it.
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    /// Fetch the current status once, without waiting.
    pub async fn status(&self) -> Result<JobStatus> {
        let url = self
            .client
            .endpoint(&["projects", &self.project_id, "jobs", &self.job_id])?;
        self.client.get(url, &[]).await
    }

    /// Poll until the job completes, fails, or `options.timeout` elapses.
    ///
    /// # Errors
    ///
    /// * [`StruAiError::JobFailed`] as soon as the job reports `failed`.
    /// * [`StruAiError::JobTimeout`] once the timeout has elapsed with the job
    ///   still in flight.
    /// * Any transport or API error from a status poll.
    pub async fn wait(&self, options: WaitOptions) -> Result<SheetResult> {
        let started = Instant::now();
        let mut polls: u32 = 0;

        loop {
            let status = self.status().await?;
            polls += 1;

            match status.status {
                JobState::Complete => {
                    let result = status.result.unwrap_or_default();
                    info!(
                        job_id = %self.job_id,
                        sheet_id = ?result.sheet_id,
                        entities_created = result.entities_created,
                        polls,
                        "Job complete"
                    );
                    return Ok(result);
                }
                JobState::Failed => {
                    let message = status.error.unwrap_or_else(|| "Unknown error".to_string());
                    warn!(job_id = %self.job_id, error = %message, "Job failed");
                    return Err(StruAiError::JobFailed {
                        job_id: self.job_id.clone(),
                        message,
                    });
                }
                state => debug!(job_id = %self.job_id, ?state, polls, "Job in flight"),
            }

            if started.elapsed() >= options.timeout {
                return Err(StruAiError::JobTimeout {
                    job_id: self.job_id.clone(),
                    timeout: options.timeout,
                });
            }

            let remaining = options.timeout.saturating_sub(started.elapsed());
            sleep(options.poll_interval.min(remaining)).await;
        }
    }
}

// ---------------------------------------------------------------------------
// JobBatch
// ---------------------------------------------------------------------------

/// The jobs created by one multi-page ingestion request, in server order.
#[derive(Debug, Clone)]
pub struct JobBatch {
    jobs: Vec<Job>,
}

impl JobBatch {
    pub(crate) fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Job ids in the order the server returned them.
    pub fn ids(&self) -> Vec<String> {
        self.jobs.iter().map(|job| job.job_id.clone()).collect()
    }

    /// Poll every job once, concurrently. One result per job, in order.
    pub async fn status_all(&self) -> Vec<Result<JobStatus>> {
        join_all(self.jobs.iter().map(Job::status)).await
    }

    /// Wait for every job concurrently. One outcome per job, in order.
    ///
    /// `options.timeout` applies to each job independently.
    pub async fn wait_all(&self, options: WaitOptions) -> Vec<Result<SheetResult>> {
        let outcomes = join_all(self.jobs.iter().map(|job| job.wait(options))).await;
        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        if failed > 0 {
            warn!(jobs = outcomes.len(), failed, "Batch finished with failures");
        }
        outcomes
    }
}

impl IntoIterator for JobBatch {
    type Item = Job;
    type IntoIter = std::vec::IntoIter<Job>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// What a sheet ingestion request produced.
#[derive(Debug, Clone)]
pub enum Ingestion {
    /// The server queued exactly one job.
    Single(Job),
    /// The server queued any other number of jobs.
    Batch(JobBatch),
}

impl Ingestion {
    pub(crate) fn from_jobs(mut jobs: Vec<Job>) -> Self {
        if jobs.len() == 1 {
            if let Some(job) = jobs.pop() {
                return Self::Single(job);
            }
        }
        Self::Batch(JobBatch::new(jobs))
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }

    pub fn jobs(&self) -> &[Job] {
        match self {
            Self::Single(job) => std::slice::from_ref(job),
            Self::Batch(batch) => batch.jobs(),
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.jobs().iter().map(|job| job.id().to_string()).collect()
    }

    /// Wait for every job; a single job yields a one-element list.
    pub async fn wait_all(&self, options: WaitOptions) -> Vec<Result<SheetResult>> {
        match self {
            Self::Single(job) => vec![job.wait(options).await],
            Self::Batch(batch) => batch.wait_all(options).await,
        }
    }
}
