// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Core data types for the StruAI client SDK.
//!
//! These types mirror the StruAI REST payloads for Tier 1 drawing detection and
//! Tier 2 projects, sheets, jobs, and entities. Response records keep any field
//! the SDK does not model in an `extra` map so newer server fields survive a
//! round trip instead of being dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-ended map of response fields not modelled explicitly.
pub type Extra = Map<String, Value>;

/// A point in page coordinates.
pub type Point = (f64, f64);

/// Bounding box as `[x0, y0, x1, y1]` in page coordinates.
pub type BBox = [f64; 4];

// ---------------------------------------------------------------------------
// Geometry primitives
// ---------------------------------------------------------------------------

/// Text detected inside an annotation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextSpan {
    /// Span identifier (the server uses both integers and strings).
    #[serde(default)]
    pub id: Option<Value>,
    /// Recognised text.
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Page dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

/// Circle geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

/// Line segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

// ---------------------------------------------------------------------------
// Tier 1: drawings
// ---------------------------------------------------------------------------

/// Leader annotation: an arrow pointing from a text box to a drawing feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leader {
    pub id: String,
    pub bbox: BBox,
    pub arrow_tip: Point,
    pub text_bbox: BBox,
    #[serde(default)]
    pub texts_inside: Vec<TextSpan>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Section cut tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionTag {
    pub id: String,
    pub bbox: BBox,
    pub circle: Circle,
    /// One of `left`, `right`, `up`, `down`.
    pub direction: String,
    #[serde(default)]
    pub texts_inside: Vec<TextSpan>,
    #[serde(default)]
    pub section_line: Option<Line>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Detail callout tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailTag {
    pub id: String,
    pub bbox: BBox,
    pub circle: Circle,
    #[serde(default)]
    pub texts_inside: Vec<TextSpan>,
    #[serde(default)]
    pub has_dashed_bbox: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Revision marker triangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionTriangle {
    pub id: String,
    pub bbox: BBox,
    #[serde(default)]
    pub vertices: Vec<Point>,
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Revision cloud boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionCloud {
    pub id: String,
    pub bbox: BBox,
    #[serde(flatten)]
    pub extra: Extra,
}

/// All annotations detected on a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub leaders: Vec<Leader>,
    #[serde(default)]
    pub section_tags: Vec<SectionTag>,
    #[serde(default)]
    pub detail_tags: Vec<DetailTag>,
    #[serde(default)]
    pub revision_triangles: Vec<RevisionTriangle>,
    #[serde(default)]
    pub revision_clouds: Vec<RevisionCloud>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Title block location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TitleBlock {
    pub bounds: BBox,
    /// Drawing area excluding the title block.
    pub viewport: BBox,
}

/// Result of Tier 1 detection on one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawingResult {
    pub id: String,
    pub page: u32,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub processing_ms: u64,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub titleblock: Option<TitleBlock>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Server-side PDF cache status for a content hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrawingCacheStatus {
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub file_hash: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Response to deleting a drawing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrawingDeleteResult {
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ---------------------------------------------------------------------------
// Tier 2: projects and sheets
// ---------------------------------------------------------------------------

/// A project: the container sheets are ingested into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sheets_count: u64,
    #[serde(default)]
    pub entities_count: u64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Response to deleting a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDeleteResult {
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, alias = "project_id")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Sheet row returned by the sheet listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSummary {
    #[serde(alias = "sheet_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub entities_count: u64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Full sheet record, including derived regions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetDetail {
    #[serde(alias = "sheet_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub entities_count: u64,
    #[serde(default)]
    pub regions: Vec<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Raw annotations stored for one sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetAnnotations {
    #[serde(default)]
    pub sheet_id: Option<String>,
    #[serde(default)]
    pub annotations: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Cleanup statistics from deleting a sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetDeleteResult {
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub sheet_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One job created by a sheet ingestion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub job_id: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Response to `POST /projects/{id}/sheets`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetIngestResponse {
    #[serde(default)]
    pub jobs: Vec<JobDescriptor>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Lifecycle state of an ingestion job.
///
/// `queued → running → complete` or `queued → running → failed`. States the
/// SDK does not know are reported as [`JobState::Unknown`] and treated as
/// still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    #[serde(alias = "processing", alias = "pending")]
    Running,
    #[serde(alias = "completed")]
    Complete,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// Whether the job can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// State of one pipeline step inside a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Running,
    Complete,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Status of a single pipeline step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStep {
    pub status: StepState,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub tokens: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Per-step pipeline status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSteps {
    #[serde(default)]
    pub detection: Option<JobStep>,
    #[serde(default)]
    pub enrichment: Option<JobStep>,
    #[serde(default)]
    pub synthesis: Option<JobStep>,
    #[serde(default)]
    pub graph: Option<JobStep>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Result of a completed sheet ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetResult {
    #[serde(default)]
    pub sheet_id: Option<String>,
    #[serde(default)]
    pub entities_created: u64,
    #[serde(default)]
    pub relationships_created: u64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Snapshot of a job returned by `GET /projects/{id}/jobs/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub status: JobState,
    #[serde(default)]
    pub steps: Option<JobSteps>,
    #[serde(default)]
    pub result: Option<SheetResult>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl JobStatus {
    pub fn is_complete(&self) -> bool {
        self.status == JobState::Complete
    }

    pub fn is_failed(&self) -> bool {
        self.status == JobState::Failed
    }
}

// ---------------------------------------------------------------------------
// Entities and relationships
// ---------------------------------------------------------------------------

/// Where an entity appears.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityLocation {
    pub sheet_id: String,
    #[serde(default)]
    pub sheet_title: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub bbox: Option<BBox>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A relationship between two entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    #[serde(default)]
    pub fact: Option<String>,
    #[serde(default, alias = "type")]
    pub edge_type: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub source_label: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub target_label: Option<String>,
    #[serde(default)]
    pub sheet_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Entity row returned by the entity listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityListItem {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sheet_id: Option<String>,
    #[serde(default)]
    pub bbox: Option<BBox>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Full entity with its relation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sheet_id: Option<String>,
    #[serde(default, alias = "outgoing_facts")]
    pub outgoing: Vec<Fact>,
    #[serde(default, alias = "incoming_facts")]
    pub incoming: Vec<Fact>,
    #[serde(default)]
    pub locations: Vec<EntityLocation>,
    #[serde(flatten)]
    pub extra: Extra,
}
