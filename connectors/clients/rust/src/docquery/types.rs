// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! DocQuery request and response types.
//!
//! Graph nodes and relationships are kept as raw JSON: their property sets
//! depend on the entity type and the SDK never interprets them beyond the
//! few keys the aggregations need (`uuid`, `sheet_id`, `target_sheet_id`,
//! `target_sheet_ids`).

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::aggregate::count_value;
use crate::types::{BBox, Extra};

// ---------------------------------------------------------------------------
// Query execution summary
// ---------------------------------------------------------------------------

/// Write counters reported by the graph database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryCounters {
    #[serde(default)]
    pub nodes_created: Option<u64>,
    #[serde(default)]
    pub nodes_deleted: Option<u64>,
    #[serde(default)]
    pub relationships_created: Option<u64>,
    #[serde(default)]
    pub relationships_deleted: Option<u64>,
    #[serde(default)]
    pub properties_set: Option<u64>,
    #[serde(default)]
    pub labels_added: Option<u64>,
    #[serde(default)]
    pub labels_removed: Option<u64>,
    #[serde(default)]
    pub indexes_added: Option<u64>,
    #[serde(default)]
    pub indexes_removed: Option<u64>,
    #[serde(default)]
    pub constraints_added: Option<u64>,
    #[serde(default)]
    pub constraints_removed: Option<u64>,
    #[serde(default)]
    pub system_updates: Option<u64>,
    #[serde(default)]
    pub contains_updates: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Execution summary attached to graph-query responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuerySummary {
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub query_type: Option<String>,
    #[serde(default)]
    pub result_available_after_ms: Option<u64>,
    #[serde(default)]
    pub result_consumed_after_ms: Option<u64>,
    #[serde(default)]
    pub counters: Option<QueryCounters>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ---------------------------------------------------------------------------
// Server envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeGetResult {
    pub ok: bool,
    pub command: String,
    #[serde(default)]
    pub input: Extra,
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub node: Option<Value>,
    #[serde(default)]
    pub summary: Option<QuerySummary>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetEntitiesResult {
    pub ok: bool,
    pub command: String,
    #[serde(default)]
    pub input: Extra,
    #[serde(default)]
    pub entities: Vec<Value>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub summary: Option<QuerySummary>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub node: Option<Value>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocSearchResult {
    pub ok: bool,
    pub command: String,
    #[serde(default)]
    pub input: Extra,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub summary: Option<QuerySummary>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neighbor {
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub relationship: Option<Value>,
    #[serde(default)]
    pub neighbor_node: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborsResult {
    pub ok: bool,
    pub command: String,
    #[serde(default)]
    pub input: Extra,
    #[serde(default)]
    pub neighbors: Vec<Neighbor>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub summary: Option<QuerySummary>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Rows returned by a graph query, one map per row keyed by column name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CypherResult {
    pub ok: bool,
    pub command: String,
    #[serde(default)]
    pub input: Extra,
    #[serde(default)]
    pub records: Vec<Extra>,
    #[serde(default)]
    pub record_count: u64,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub summary: Option<QuerySummary>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ---------------------------------------------------------------------------
// Neighbor search parameters
// ---------------------------------------------------------------------------

/// Which adjacency the neighbor search follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NeighborMode {
    /// Graph edges only.
    Graph,
    /// Nodes within `radius` on the same page.
    Spatial,
    #[default]
    Both,
}

impl NeighborMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Spatial => "spatial",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for NeighborMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge direction for graph neighbors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    #[default]
    Both,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for [`DocQuery::neighbors`](super::DocQuery::neighbors).
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborsRequest {
    pub uuid: String,
    pub mode: NeighborMode,
    pub direction: Direction,
    pub relationship_type: Option<String>,
    /// Spatial search radius in page units.
    pub radius: Option<f64>,
    pub limit: u32,
}

impl NeighborsRequest {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            mode: NeighborMode::Both,
            direction: Direction::Both,
            relationship_type: None,
            radius: Some(200.0),
            limit: 10,
        }
    }

    pub fn mode(mut self, mode: NeighborMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn relationship_type(mut self, relationship_type: impl Into<String>) -> Self {
        self.relationship_type = Some(relationship_type.into());
        self
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

// ---------------------------------------------------------------------------
// Crop
// ---------------------------------------------------------------------------

/// What a crop is centred on.
#[derive(Debug, Clone, PartialEq)]
pub enum CropTarget {
    /// The bounding box stored on a graph node.
    Node(String),
    /// An explicit `[x0, y0, x1, y1]` region in page coordinates.
    Region(BBox),
}

/// Parameters for [`DocQuery::crop`](super::DocQuery::crop).
#[derive(Debug, Clone, PartialEq)]
pub struct CropRequest {
    pub target: CropTarget,
    /// Page image to crop from; required by the server for region crops.
    pub page_hash: Option<String>,
}

impl CropRequest {
    pub fn node(uuid: impl Into<String>) -> Self {
        Self {
            target: CropTarget::Node(uuid.into()),
            page_hash: None,
        }
    }

    pub fn region(bbox: BBox) -> Self {
        Self {
            target: CropTarget::Region(bbox),
            page_hash: None,
        }
    }

    pub fn page_hash(mut self, page_hash: impl Into<String>) -> Self {
        self.page_hash = Some(page_hash.into());
        self
    }
}

/// Image bytes returned by the crop endpoint.
#[derive(Debug, Clone)]
pub struct CropImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Where a crop was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropResult {
    pub output_path: PathBuf,
    pub bytes_written: u64,
    pub content_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Aggregated reports
// ---------------------------------------------------------------------------

/// Consistency problem detected by a client-side aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MissingSheetNode,
    DuplicateSheetNodes,
    UnreachableEntities,
    InventoryWithoutSheetNode,
    SheetNodeWithoutInventory,
    EmptySheetNodes,
    SheetNodesMissingSheetId,
    EntitiesMissingSheetId,
    TargetSheetMismatch,
    TargetSheetNotDeclared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub details: Extra,
}

/// How much of a sheet's content hangs off its sheet node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reachability {
    pub has_sheet_node: bool,
    pub sheet_node_count: u64,
    pub non_sheet_total: u64,
    pub reachable_non_sheet: u64,
    /// `non_sheet_total - reachable_non_sheet`, floored at zero.
    pub unreachable_non_sheet: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSummaryReport {
    pub ok: bool,
    pub command: String,
    pub input: Extra,
    pub sheet_node: Option<Value>,
    pub node_label_counts: Vec<Extra>,
    pub relationship_counts: Vec<Extra>,
    pub reachability: Reachability,
    pub orphan_examples: Vec<Extra>,
    pub warnings: Vec<Warning>,
}

impl SheetSummaryReport {
    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

/// One sheet node as returned by the sheet listing query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetNodeRow {
    #[serde(default)]
    pub sheet_id: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Number of graph nodes carrying a given `sheet_id`, sheet node included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub sheet_id: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub entity_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSheetRow {
    pub sheet_id: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub node_count: u64,
}

/// Count column that may arrive as an integer, a float, or null.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(count_value(value.as_ref()))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetListTotals {
    pub sheet_node_count: u64,
    pub inventory_sheet_count: u64,
    pub entity_total: u64,
    pub missing_sheet_id_count: u64,
    pub duplicate_sheet_id_count: u64,
    pub sheet_node_missing_id_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetListReport {
    pub ok: bool,
    pub command: String,
    pub input: Extra,
    pub sheet_nodes: Vec<SheetNodeRow>,
    pub entity_sheet_inventory: Vec<InventoryRow>,
    pub totals: SheetListTotals,
    pub mismatch_warnings: Vec<Warning>,
}

/// A location a referenced target sits in, with the location's own parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLocation {
    pub location: Option<Value>,
    pub parent_location: Option<Value>,
}

/// One (relationship, target) pair reached from the source node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedReference {
    pub relationship: Value,
    pub target: Value,
    pub locations: Vec<ReferenceLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceResolveReport {
    pub ok: bool,
    pub command: String,
    pub input: Extra,
    pub found: bool,
    pub source: Option<Value>,
    pub resolved_references: Vec<ResolvedReference>,
    pub count: u64,
    pub warnings: Vec<Warning>,
}
