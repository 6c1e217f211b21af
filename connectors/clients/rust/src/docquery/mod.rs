// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! DocQuery: graph traversal and custom queries over a project's knowledge graph.
//!
//! The direct calls map one-to-one onto `/projects/{id}/docquery/*`. The three
//! reports ([`DocQuery::sheet_summary`], [`DocQuery::sheet_list`],
//! [`DocQuery::reference_resolve`]) are assembled client-side from several
//! read-only graph queries. The queries are independent round trips with no
//! snapshot isolation, so a concurrent ingestion can make one report
//! transiently inconsistent.
//!
//! Graph queries run scoped to the project: the server binds `$project_id`.

mod aggregate;
pub mod types;

use std::path::Path;

use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use crate::client::{decode, require_id, RequestBody, StruAiClient};
use crate::error::{Result, StruAiError};
use crate::types::{BBox, Extra};

use self::aggregate::{
    audit_sheet_list, count_value, reachability, resolve_references, sheet_summary_warnings,
};
pub use self::types::*;

/// Row cap for the internal queries behind the reports.
const REPORT_MAX_ROWS: u32 = 10_000;

const SHEET_NODE_QUERY: &str = r#"
MATCH (s:Sheet {project_id: $project_id, sheet_id: $sheet_id})
RETURN s AS sheet_node
"#;

const LABEL_COUNTS_QUERY: &str = r#"
MATCH (n {project_id: $project_id, sheet_id: $sheet_id})
UNWIND labels(n) AS label
RETURN label, count(*) AS count
ORDER BY count DESC, label
"#;

const RELATIONSHIP_COUNTS_QUERY: &str = r#"
MATCH (n {project_id: $project_id, sheet_id: $sheet_id})-[r]->()
RETURN type(r) AS type, count(r) AS count
ORDER BY count DESC, type
"#;

const REACHABILITY_QUERY: &str = r#"
MATCH (n {project_id: $project_id, sheet_id: $sheet_id})
WHERE NOT n:Sheet
OPTIONAL MATCH (s:Sheet {project_id: $project_id, sheet_id: $sheet_id})-[*1..6]-(n)
WITH n, count(s) > 0 AS reachable
RETURN count(n) AS non_sheet_total,
       sum(CASE WHEN reachable THEN 1 ELSE 0 END) AS reachable_non_sheet
"#;

const ORPHAN_QUERY: &str = r#"
MATCH (n {project_id: $project_id, sheet_id: $sheet_id})
WHERE NOT n:Sheet
  AND NOT EXISTS { MATCH (:Sheet {project_id: $project_id, sheet_id: $sheet_id})-[*1..6]-(n) }
RETURN n AS orphan
LIMIT $orphan_limit
"#;

const SHEET_NODES_QUERY: &str = r#"
MATCH (s:Sheet {project_id: $project_id})
RETURN s.sheet_id AS sheet_id, s.uuid AS uuid, s.title AS title
ORDER BY sheet_id
"#;

const INVENTORY_QUERY: &str = r#"
MATCH (n {project_id: $project_id})
WHERE n.sheet_id IS NOT NULL
RETURN n.sheet_id AS sheet_id, count(n) AS entity_count
ORDER BY sheet_id
"#;

const DUPLICATE_SHEETS_QUERY: &str = r#"
MATCH (s:Sheet {project_id: $project_id})
WITH s.sheet_id AS sheet_id, count(s) AS node_count
WHERE node_count > 1
RETURN sheet_id, node_count
ORDER BY sheet_id
"#;

const MISSING_SHEET_ID_QUERY: &str = r#"
MATCH (n:Entity {project_id: $project_id})
WHERE n.sheet_id IS NULL
RETURN count(n) AS missing_sheet_id_count
"#;

const REFERENCE_QUERY: &str = r#"
MATCH (src {project_id: $project_id, uuid: $uuid})
OPTIONAL MATCH (src)-[r:REFERENCES]->(t)
WITH src, r, t
LIMIT $limit
OPTIONAL MATCH (t)-[:LOCATED_IN]->(loc)
OPTIONAL MATCH (loc)-[:LOCATED_IN]->(parent)
RETURN src AS source, r AS relationship, t AS target, loc AS location, parent AS parent_location
"#;

// ---------------------------------------------------------------------------
// Internal request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CypherRequest<'a> {
    query: &'a str,
    params: &'a Extra,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_rows: Option<u32>,
}

#[derive(Debug, Serialize)]
struct CropBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    uuid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bbox: Option<BBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_hash: Option<&'a str>,
}

fn object(value: Value) -> Extra {
    match value {
        Value::Object(map) => map,
        _ => Extra::new(),
    }
}

/// Check a crop target locally and build the request body.
fn crop_body(request: &CropRequest) -> Result<CropBody<'_>> {
    let page_hash = request
        .page_hash
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty());
    match &request.target {
        CropTarget::Node(uuid) => Ok(CropBody {
            uuid: Some(require_id("uuid", uuid)?),
            bbox: None,
            page_hash,
        }),
        CropTarget::Region(bbox) => {
            let [x0, y0, x1, y1] = *bbox;
            if !bbox.iter().all(|v| v.is_finite()) || x0 >= x1 || y0 >= y1 {
                return Err(StruAiError::Validation(format!(
                    "Invalid crop bbox {bbox:?}: expected [x0, y0, x1, y1] with x0 < x1 and y0 < y1"
                )));
            }
            Ok(CropBody {
                uuid: None,
                bbox: Some(*bbox),
                page_hash,
            })
        }
    }
}

/// Graph traversal API for one project.
#[derive(Debug, Clone, Copy)]
pub struct DocQuery<'a> {
    client: &'a StruAiClient,
    project_id: &'a str,
}

impl<'a> DocQuery<'a> {
    pub(crate) fn new(client: &'a StruAiClient, project_id: &'a str) -> Self {
        Self { client, project_id }
    }

    fn url(&self, command: &str) -> Result<Url> {
        self.client
            .endpoint(&["projects", self.project_id, "docquery", command])
    }

    // -- Direct calls -------------------------------------------------------

    /// Fetch one node by uuid. `found` is false when it does not exist.
    pub async fn node_get(&self, uuid: &str) -> Result<NodeGetResult> {
        let uuid = require_id("uuid", uuid)?;
        self.client
            .get(self.url("node-get")?, &[("uuid", uuid.to_string())])
            .await
    }

    /// Entities on one sheet, optionally restricted to one entity type.
    pub async fn sheet_entities(
        &self,
        sheet_id: &str,
        entity_type: Option<&str>,
        limit: u32,
    ) -> Result<SheetEntitiesResult> {
        let sheet_id = require_id("sheet_id", sheet_id)?;
        let mut query = vec![("sheet_id", sheet_id.to_string()), ("limit", limit.to_string())];
        if let Some(entity_type) = entity_type.map(str::trim).filter(|t| !t.is_empty()) {
            query.push(("entity_type", entity_type.to_string()));
        }
        self.client.get(self.url("sheet-entities")?, &query).await
    }

    /// Full-text search over graph nodes.
    pub async fn search(&self, query: &str, limit: u32) -> Result<DocSearchResult> {
        let query = require_id("query", query)?;
        let params = [("query", query.to_string()), ("limit", limit.to_string())];
        self.client.get(self.url("search")?, &params).await
    }

    /// Graph and/or spatial neighbors of a node.
    pub async fn neighbors(&self, request: &NeighborsRequest) -> Result<NeighborsResult> {
        let uuid = require_id("uuid", &request.uuid)?;
        let mut query = vec![
            ("uuid", uuid.to_string()),
            ("mode", request.mode.to_string()),
            ("direction", request.direction.to_string()),
            ("limit", request.limit.to_string()),
        ];
        if let Some(rel) = request
            .relationship_type
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
        {
            query.push(("relationship_type", rel.to_string()));
        }
        if let Some(radius) = request.radius {
            query.push(("radius", radius.to_string()));
        }
        self.client.get(self.url("neighbors")?, &query).await
    }

    /// Run a read-only graph query with named parameters.
    ///
    /// `$project_id` is bound by the server; `max_rows` caps the returned rows
    /// and sets `truncated` when more were available.
    pub async fn cypher(
        &self,
        query: &str,
        params: &Extra,
        max_rows: Option<u32>,
    ) -> Result<CypherResult> {
        let query = require_id("query", query)?;
        let body = CypherRequest {
            query,
            params,
            max_rows,
        };
        self.client.post_json(self.url("cypher")?, &body).await
    }

    /// Crop a region of a page image on the server.
    ///
    /// # Errors
    ///
    /// [`StruAiError::Validation`] before any request for a blank uuid or a
    /// degenerate bounding box.
    pub async fn crop(&self, request: &CropRequest) -> Result<CropImage> {
        let body = crop_body(request)?;
        let value = serde_json::to_value(&body)
            .map_err(|e| StruAiError::Validation(format!("Unserializable crop request: {e}")))?;
        let response = self
            .client
            .request_bytes(Method::POST, self.url("crop")?, RequestBody::Json(value))
            .await?;
        debug!(
            project_id = %self.project_id,
            bytes = response.bytes.len(),
            content_type = ?response.content_type,
            "Crop received"
        );
        Ok(CropImage {
            bytes: response.bytes,
            content_type: response.content_type,
        })
    }

    /// Crop on the server and write the image to `output`.
    ///
    /// Missing parent directories are created.
    pub async fn crop_to_file(
        &self,
        request: &CropRequest,
        output: impl AsRef<Path>,
    ) -> Result<CropResult> {
        let output = output.as_ref();
        let image = self.crop(request).await?;
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, &image.bytes).await?;
        Ok(CropResult {
            output_path: output.to_path_buf(),
            bytes_written: image.bytes.len() as u64,
            content_type: image.content_type,
        })
    }

    // -- Aggregated reports -------------------------------------------------

    /// Records of one internal report query.
    async fn rows(&self, query: &str, params: &Extra, max_rows: u32) -> Result<Vec<Extra>> {
        let result = self.cypher(query, params, Some(max_rows)).await?;
        if !result.ok {
            let reason = match result.extra.get("error") {
                Some(Value::String(message)) => message.clone(),
                Some(Value::Object(error)) => error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("no error message")
                    .to_string(),
                _ => "no error message".to_string(),
            };
            warn!(project_id = %self.project_id, %reason, "Report query rejected");
            return Err(StruAiError::Decode(format!(
                "Report query returned ok=false: {reason}"
            )));
        }
        if result.truncated {
            warn!(
                project_id = %self.project_id,
                max_rows,
                "Report query truncated; totals may be incomplete"
            );
        }
        Ok(result.records)
    }

    /// Health report for one sheet: node counts, reachability from the sheet
    /// node, and a few orphan examples.
    ///
    /// Orphans are only queried when something is unreachable and
    /// `orphan_limit > 0`.
    pub async fn sheet_summary(&self, sheet_id: &str, orphan_limit: u32) -> Result<SheetSummaryReport> {
        let sheet_id = require_id("sheet_id", sheet_id)?;
        let params = object(json!({ "sheet_id": sheet_id }));

        let (sheet_rows, label_rows, relationship_rows, reach_rows) = tokio::try_join!(
            self.rows(SHEET_NODE_QUERY, &params, REPORT_MAX_ROWS),
            self.rows(LABEL_COUNTS_QUERY, &params, REPORT_MAX_ROWS),
            self.rows(RELATIONSHIP_COUNTS_QUERY, &params, REPORT_MAX_ROWS),
            self.rows(REACHABILITY_QUERY, &params, 1),
        )?;

        let sheet_nodes: Vec<&Value> = sheet_rows
            .iter()
            .filter_map(|row| row.get("sheet_node").filter(|v| !v.is_null()))
            .collect();
        let reach_row = reach_rows.first();
        let reach = reachability(
            sheet_nodes.len() as u64,
            count_value(reach_row.and_then(|r| r.get("non_sheet_total"))),
            count_value(reach_row.and_then(|r| r.get("reachable_non_sheet"))),
        );

        let orphan_examples = if reach.unreachable_non_sheet > 0 && orphan_limit > 0 {
            let mut orphan_params = params.clone();
            orphan_params.insert("orphan_limit".into(), json!(orphan_limit));
            self.rows(ORPHAN_QUERY, &orphan_params, orphan_limit).await?
        } else {
            Vec::new()
        };

        let warnings = sheet_summary_warnings(sheet_id, &reach);
        if !warnings.is_empty() {
            warn!(
                project_id = %self.project_id,
                sheet_id = %sheet_id,
                warnings = warnings.len(),
                unreachable = reach.unreachable_non_sheet,
                "Sheet summary found inconsistencies"
            );
        }

        Ok(SheetSummaryReport {
            ok: true,
            command: "sheet-summary".into(),
            input: object(json!({ "sheet_id": sheet_id, "orphan_limit": orphan_limit })),
            sheet_node: sheet_nodes.first().map(|v| (*v).clone()),
            node_label_counts: label_rows,
            relationship_counts: relationship_rows,
            reachability: reach,
            orphan_examples,
            warnings,
        })
    }

    /// Topology audit across every sheet in the project.
    pub async fn sheet_list(&self) -> Result<SheetListReport> {
        let params = Extra::new();

        let (node_rows, inventory_rows, duplicate_rows, missing_rows) = tokio::try_join!(
            self.rows(SHEET_NODES_QUERY, &params, REPORT_MAX_ROWS),
            self.rows(INVENTORY_QUERY, &params, REPORT_MAX_ROWS),
            self.rows(DUPLICATE_SHEETS_QUERY, &params, REPORT_MAX_ROWS),
            self.rows(MISSING_SHEET_ID_QUERY, &params, 1),
        )?;

        let sheet_nodes: Vec<SheetNodeRow> = decode_rows(node_rows)?;
        let inventory: Vec<InventoryRow> = decode_rows(inventory_rows)?;
        let duplicates: Vec<DuplicateSheetRow> = decode_rows(duplicate_rows)?;
        let missing = count_value(
            missing_rows
                .first()
                .and_then(|r| r.get("missing_sheet_id_count")),
        );

        let (totals, mismatch_warnings) =
            audit_sheet_list(&sheet_nodes, &inventory, &duplicates, missing);
        if !mismatch_warnings.is_empty() {
            warn!(
                project_id = %self.project_id,
                warnings = mismatch_warnings.len(),
                "Sheet list found inconsistencies"
            );
        }

        Ok(SheetListReport {
            ok: true,
            command: "sheet-list".into(),
            input: Extra::new(),
            sheet_nodes,
            entity_sheet_inventory: inventory,
            totals,
            mismatch_warnings,
        })
    }

    /// Resolve the references leaving a node to their targets and locations.
    ///
    /// `limit` caps the number of references followed.
    pub async fn reference_resolve(&self, uuid: &str, limit: u32) -> Result<ReferenceResolveReport> {
        let uuid = require_id("uuid", uuid)?;
        let params = object(json!({ "uuid": uuid, "limit": limit }));
        let rows = self.rows(REFERENCE_QUERY, &params, REPORT_MAX_ROWS).await?;

        let resolved = resolve_references(&rows);
        debug!(
            project_id = %self.project_id,
            uuid = %uuid,
            rows = rows.len(),
            references = resolved.references.len(),
            "References resolved"
        );
        if !resolved.warnings.is_empty() {
            warn!(
                project_id = %self.project_id,
                uuid = %uuid,
                warnings = resolved.warnings.len(),
                "Reference targets disagree with declared sheets"
            );
        }

        Ok(ReferenceResolveReport {
            ok: true,
            command: "reference-resolve".into(),
            input: object(json!({ "uuid": uuid, "limit": limit })),
            found: resolved.found,
            source: resolved.source,
            count: resolved.references.len() as u64,
            resolved_references: resolved.references,
            warnings: resolved.warnings,
        })
    }
}

fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<Extra>) -> Result<Vec<T>> {
    rows.into_iter().map(|row| decode(Value::Object(row))).collect()
}
