// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Pure report assembly for the DocQuery aggregations.
//!
//! Everything here works on rows already fetched from the graph; nothing does
//! I/O. The caller in [`super`] issues the queries and feeds the rows in.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde_json::{json, Value};

use super::types::{
    DuplicateSheetRow, InventoryRow, Reachability, ReferenceLocation, ResolvedReference,
    SheetListTotals, SheetNodeRow, Warning, WarningKind,
};
use crate::types::Extra;

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

/// Read a count column. Graph drivers hand counts back as integers or floats;
/// anything else (including negatives) reads as zero.
pub(crate) fn count_value(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Non-null column value.
fn column<'a>(row: &'a Extra, key: &str) -> Option<&'a Value> {
    row.get(key).filter(|v| !v.is_null())
}

/// Property of a serialised node or relationship.
///
/// Looks under `properties` first and falls back to a top-level key.
pub(crate) fn node_prop<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    node.get("properties")
        .and_then(|props| props.get(key))
        .or_else(|| node.get(key))
        .filter(|v| !v.is_null())
}

/// Stable identity of a node or relationship: `uuid`, then `element_id`, then `id`.
pub(crate) fn node_id(node: &Value) -> Option<String> {
    let scalar = |v: &Value| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    node_prop(node, "uuid")
        .and_then(scalar)
        .or_else(|| node.get("element_id").and_then(scalar))
        .or_else(|| node.get("id").and_then(scalar))
}

fn warning(kind: WarningKind, message: String, details: Value) -> Warning {
    let details = match details {
        Value::Object(map) => map,
        _ => Extra::new(),
    };
    Warning {
        kind,
        message,
        details,
    }
}

// ---------------------------------------------------------------------------
// Sheet summary
// ---------------------------------------------------------------------------

pub(crate) fn reachability(
    sheet_node_count: u64,
    non_sheet_total: u64,
    reachable_non_sheet: u64,
) -> Reachability {
    Reachability {
        has_sheet_node: sheet_node_count > 0,
        sheet_node_count,
        non_sheet_total,
        reachable_non_sheet,
        unreachable_non_sheet: non_sheet_total.saturating_sub(reachable_non_sheet),
    }
}

pub(crate) fn sheet_summary_warnings(sheet_id: &str, reach: &Reachability) -> Vec<Warning> {
    let mut warnings = Vec::new();
    if !reach.has_sheet_node {
        warnings.push(warning(
            WarningKind::MissingSheetNode,
            format!("No sheet node found for sheet {sheet_id}"),
            json!({ "sheet_id": sheet_id }),
        ));
    }
    if reach.sheet_node_count > 1 {
        warnings.push(warning(
            WarningKind::DuplicateSheetNodes,
            format!(
                "Sheet {sheet_id} has {} sheet nodes",
                reach.sheet_node_count
            ),
            json!({ "sheet_id": sheet_id, "sheet_node_count": reach.sheet_node_count }),
        ));
    }
    if reach.unreachable_non_sheet > 0 {
        warnings.push(warning(
            WarningKind::UnreachableEntities,
            format!(
                "{} of {} entities on sheet {sheet_id} are not reachable from the sheet node",
                reach.unreachable_non_sheet, reach.non_sheet_total
            ),
            json!({
                "sheet_id": sheet_id,
                "unreachable_non_sheet": reach.unreachable_non_sheet,
            }),
        ));
    }
    warnings
}

// ---------------------------------------------------------------------------
// Sheet list
// ---------------------------------------------------------------------------

/// Cross-check sheet nodes against the per-sheet entity inventory.
///
/// Emits at most one warning per anomaly class; each lists the sheet ids
/// involved in ascending order.
pub(crate) fn audit_sheet_list(
    sheet_nodes: &[SheetNodeRow],
    inventory: &[InventoryRow],
    duplicates: &[DuplicateSheetRow],
    missing_sheet_id_count: u64,
) -> (SheetListTotals, Vec<Warning>) {
    let mut node_counts: BTreeMap<&str, u64> = BTreeMap::new();
    let mut unkeyed: Vec<&str> = Vec::new();
    for node in sheet_nodes {
        match node.sheet_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => *node_counts.entry(id).or_default() += 1,
            None => unkeyed.push(node.uuid.as_deref().unwrap_or_default()),
        }
    }

    let mut inventory_counts: BTreeMap<&str, u64> = BTreeMap::new();
    for row in inventory {
        *inventory_counts.entry(row.sheet_id.as_str()).or_default() += row.entity_count;
    }

    let without_node: Vec<&str> = inventory_counts
        .keys()
        .filter(|id| !node_counts.contains_key(*id))
        .copied()
        .collect();
    let without_inventory: Vec<&str> = node_counts
        .keys()
        .filter(|id| !inventory_counts.contains_key(*id))
        .copied()
        .collect();
    let empty: Vec<&str> = node_counts
        .keys()
        .filter(|id| inventory_counts.get(*id).is_some_and(|count| *count <= 1))
        .copied()
        .collect();
    let duplicated: BTreeSet<&str> = duplicates
        .iter()
        .filter(|row| row.node_count > 1)
        .map(|row| row.sheet_id.as_str())
        .chain(
            node_counts
                .iter()
                .filter(|(_, count)| **count > 1)
                .map(|(id, _)| *id),
        )
        .collect();

    let mut warnings = Vec::new();
    if !without_node.is_empty() {
        warnings.push(warning(
            WarningKind::InventoryWithoutSheetNode,
            format!("{} sheet id(s) have entities but no sheet node", without_node.len()),
            json!({ "sheet_ids": without_node }),
        ));
    }
    if !without_inventory.is_empty() {
        warnings.push(warning(
            WarningKind::SheetNodeWithoutInventory,
            format!("{} sheet node(s) have no inventory rows", without_inventory.len()),
            json!({ "sheet_ids": without_inventory }),
        ));
    }
    if !empty.is_empty() {
        warnings.push(warning(
            WarningKind::EmptySheetNodes,
            format!("{} sheet node(s) have no attached entities", empty.len()),
            json!({ "sheet_ids": empty }),
        ));
    }
    if !duplicated.is_empty() {
        warnings.push(warning(
            WarningKind::DuplicateSheetNodes,
            format!("{} sheet id(s) have more than one sheet node", duplicated.len()),
            json!({ "sheet_ids": duplicated }),
        ));
    }
    if !unkeyed.is_empty() {
        warnings.push(warning(
            WarningKind::SheetNodesMissingSheetId,
            format!("{} sheet node(s) have no sheet_id", unkeyed.len()),
            json!({ "count": unkeyed.len(), "uuids": unkeyed }),
        ));
    }
    if missing_sheet_id_count > 0 {
        warnings.push(warning(
            WarningKind::EntitiesMissingSheetId,
            format!("{missing_sheet_id_count} entities have no sheet_id"),
            json!({ "count": missing_sheet_id_count }),
        ));
    }

    let totals = SheetListTotals {
        sheet_node_count: sheet_nodes.len() as u64,
        inventory_sheet_count: inventory_counts.len() as u64,
        entity_total: inventory_counts.values().sum(),
        missing_sheet_id_count,
        duplicate_sheet_id_count: duplicated.len() as u64,
        sheet_node_missing_id_count: unkeyed.len() as u64,
    };
    (totals, warnings)
}

// ---------------------------------------------------------------------------
// Reference resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub(crate) struct ResolvedRows {
    pub found: bool,
    pub source: Option<Value>,
    pub references: Vec<ResolvedReference>,
    pub warnings: Vec<Warning>,
}

fn identity(value: &Value) -> String {
    node_id(value).unwrap_or_else(|| value.to_string())
}

fn declared_sheets(source: &Value) -> Option<Vec<String>> {
    let declared: Vec<String> = match node_prop(source, "target_sheet_ids")? {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        _ => return None,
    };
    (!declared.is_empty()).then_some(declared)
}

/// Collapse traversal rows into one entry per (relationship, target).
///
/// Rows are keyed by `(relationship id, target id, location id, parent
/// location id)`; exact repeats from the join fan-out are dropped and the
/// remaining locations are grouped under their reference in first-seen order.
pub(crate) fn resolve_references(rows: &[Extra]) -> ResolvedRows {
    let source = rows.iter().find_map(|row| column(row, "source")).cloned();

    let mut seen: HashSet<(String, String, String, String)> = HashSet::new();
    let mut slots: HashMap<(String, String), usize> = HashMap::new();
    let mut references: Vec<ResolvedReference> = Vec::new();

    for row in rows {
        let (Some(relationship), Some(target)) =
            (column(row, "relationship"), column(row, "target"))
        else {
            continue;
        };
        let location = column(row, "location");
        let parent = column(row, "parent_location");

        let rel_id = identity(relationship);
        let target_id = identity(target);
        let row_key = (
            rel_id.clone(),
            target_id.clone(),
            location.map(identity).unwrap_or_default(),
            parent.map(identity).unwrap_or_default(),
        );
        if !seen.insert(row_key) {
            continue;
        }

        let slot = *slots.entry((rel_id, target_id)).or_insert_with(|| {
            references.push(ResolvedReference {
                relationship: relationship.clone(),
                target: target.clone(),
                locations: Vec::new(),
            });
            references.len() - 1
        });
        if location.is_some() || parent.is_some() {
            references[slot].locations.push(ReferenceLocation {
                location: location.cloned(),
                parent_location: parent.cloned(),
            });
        }
    }

    let declared = source.as_ref().and_then(declared_sheets);
    let mut warnings = Vec::new();
    for reference in &references {
        let Some(target_sheet) = node_prop(&reference.target, "sheet_id").and_then(Value::as_str)
        else {
            continue;
        };
        let rel_id = identity(&reference.relationship);
        let target_id = identity(&reference.target);

        if let Some(expected) =
            node_prop(&reference.relationship, "target_sheet_id").and_then(Value::as_str)
        {
            if expected != target_sheet {
                warnings.push(warning(
                    WarningKind::TargetSheetMismatch,
                    format!(
                        "Reference {rel_id} declares sheet {expected} but target {target_id} is on {target_sheet}"
                    ),
                    json!({
                        "relationship_id": rel_id,
                        "target_id": target_id,
                        "target_sheet_id": target_sheet,
                        "declared_target_sheet_id": expected,
                    }),
                ));
            }
        }

        if let Some(declared) = &declared {
            if !declared.iter().any(|s| s == target_sheet) {
                warnings.push(warning(
                    WarningKind::TargetSheetNotDeclared,
                    format!("Target {target_id} is on sheet {target_sheet}, which the source does not list"),
                    json!({
                        "relationship_id": rel_id,
                        "target_id": target_id,
                        "target_sheet_id": target_sheet,
                        "declared_target_sheet_ids": declared,
                    }),
                ));
            }
        }
    }

    ResolvedRows {
        found: source.is_some(),
        source,
        references,
        warnings,
    }
}
