// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Project-level semantic search across entities, facts, and communities.
//!
//! Each result channel is ranked independently by the server. Entity hits can
//! carry a small slice of graph context (connected entities and the facts
//! linking them) when `include_graph_context` is set.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::require_id;
use crate::error::Result;
use crate::projects::ProjectHandle;
use crate::types::{BBox, Extra};

/// Default number of hits per channel.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// A ranked result channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchChannel {
    Entities,
    Facts,
    Communities,
}

/// Options for [`ProjectHandle::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: u32,
    /// Restrict to these channels; `None` lets the server search all of them.
    pub channels: Option<Vec<SearchChannel>>,
    pub include_graph_context: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SEARCH_LIMIT,
            channels: None,
            include_graph_context: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal request body
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<&'a [SearchChannel]>,
    include_graph_context: bool,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Entity linked to a search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedEntity {
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

/// Fact linking a search hit to a connected entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipSummary {
    #[serde(default, rename = "type")]
    pub relationship_type: Option<String>,
    #[serde(default)]
    pub fact: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphContext {
    #[serde(default)]
    pub connected_entities: Vec<ConnectedEntity>,
    #[serde(default)]
    pub relationships: Vec<RelationshipSummary>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySearchHit {
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
    pub score: f64,
    #[serde(default)]
    pub attributes: Option<Extra>,
    #[serde(default)]
    pub graph_context: Option<GraphContext>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactSearchHit {
    pub id: String,
    #[serde(default)]
    pub predicate: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub fact_text: Option<String>,
    #[serde(default)]
    pub sheet_id: Option<String>,
    pub score: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunitySearchHit {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub member_count: Option<u64>,
    pub score: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Response of `POST /projects/{id}/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub entities: Vec<EntitySearchHit>,
    #[serde(default)]
    pub facts: Vec<FactSearchHit>,
    #[serde(default)]
    pub communities: Vec<CommunitySearchHit>,
    #[serde(default)]
    pub search_ms: u64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ProjectHandle {
    /// Search entities, facts, and communities in this project.
    ///
    /// # Errors
    ///
    /// Returns [`StruAiError::Validation`](crate::error::StruAiError::Validation)
    /// for a blank query.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse> {
        let query = require_id("query", query)?;
        let body = SearchRequest {
            query,
            limit: options.limit,
            channels: options.channels.as_deref(),
            include_graph_context: options.include_graph_context,
        };
        let url = self.client().endpoint(&["projects", self.id(), "search"])?;
        let response: SearchResponse = self.client().post_json(url, &body).await?;
        debug!(
            project_id = %self.id(),
            entities = response.entities.len(),
            facts = response.facts.len(),
            communities = response.communities.len(),
            search_ms = response.search_ms,
            "Project search finished"
        );
        Ok(response)
    }
}
