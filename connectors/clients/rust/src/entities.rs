// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Entity and relationship listing for a project's knowledge graph.

use serde::Deserialize;

use crate::client::{require_id, StruAiClient};
use crate::error::Result;
use crate::types::{Entity, EntityListItem, Fact};

/// Default row cap for entity and relationship listings.
pub const DEFAULT_LIST_LIMIT: u32 = 200;

/// Push `(key, value)` when the value is present and not blank.
fn push_opt(query: &mut Vec<(&'static str, String)>, key: &'static str, value: &Option<String>) {
    if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        query.push((key, value.to_string()));
    }
}

/// Filters for [`Entities::list`]. Unset filters are not sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityFilter {
    pub sheet_id: Option<String>,
    pub entity_type: Option<String>,
    pub family: Option<String>,
    pub normalized_spec: Option<String>,
    pub region_uuid: Option<String>,
    pub region_label: Option<String>,
    pub note_number: Option<String>,
    pub limit: u32,
}

impl Default for EntityFilter {
    fn default() -> Self {
        Self {
            sheet_id: None,
            entity_type: None,
            family: None,
            normalized_spec: None,
            region_uuid: None,
            region_label: None,
            note_number: None,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl EntityFilter {
    pub fn sheet(sheet_id: impl Into<String>) -> Self {
        Self {
            sheet_id: Some(sheet_id.into()),
            ..Self::default()
        }
    }

    pub fn entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", self.limit.to_string())];
        push_opt(&mut query, "sheet_id", &self.sheet_id);
        push_opt(&mut query, "type", &self.entity_type);
        push_opt(&mut query, "family", &self.family);
        push_opt(&mut query, "normalized_spec", &self.normalized_spec);
        push_opt(&mut query, "region_uuid", &self.region_uuid);
        push_opt(&mut query, "region_label", &self.region_label);
        push_opt(&mut query, "note_number", &self.note_number);
        query
    }
}

/// Filters for [`Relationships::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipFilter {
    pub sheet_id: Option<String>,
    pub source_id: Option<String>,
    pub target_id: Option<String>,
    pub relationship_type: Option<String>,
    pub include_invalid: bool,
    pub invalid_only: bool,
    pub orphan_only: bool,
    pub limit: u32,
}

impl Default for RelationshipFilter {
    fn default() -> Self {
        Self {
            sheet_id: None,
            source_id: None,
            target_id: None,
            relationship_type: None,
            include_invalid: false,
            invalid_only: false,
            orphan_only: false,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl RelationshipFilter {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("limit", self.limit.to_string()),
            ("include_invalid", self.include_invalid.to_string()),
            ("invalid_only", self.invalid_only.to_string()),
            ("orphan_only", self.orphan_only.to_string()),
        ];
        push_opt(&mut query, "sheet_id", &self.sheet_id);
        push_opt(&mut query, "source_id", &self.source_id);
        push_opt(&mut query, "target_id", &self.target_id);
        push_opt(&mut query, "type", &self.relationship_type);
        query
    }
}

#[derive(Deserialize)]
struct EntityList {
    #[serde(default)]
    entities: Vec<EntityListItem>,
}

#[derive(Deserialize)]
struct RelationshipList {
    #[serde(default)]
    relationships: Vec<Fact>,
}

/// Entities of one project.
#[derive(Debug, Clone, Copy)]
pub struct Entities<'a> {
    client: &'a StruAiClient,
    project_id: &'a str,
}

impl<'a> Entities<'a> {
    pub(crate) fn new(client: &'a StruAiClient, project_id: &'a str) -> Self {
        Self { client, project_id }
    }

    pub async fn list(&self, filter: &EntityFilter) -> Result<Vec<EntityListItem>> {
        let url = self.client.endpoint(&["projects", self.project_id, "entities"])?;
        let list: EntityList = self.client.get(url, &filter.to_query()).await?;
        Ok(list.entities)
    }

    /// One entity with its incoming and outgoing facts.
    ///
    /// `include_invalid` keeps facts the server flagged as invalid;
    /// `expand_target` inlines target entities on cross-sheet references.
    pub async fn get(
        &self,
        entity_id: &str,
        include_invalid: bool,
        expand_target: bool,
    ) -> Result<Entity> {
        let entity_id = require_id("entity_id", entity_id)?;
        let url = self
            .client
            .endpoint(&["projects", self.project_id, "entities", entity_id])?;
        let query = [
            ("include_invalid", include_invalid.to_string()),
            ("expand_target", expand_target.to_string()),
        ];
        self.client.get(url, &query).await
    }
}

/// Relationships (facts) of one project.
#[derive(Debug, Clone, Copy)]
pub struct Relationships<'a> {
    client: &'a StruAiClient,
    project_id: &'a str,
}

impl<'a> Relationships<'a> {
    pub(crate) fn new(client: &'a StruAiClient, project_id: &'a str) -> Self {
        Self { client, project_id }
    }

    pub async fn list(&self, filter: &RelationshipFilter) -> Result<Vec<Fact>> {
        let url = self
            .client
            .endpoint(&["projects", self.project_id, "relationships"])?;
        let list: RelationshipList = self.client.get(url, &filter.to_query()).await?;
        Ok(list.relationships)
    }
}
