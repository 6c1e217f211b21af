// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Tier 2 projects and the per-project handle.
//!
//! A [`ProjectHandle`] owns a client clone plus the project record, and hands
//! out the nested resources (sheets, entities, relationships, DocQuery) scoped
//! to that project.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{require_id, StruAiClient};
use crate::docquery::DocQuery;
use crate::entities::{Entities, Relationships};
use crate::error::Result;
use crate::sheets::Sheets;
use crate::types::{Extra, Project, ProjectDeleteResult};

#[derive(Debug, Serialize)]
struct CreateProjectRequest<'a> {
    name: &'a str,
    description: Option<&'a str>,
}

#[derive(Deserialize)]
struct ProjectList {
    #[serde(default)]
    projects: Vec<Project>,
}

/// Top-level projects API.
#[derive(Debug, Clone, Copy)]
pub struct Projects<'a> {
    client: &'a StruAiClient,
}

impl<'a> Projects<'a> {
    pub(crate) fn new(client: &'a StruAiClient) -> Self {
        Self { client }
    }

    /// Create a project and return a handle to it.
    pub async fn create(&self, name: &str, description: Option<&str>) -> Result<ProjectHandle> {
        let name = require_id("name", name)?;
        let url = self.client.endpoint(&["projects"])?;
        let project: Project = self
            .client
            .post_json(url, &CreateProjectRequest { name, description })
            .await?;
        info!(project_id = %project.id, name = %project.name, "Project created");
        Ok(ProjectHandle::new(self.client.clone(), project))
    }

    /// List the projects visible to the API key.
    pub async fn list(&self, limit: Option<u32>) -> Result<Vec<Project>> {
        let url = self.client.endpoint(&["projects"])?;
        let query: Vec<(&str, String)> = limit.map(|l| ("limit", l.to_string())).into_iter().collect();
        let list: ProjectList = self.client.get(url, &query).await?;
        Ok(list.projects)
    }

    /// Fetch a project and return a handle to it.
    pub async fn get(&self, project_id: &str) -> Result<ProjectHandle> {
        let project_id = require_id("project_id", project_id)?;
        let url = self.client.endpoint(&["projects", project_id])?;
        let project: Project = self.client.get(url, &[]).await?;
        Ok(ProjectHandle::new(self.client.clone(), project))
    }

    /// Build a handle for a known project id without a network call.
    ///
    /// The handle's record carries only `id` and `name`; counts and timestamps
    /// stay at their defaults until fetched with [`Projects::get`].
    pub fn open(&self, project_id: &str, name: Option<&str>) -> Result<ProjectHandle> {
        let project_id = require_id("project_id", project_id)?;
        let project = Project {
            id: project_id.to_string(),
            name: name.unwrap_or(project_id).to_string(),
            description: None,
            created_at: None,
            sheets_count: 0,
            entities_count: 0,
            extra: Extra::new(),
        };
        Ok(ProjectHandle::new(self.client.clone(), project))
    }

    /// Delete a project. `None` on a bodyless 204.
    pub async fn delete(&self, project_id: &str) -> Result<Option<ProjectDeleteResult>> {
        let project_id = require_id("project_id", project_id)?;
        let url = self.client.endpoint(&["projects", project_id])?;
        let result: Option<ProjectDeleteResult> = self.client.delete(url).await?;
        info!(project_id = %project_id, "Project deleted");
        Ok(result)
    }
}

/// A project plus the resources scoped to it.
#[derive(Debug, Clone)]
pub struct ProjectHandle {
    client: StruAiClient,
    project: Project,
}

impl ProjectHandle {
    fn new(client: StruAiClient, project: Project) -> Self {
        Self { client, project }
    }

    pub fn id(&self) -> &str {
        &self.project.id
    }

    pub fn name(&self) -> &str {
        &self.project.name
    }

    pub fn description(&self) -> Option<&str> {
        self.project.description.as_deref()
    }

    /// The project record this handle was built from.
    pub fn data(&self) -> &Project {
        &self.project
    }

    pub(crate) fn client(&self) -> &StruAiClient {
        &self.client
    }

    pub fn sheets(&self) -> Sheets<'_> {
        Sheets::new(&self.client, &self.project.id)
    }

    pub fn entities(&self) -> Entities<'_> {
        Entities::new(&self.client, &self.project.id)
    }

    pub fn relationships(&self) -> Relationships<'_> {
        Relationships::new(&self.client, &self.project.id)
    }

    /// Graph traversal and custom queries over this project.
    pub fn docquery(&self) -> DocQuery<'_> {
        DocQuery::new(&self.client, &self.project.id)
    }

    /// Delete this project.
    pub async fn delete(&self) -> Result<Option<ProjectDeleteResult>> {
        self.client.projects().delete(&self.project.id).await
    }
}
