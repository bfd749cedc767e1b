use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{contains_ci, Collection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectFilter {
    Tag(String),
}

impl Collection for Project {
    type Draft = ProjectDraft;
    type Patch = ProjectPatch;
    type Filter = ProjectFilter;

    const NAME: &'static str = "project";
    const STORAGE_KEY: &'static str = "mock_projects";
    const ENDPOINT: &'static str = "/api/projects";

    fn id(&self) -> u64 {
        self.id
    }

    fn from_draft(id: u64, draft: ProjectDraft) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            image: draft.image,
            tags: draft.tags,
            github_url: draft.github_url,
            live_url: draft.live_url,
            featured: draft.featured,
        }
    }

    fn apply(&mut self, patch: ProjectPatch) {
        if let Some(v) = patch.title { self.title = v; }
        if let Some(v) = patch.description { self.description = v; }
        if let Some(v) = patch.image { self.image = Some(v); }
        if let Some(v) = patch.tags { self.tags = v; }
        if let Some(v) = patch.github_url { self.github_url = Some(v); }
        if let Some(v) = patch.live_url { self.live_url = Some(v); }
        if let Some(v) = patch.featured { self.featured = v; }
    }

    fn matches_query(&self, needle: &str) -> bool {
        contains_ci(&self.title, needle)
            || contains_ci(&self.description, needle)
            || self.tags.iter().any(|t| contains_ci(t, needle))
    }

    fn matches_filter(&self, filter: &ProjectFilter) -> bool {
        match filter {
            ProjectFilter::Tag(t) => self.tags.iter().any(|tag| tag.eq_ignore_ascii_case(t.trim())),
        }
    }

    fn filter_param(filter: &ProjectFilter) -> (&'static str, String) {
        match filter {
            ProjectFilter::Tag(t) => ("tag", t.clone()),
        }
    }

    fn filter_from_params(params: &HashMap<String, String>) -> Option<ProjectFilter> {
        params.get("tag").map(|t| ProjectFilter::Tag(t.clone()))
    }

    fn seed() -> Vec<Self> {
        vec![
            Project {
                id: 1,
                title: "Portfolio CMS".to_string(),
                description: "A personal site with an admin area that works fully offline.".to_string(),
                image: Some("/images/portfolio-cms.jpg".to_string()),
                tags: vec!["React".to_string(), "TypeScript".to_string()],
                github_url: Some("https://github.com/example/portfolio".to_string()),
                live_url: None,
                featured: true,
            },
            Project {
                id: 2,
                title: "Image Optimizer".to_string(),
                description: "Batch resizing and recompression for web galleries.".to_string(),
                image: None,
                tags: vec!["Rust".to_string(), "CLI".to_string()],
                github_url: None,
                live_url: None,
                featured: false,
            },
        ]
    }
}
