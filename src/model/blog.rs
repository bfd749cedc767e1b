use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{contains_ci, AuthorRef, CategoryRef, Collection, NamedRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: u64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub category: CategoryRef,
    pub author: AuthorRef,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published_at: String,
    #[serde(default)]
    pub read_time: u32,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostDraft {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub category: CategoryRef,
    pub author: AuthorRef,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published_at: String,
    #[serde(default)]
    pub read_time: u32,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlogFilter {
    Category(String),
    Author(String),
    Tag(String),
}

impl Collection for BlogPost {
    type Draft = BlogPostDraft;
    type Patch = BlogPostPatch;
    type Filter = BlogFilter;

    const NAME: &'static str = "blog post";
    const STORAGE_KEY: &'static str = "mock_blog_posts";
    const ENDPOINT: &'static str = "/api/blog/posts";

    fn id(&self) -> u64 {
        self.id
    }

    fn from_draft(id: u64, draft: BlogPostDraft) -> Self {
        Self {
            id,
            title: draft.title,
            slug: draft.slug,
            excerpt: draft.excerpt,
            content: draft.content,
            cover_image: draft.cover_image,
            category: draft.category.normalize(),
            author: draft.author.normalize(),
            tags: draft.tags,
            published_at: draft.published_at,
            read_time: draft.read_time,
            featured: draft.featured,
        }
    }

    fn apply(&mut self, patch: BlogPostPatch) {
        if let Some(v) = patch.title { self.title = v; }
        if let Some(v) = patch.slug { self.slug = v; }
        if let Some(v) = patch.excerpt { self.excerpt = v; }
        if let Some(v) = patch.content { self.content = v; }
        if let Some(v) = patch.cover_image { self.cover_image = Some(v); }
        if let Some(v) = patch.category { self.category = v.normalize(); }
        if let Some(v) = patch.author { self.author = v.normalize(); }
        if let Some(v) = patch.tags { self.tags = v; }
        if let Some(v) = patch.published_at { self.published_at = v; }
        if let Some(v) = patch.read_time { self.read_time = v; }
        if let Some(v) = patch.featured { self.featured = v; }
    }

    fn matches_query(&self, needle: &str) -> bool {
        contains_ci(&self.title, needle)
            || contains_ci(&self.excerpt, needle)
            || contains_ci(&self.content, needle)
            || self.tags.iter().any(|t| contains_ci(t, needle))
    }

    fn matches_filter(&self, filter: &BlogFilter) -> bool {
        match filter {
            BlogFilter::Category(c) => self.category.matches(c),
            BlogFilter::Author(a) => self.author.matches(a),
            BlogFilter::Tag(t) => self.tags.iter().any(|tag| tag.eq_ignore_ascii_case(t.trim())),
        }
    }

    fn filter_param(filter: &BlogFilter) -> (&'static str, String) {
        match filter {
            BlogFilter::Category(c) => ("category", c.clone()),
            BlogFilter::Author(a) => ("author", a.clone()),
            BlogFilter::Tag(t) => ("tag", t.clone()),
        }
    }

    fn filter_from_params(params: &HashMap<String, String>) -> Option<BlogFilter> {
        if let Some(c) = params.get("category") {
            return Some(BlogFilter::Category(c.clone()));
        }
        if let Some(a) = params.get("author") {
            return Some(BlogFilter::Author(a.clone()));
        }
        params.get("tag").map(|t| BlogFilter::Tag(t.clone()))
    }

    fn seed() -> Vec<Self> {
        let author = NamedRef::ById { id: 1, name: "Alex Morgan".to_string() };
        vec![
            BlogPost {
                id: 1,
                title: "Building Fast Static Sites".to_string(),
                slug: "building-fast-static-sites".to_string(),
                excerpt: "Notes on shipping a portfolio that loads in under a second.".to_string(),
                content: "Static generation, image compression and careful caching go a long way.".to_string(),
                cover_image: Some("/images/static-sites.jpg".to_string()),
                category: NamedRef::ById { id: 1, name: "Web Development".to_string() },
                author: author.clone(),
                tags: vec!["performance".to_string(), "web".to_string()],
                published_at: "2024-01-15".to_string(),
                read_time: 5,
                featured: true,
            },
            BlogPost {
                id: 2,
                title: "Designing With Constraints".to_string(),
                slug: "designing-with-constraints".to_string(),
                excerpt: "Why a small palette and a strict grid make better layouts.".to_string(),
                content: "Constraints force decisions early and keep a design coherent.".to_string(),
                cover_image: None,
                category: NamedRef::ByName("Design".to_string()),
                author: author.clone(),
                tags: vec!["design".to_string()],
                published_at: "2024-02-03".to_string(),
                read_time: 4,
                featured: false,
            },
            BlogPost {
                id: 3,
                title: "Offline-First Admin Panels".to_string(),
                slug: "offline-first-admin-panels".to_string(),
                excerpt: "Editing content without a backend using a local mock API.".to_string(),
                content: "A mock backend persisted locally lets the whole admin area work offline.".to_string(),
                cover_image: None,
                category: NamedRef::ById { id: 1, name: "Web Development".to_string() },
                author,
                tags: vec!["web".to_string(), "offline".to_string()],
                published_at: "2024-03-20".to_string(),
                read_time: 7,
                featured: false,
            },
        ]
    }
}
