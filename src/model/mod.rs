//! Content entities and the traits the backends are generic over.
//!
//! Collections (blog posts, projects) carry integer ids assigned by whichever
//! backend is authoritative. Singletons (home, contact, about) are single
//! documents updated by merging a patch over the current value.

mod blog;
mod pages;
mod project;

pub use blog::{BlogFilter, BlogPost, BlogPostDraft, BlogPostPatch};
pub use pages::{
    AboutMe, AboutMePatch, ContactInfo, ContactInfoPatch, Experience, Hero, HomeContent, HomeContentPatch, ServiceItem,
    SocialLink,
};
pub use project::{Project, ProjectDraft, ProjectFilter, ProjectPatch};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

/// An entity stored as an id-addressed collection.
pub trait Collection: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Fields supplied on creation (everything but the id).
    type Draft: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static;
    /// Partial update; absent fields are left untouched.
    type Patch: Clone + Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static;
    /// Type-specific query such as "by category".
    type Filter: Clone + Debug + Send + Sync + 'static;

    /// Human-readable entity name used in errors and logs.
    const NAME: &'static str;
    /// Key of the mock snapshot in local storage.
    const STORAGE_KEY: &'static str;
    /// Remote collection path.
    const ENDPOINT: &'static str;

    fn id(&self) -> u64;
    fn from_draft(id: u64, draft: Self::Draft) -> Self;
    fn apply(&mut self, patch: Self::Patch);
    /// `needle` is already lowercased.
    fn matches_query(&self, needle: &str) -> bool;
    fn matches_filter(&self, filter: &Self::Filter) -> bool;
    /// Query-string form of a filter, e.g. `("category", "rust")`.
    fn filter_param(filter: &Self::Filter) -> (&'static str, String);
    /// Inverse of [`Collection::filter_param`] for the first recognised parameter.
    fn filter_from_params(params: &HashMap<String, String>) -> Option<Self::Filter>;
    /// Compiled-in default content.
    fn seed() -> Vec<Self>;
}

/// A single-document content type.
pub trait Singleton: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Partial update; `None` fields keep the current value.
    type Patch: Clone + Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static;

    const NAME: &'static str;
    const STORAGE_KEY: &'static str;
    const ENDPOINT: &'static str;

    fn apply(&mut self, patch: Self::Patch);
    fn seed() -> Self;
}

/// A reference to a category or author.
///
/// Content arrives either as a bare name or as an `{id, name}` object; both
/// forms deserialize into this type and nothing downstream branches on the
/// raw JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamedRef {
    ById { id: u64, name: String },
    ByName(String),
}

pub type CategoryRef = NamedRef;
pub type AuthorRef = NamedRef;

impl NamedRef {
    pub fn name(&self) -> &str {
        match self {
            NamedRef::ById { name, .. } => name,
            NamedRef::ByName(name) => name,
        }
    }

    pub fn id(&self) -> Option<u64> {
        match self {
            NamedRef::ById { id, .. } => Some(*id),
            NamedRef::ByName(_) => None,
        }
    }

    /// Trims the name; an `{id, name}` with a blank name degrades to the id.
    pub fn normalize(self) -> Self {
        match self {
            NamedRef::ById { id, name } => {
                let name = name.trim();
                if name.is_empty() {
                    NamedRef::ById { id, name: id.to_string() }
                } else {
                    NamedRef::ById { id, name: name.to_string() }
                }
            }
            NamedRef::ByName(name) => NamedRef::ByName(name.trim().to_string()),
        }
    }

    /// Case-insensitive match against the name, or exact match against the id.
    pub fn matches(&self, value: &str) -> bool {
        let value = value.trim();
        if self.name().eq_ignore_ascii_case(value) {
            return true;
        }
        self.id().map(|id| id.to_string() == value).unwrap_or(false)
    }
}

impl From<&str> for NamedRef {
    fn from(name: &str) -> Self {
        NamedRef::ByName(name.to_string())
    }
}

pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
