use std::sync::Arc;

use crate::api::{ApiModeConfig, ApiOptions, ContentService, FallbackPolicy, SingletonService};
use crate::mock::MockBackend;
use crate::model::{
    AboutMe, AboutMePatch, BlogPost, BlogPostDraft, BlogPostPatch, ContactInfo, ContactInfoPatch, HomeContent,
    HomeContentPatch, Project, ProjectDraft, ProjectPatch,
};
use crate::remote::RemoteBackend;
use crate::{CollectionBackend, Result, SingletonBackend};

/// One implementation of every content store.
#[derive(Clone)]
pub struct Backends {
    pub blog: Arc<dyn CollectionBackend<BlogPost>>,
    pub projects: Arc<dyn CollectionBackend<Project>>,
    pub home: Arc<dyn SingletonBackend<HomeContent>>,
    pub contact: Arc<dyn SingletonBackend<ContactInfo>>,
    pub about: Arc<dyn SingletonBackend<AboutMe>>,
}

impl From<&MockBackend> for Backends {
    fn from(m: &MockBackend) -> Self {
        Self {
            blog: m.blog.clone(),
            projects: m.projects.clone(),
            home: m.home.clone(),
            contact: m.contact.clone(),
            about: m.about.clone(),
        }
    }
}

impl From<&RemoteBackend> for Backends {
    fn from(r: &RemoteBackend) -> Self {
        Self {
            blog: r.blog.clone(),
            projects: r.projects.clone(),
            home: r.home.clone(),
            contact: r.contact.clone(),
            about: r.about.clone(),
        }
    }
}

/// Entry point for every content operation.
///
/// All services share one [`ApiModeConfig`], so [`ApiGateway::configure`]
/// switches them together.
pub struct ApiGateway {
    mode: ApiModeConfig,
    pub blog: ContentService<BlogPost>,
    pub projects: ContentService<Project>,
    pub home: SingletonService<HomeContent>,
    pub contact: SingletonService<ContactInfo>,
    pub about: SingletonService<AboutMe>,
}

impl ApiGateway {
    pub fn new(mode: ApiModeConfig, fallback: FallbackPolicy, mock: Backends, remote: Backends) -> Self {
        Self {
            blog: ContentService::new(mode.clone(), fallback.clone(), mock.blog, remote.blog),
            projects: ContentService::new(mode.clone(), fallback.clone(), mock.projects, remote.projects),
            home: SingletonService::new(mode.clone(), fallback.clone(), mock.home, remote.home),
            contact: SingletonService::new(mode.clone(), fallback.clone(), mock.contact, remote.contact),
            about: SingletonService::new(mode.clone(), fallback, mock.about, remote.about),
            mode,
        }
    }

    pub fn mode(&self) -> &ApiModeConfig {
        &self.mode
    }

    /// Switches every service between mock and remote; returns the effective mode.
    pub fn configure(&self, options: ApiOptions) -> bool {
        self.mode.configure(options)
    }

    pub async fn get_home_content(&self) -> Result<HomeContent> {
        self.home.get().await
    }

    pub async fn update_home_content(&self, patch: HomeContentPatch) -> Result<HomeContent> {
        self.home.update(patch).await
    }

    pub async fn get_about_content(&self) -> Result<AboutMe> {
        self.about.get().await
    }

    pub async fn update_about_content(&self, patch: AboutMePatch) -> Result<AboutMe> {
        self.about.update(patch).await
    }

    pub async fn get_contact_info(&self) -> Result<ContactInfo> {
        self.contact.get().await
    }

    pub async fn update_contact_info(&self, patch: ContactInfoPatch) -> Result<ContactInfo> {
        self.contact.update(patch).await
    }

    pub async fn get_blog_posts(&self) -> Result<Vec<BlogPost>> {
        self.blog.get_all().await
    }

    pub async fn get_blog_post(&self, id: u64) -> Result<BlogPost> {
        self.blog.get_by_id(id).await
    }

    pub async fn create_blog_post(&self, draft: BlogPostDraft) -> Result<BlogPost> {
        self.blog.create(draft).await
    }

    pub async fn update_blog_post(&self, id: u64, patch: BlogPostPatch) -> Result<BlogPost> {
        self.blog.update(id, patch).await
    }

    pub async fn delete_blog_post(&self, id: u64) -> Result<()> {
        self.blog.delete(id).await
    }

    pub async fn search_blog_posts(&self, query: &str) -> Result<Vec<BlogPost>> {
        self.blog.search(query).await
    }

    pub async fn get_blog_posts_by_category(&self, category: &str) -> Result<Vec<BlogPost>> {
        self.blog.get_by_category(category).await
    }

    pub async fn get_blog_posts_by_author(&self, author: &str) -> Result<Vec<BlogPost>> {
        self.blog.get_by_author(author).await
    }

    pub async fn get_projects(&self) -> Result<Vec<Project>> {
        self.projects.get_all().await
    }

    pub async fn get_project(&self, id: u64) -> Result<Project> {
        self.projects.get_by_id(id).await
    }

    pub async fn create_project(&self, draft: ProjectDraft) -> Result<Project> {
        self.projects.create(draft).await
    }

    pub async fn update_project(&self, id: u64, patch: ProjectPatch) -> Result<Project> {
        self.projects.update(id, patch).await
    }

    pub async fn delete_project(&self, id: u64) -> Result<()> {
        self.projects.delete(id).await
    }

    pub async fn get_projects_by_tag(&self, tag: &str) -> Result<Vec<Project>> {
        self.projects.get_by_tag(tag).await
    }
}
