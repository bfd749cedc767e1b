use std::future::Future;
use std::sync::Arc;

use log::{error, warn};

use crate::api::{ApiModeConfig, FallbackPolicy, ReadOp};
use crate::model::{BlogFilter, BlogPost, Collection, Project, ProjectFilter, Singleton};
use crate::{CollectionBackend, Error, Result, SingletonBackend};

/// Runs `call` against the active backend; on a remote read failure covered
/// by `policy`, runs it again against the mock backend.
///
/// A `NotFound` from an id lookup is an answer and is returned as-is. On any
/// other read it means the endpoint itself is missing and falls back.
async fn dispatch_read<B, T, F, Fut>(
    mode: &ApiModeConfig,
    policy: &FallbackPolicy,
    op: ReadOp,
    name: &str,
    mock: &B,
    remote: &B,
    call: F,
) -> Result<T>
where
    B: Clone,
    F: Fn(B) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if mode.use_mock() {
        return call(mock.clone()).await;
    }
    match call(remote.clone()).await {
        Err(e) if policy.applies(op) && !(op == ReadOp::Get && matches!(e, Error::NotFound { .. })) => {
            warn!("Remote {} {:?} failed, serving mock data instead: {}", name, op, e);
            call(mock.clone()).await
        }
        other => other,
    }
}

fn report_write<T>(action: &str, name: &str, res: Result<T>) -> Result<T> {
    if let Err(e) = &res {
        error!("Failed to {} {}: {}", action, name, e);
    }
    res
}

/// Facade over one content collection.
///
/// Each call reads the mode flag at call time and dispatches to the mock or
/// remote backend. Only reads listed in the [`FallbackPolicy`] may be
/// answered by the mock after a remote failure; writes always propagate.
pub struct ContentService<E: Collection> {
    mode: ApiModeConfig,
    fallback: FallbackPolicy,
    mock: Arc<dyn CollectionBackend<E>>,
    remote: Arc<dyn CollectionBackend<E>>,
}

impl<E: Collection> ContentService<E> {
    pub fn new(
        mode: ApiModeConfig,
        fallback: FallbackPolicy,
        mock: Arc<dyn CollectionBackend<E>>,
        remote: Arc<dyn CollectionBackend<E>>,
    ) -> Self {
        Self { mode, fallback, mock, remote }
    }

    fn active(&self) -> &Arc<dyn CollectionBackend<E>> {
        if self.mode.use_mock() {
            &self.mock
        } else {
            &self.remote
        }
    }

    async fn read<T, F, Fut>(&self, op: ReadOp, call: F) -> Result<T>
    where
        F: Fn(Arc<dyn CollectionBackend<E>>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        dispatch_read(&self.mode, &self.fallback, op, E::NAME, &self.mock, &self.remote, call).await
    }

    pub async fn get_all(&self) -> Result<Vec<E>> {
        self.read(ReadOp::List, |b| async move { b.list().await }).await
    }

    pub async fn get_by_id(&self, id: u64) -> Result<E> {
        self.read(ReadOp::Get, move |b| async move { b.get(id).await }).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<E>> {
        let query = query.to_string();
        self.read(ReadOp::Search, move |b| {
            let query = query.clone();
            async move { b.search(&query).await }
        })
        .await
    }

    pub async fn filter(&self, filter: E::Filter) -> Result<Vec<E>> {
        self.read(ReadOp::Filter, move |b| {
            let filter = filter.clone();
            async move { b.filter(filter).await }
        })
        .await
    }

    pub async fn create(&self, draft: E::Draft) -> Result<E> {
        report_write("create", E::NAME, self.active().create(draft).await)
    }

    pub async fn update(&self, id: u64, patch: E::Patch) -> Result<E> {
        report_write("update", E::NAME, self.active().update(id, patch).await)
    }

    pub async fn delete(&self, id: u64) -> Result<()> {
        report_write("delete", E::NAME, self.active().delete(id).await)
    }
}

impl ContentService<BlogPost> {
    pub async fn get_by_category(&self, category: &str) -> Result<Vec<BlogPost>> {
        self.filter(BlogFilter::Category(category.to_string())).await
    }

    pub async fn get_by_author(&self, author: &str) -> Result<Vec<BlogPost>> {
        self.filter(BlogFilter::Author(author.to_string())).await
    }

    pub async fn get_by_tag(&self, tag: &str) -> Result<Vec<BlogPost>> {
        self.filter(BlogFilter::Tag(tag.to_string())).await
    }
}

impl ContentService<Project> {
    pub async fn get_by_tag(&self, tag: &str) -> Result<Vec<Project>> {
        self.filter(ProjectFilter::Tag(tag.to_string())).await
    }
}

/// Facade over a single-document content type.
pub struct SingletonService<D: Singleton> {
    mode: ApiModeConfig,
    fallback: FallbackPolicy,
    mock: Arc<dyn SingletonBackend<D>>,
    remote: Arc<dyn SingletonBackend<D>>,
}

impl<D: Singleton> SingletonService<D> {
    pub fn new(
        mode: ApiModeConfig,
        fallback: FallbackPolicy,
        mock: Arc<dyn SingletonBackend<D>>,
        remote: Arc<dyn SingletonBackend<D>>,
    ) -> Self {
        Self { mode, fallback, mock, remote }
    }

    pub async fn get(&self) -> Result<D> {
        dispatch_read(
            &self.mode,
            &self.fallback,
            ReadOp::Fetch,
            D::NAME,
            &self.mock,
            &self.remote,
            |b| async move { b.fetch().await },
        )
        .await
    }

    pub async fn update(&self, patch: D::Patch) -> Result<D> {
        let backend = if self.mode.use_mock() { &self.mock } else { &self.remote };
        report_write("update", D::NAME, backend.update(patch).await)
    }
}
