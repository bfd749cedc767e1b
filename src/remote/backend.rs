use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{AboutMe, BlogPost, Collection, ContactInfo, HomeContent, Project, Singleton};
use crate::remote::HttpClient;
use crate::{CollectionBackend, Error, Result, SingletonBackend};

fn entity_not_found(entity: &str, id: u64) -> impl FnOnce(Error) -> Error + '_ {
    move |e| match e {
        Error::NotFound { .. } => Error::not_found(entity, id),
        other => other,
    }
}

/// [`CollectionBackend`] over the REST endpoints at [`Collection::ENDPOINT`].
///
/// Reads are anonymous; writes carry the bearer token.
pub struct RemoteCollection<E> {
    http: Arc<HttpClient>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Collection> RemoteCollection<E> {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            _entity: PhantomData,
        }
    }

    fn item(id: u64) -> String {
        format!("{}/{}", E::ENDPOINT, id)
    }
}

#[async_trait]
impl<E: Collection> CollectionBackend<E> for RemoteCollection<E> {
    async fn list(&self) -> Result<Vec<E>> {
        self.http.get(E::ENDPOINT, false).await
    }

    async fn get(&self, id: u64) -> Result<E> {
        self.http
            .get(&Self::item(id), false)
            .await
            .map_err(entity_not_found(E::NAME, id))
    }

    async fn create(&self, draft: E::Draft) -> Result<E> {
        self.http.post(E::ENDPOINT, &draft, true).await
    }

    async fn update(&self, id: u64, patch: E::Patch) -> Result<E> {
        self.http
            .put(&Self::item(id), &patch, true)
            .await
            .map_err(entity_not_found(E::NAME, id))
    }

    async fn delete(&self, id: u64) -> Result<()> {
        self.http
            .delete(&Self::item(id), true)
            .await
            .map_err(entity_not_found(E::NAME, id))
    }

    async fn search(&self, query: &str) -> Result<Vec<E>> {
        let endpoint = format!("{}?search={}", E::ENDPOINT, urlencoding::encode(query));
        self.http.get(&endpoint, false).await
    }

    async fn filter(&self, filter: E::Filter) -> Result<Vec<E>> {
        let (key, value) = E::filter_param(&filter);
        let endpoint = format!("{}?{}={}", E::ENDPOINT, key, urlencoding::encode(&value));
        self.http.get(&endpoint, false).await
    }
}

/// [`SingletonBackend`] over `GET`/`PUT` at [`Singleton::ENDPOINT`].
pub struct RemoteSingleton<D> {
    http: Arc<HttpClient>,
    _doc: PhantomData<fn() -> D>,
}

impl<D: Singleton> RemoteSingleton<D> {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            _doc: PhantomData,
        }
    }
}

#[async_trait]
impl<D: Singleton> SingletonBackend<D> for RemoteSingleton<D> {
    async fn fetch(&self) -> Result<D> {
        self.http.get(D::ENDPOINT, false).await
    }

    async fn update(&self, patch: D::Patch) -> Result<D> {
        self.http.put(D::ENDPOINT, &patch, true).await
    }
}

/// Every remote content store sharing one [`HttpClient`].
pub struct RemoteBackend {
    pub http: Arc<HttpClient>,
    pub blog: Arc<RemoteCollection<BlogPost>>,
    pub projects: Arc<RemoteCollection<Project>>,
    pub home: Arc<RemoteSingleton<HomeContent>>,
    pub contact: Arc<RemoteSingleton<ContactInfo>>,
    pub about: Arc<RemoteSingleton<AboutMe>>,
}

impl RemoteBackend {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            blog: Arc::new(RemoteCollection::new(http.clone())),
            projects: Arc::new(RemoteCollection::new(http.clone())),
            home: Arc::new(RemoteSingleton::new(http.clone())),
            contact: Arc::new(RemoteSingleton::new(http.clone())),
            about: Arc::new(RemoteSingleton::new(http.clone())),
            http,
        }
    }
}
