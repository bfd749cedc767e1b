//! Portfolio Store is the persistence and API layer behind a personal portfolio CMS.
//!
//! It keeps uploaded images as compressed, encoded blobs in a capacity-bounded
//! key-value store and routes every content operation either to an in-process
//! mock backend (persisted in the same store) or to a remote HTTP backend.
//!
//! ## Core Components
//! - [`engine`]: The storage substrate, image codec, asset store and path resolver.
//! - [`mock`]: The simulated content backend with injected latency.
//! - [`remote`]: The HTTP client, credentials and remote backend.
//! - [`api`]: Per-content-type facades that dispatch to mock or remote.
//! - [`sdk`]: Wiring from [`config::Config`] to a ready-to-use [`sdk::Portfolio`].
//! - [`server`]: A reference HTTP content server speaking the remote protocol.

pub mod api;
pub mod config;
pub mod engine;
pub mod mock;
pub mod model;
pub mod remote;
pub mod sdk;
pub mod server;

use async_trait::async_trait;
use thiserror::Error;

use crate::engine::assets::{AssetEntry, AssetNamespace, EncodedAsset, PutReport};
use crate::model::{Collection, Singleton};

/// Errors returned by Portfolio Store.
#[derive(Error, Debug)]
pub enum Error {
    /// The input could not be decoded as an image.
    #[error("image decode failed: {0}")]
    Decode(String),
    /// The raster surface or the encoder for the output image could not be created.
    #[error("raster surface unavailable: {0}")]
    Surface(String),
    /// A single write would exceed the storage budget.
    #[error("storage quota exceeded writing {key}: needed {needed} bytes, {available} available")]
    QuotaExceeded { key: String, needed: usize, available: usize },
    /// An asset could not be persisted even after emergency eviction.
    #[error("storage exhausted for namespace {namespace}: {reason}")]
    StorageExhausted { namespace: String, reason: String },
    /// The requested entity or asset does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },
    /// The request could not reach the remote backend.
    #[error("network error: {0}")]
    Network(String),
    /// The request to the remote backend timed out.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The remote backend rejected the stored credentials.
    #[error("authentication expired")]
    AuthExpired,
    /// The request carried no valid bearer token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The remote backend answered with a non-success status.
    #[error("remote error {status}: {message}")]
    Remote { status: u16, message: String },
    /// The request conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The request was malformed.
    #[error("validation error: {0}")]
    Validation(String),
    /// An environment setting could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A stored asset was not valid base64.
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl Error {
    /// Builds a [`Error::NotFound`] naming the entity kind and id.
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Error::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Returns true for transport failures worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout(_))
    }
}

/// A specialized Result type for Portfolio Store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A namespaced store of encoded image assets with a retention budget per namespace.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Stores an asset, evicting older entries of the namespace as needed.
    async fn put(&self, namespace: AssetNamespace, filename: &str, asset: EncodedAsset) -> Result<PutReport>;
    /// Looks up an asset. A missing namespace or filename is `Ok(None)`.
    async fn get(&self, namespace: AssetNamespace, filename: &str) -> Result<Option<EncodedAsset>>;
    /// Lists the entries of a namespace, newest first.
    async fn list_namespace(&self, namespace: AssetNamespace) -> Result<Vec<AssetEntry>>;
    /// Drops every entry of a namespace.
    async fn clear_namespace(&self, namespace: AssetNamespace) -> Result<()>;
}

/// CRUD and query operations over a collection of content entities.
#[async_trait]
pub trait CollectionBackend<E: Collection>: Send + Sync {
    /// Returns every entity.
    async fn list(&self) -> Result<Vec<E>>;
    /// Returns one entity or [`Error::NotFound`].
    async fn get(&self, id: u64) -> Result<E>;
    /// Creates an entity; the backend assigns the id.
    async fn create(&self, draft: E::Draft) -> Result<E>;
    /// Merges a partial update into an existing entity.
    async fn update(&self, id: u64, patch: E::Patch) -> Result<E>;
    /// Removes an entity.
    async fn delete(&self, id: u64) -> Result<()>;
    /// Case-insensitive free-text search.
    async fn search(&self, query: &str) -> Result<Vec<E>>;
    /// Returns the entities matching a type-specific filter.
    async fn filter(&self, filter: E::Filter) -> Result<Vec<E>>;
}

/// Read and merge operations for single-document content such as the home page.
#[async_trait]
pub trait SingletonBackend<D: Singleton>: Send + Sync {
    /// Returns the current document.
    async fn fetch(&self) -> Result<D>;
    /// Merges the patch over the current document and returns what was stored.
    async fn update(&self, patch: D::Patch) -> Result<D>;
}

/// Supplies the bearer token for authenticated requests.
pub trait TokenProvider: Send + Sync {
    /// Returns the current token, if signed in.
    fn token(&self) -> Option<String>;
    /// Forgets the token and any associated user.
    fn clear(&self);
}
