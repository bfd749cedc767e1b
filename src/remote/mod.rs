//! Client side of the remote content backend.

pub mod auth;
pub mod backend;
pub mod client;
pub mod credentials;
pub mod fetch;

pub use auth::{AuthClient, AuthResponse, SignInRequest, SignUpRequest};
pub use backend::{RemoteBackend, RemoteCollection, RemoteSingleton};
pub use client::HttpClient;
pub use credentials::{AuthUser, CredentialStore};
pub use fetch::HttpImageFetcher;
