use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::mock::{MockCollection, MockSingleton};
use crate::model::{Collection, Singleton};
use crate::remote::auth::{SIGN_IN_ENDPOINT, SIGN_UP_ENDPOINT};
use crate::remote::{AuthResponse, SignInRequest, SignUpRequest};
use crate::server::{ServerState, Sessions};
use crate::{CollectionBackend, Error, Result, SingletonBackend};

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Error::NotFound { .. } => (StatusCode::NOT_FOUND, "NotFound"),
            Error::Unauthorized(_) | Error::AuthExpired => (StatusCode::UNAUTHORIZED, "AuthenticationRequired"),
            Error::Validation(_) | Error::Decode(_) | Error::Serialization(_) => {
                (StatusCode::BAD_REQUEST, "InvalidRequest")
            }
            Error::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            Error::QuotaExceeded { .. } | Error::StorageExhausted { .. } => {
                (StatusCode::INSUFFICIENT_STORAGE, "StorageFull")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError"),
        };
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

fn authorize(sessions: &Sessions, headers: &HeaderMap) -> Result<()> {
    let value = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    sessions.authenticate(value).map(|_| ())
}

struct CollectionState<E: Collection> {
    backend: Arc<MockCollection<E>>,
    sessions: Arc<Sessions>,
}

impl<E: Collection> Clone for CollectionState<E> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

struct SingletonState<D: Singleton> {
    backend: Arc<MockSingleton<D>>,
    sessions: Arc<Sessions>,
}

impl<D: Singleton> Clone for SingletonState<D> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

/// `?search=` wins over filter parameters; no parameters lists everything.
async fn list_items<E: Collection>(
    State(state): State<CollectionState<E>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<E>>> {
    let items = if let Some(query) = params.get("search") {
        state.backend.search(query).await?
    } else if let Some(filter) = E::filter_from_params(&params) {
        state.backend.filter(filter).await?
    } else {
        state.backend.list().await?
    };
    Ok(Json(items))
}

async fn get_item<E: Collection>(
    State(state): State<CollectionState<E>>,
    Path(id): Path<u64>,
) -> Result<Json<E>> {
    Ok(Json(state.backend.get(id).await?))
}

async fn create_item<E: Collection>(
    State(state): State<CollectionState<E>>,
    headers: HeaderMap,
    Json(draft): Json<E::Draft>,
) -> Result<(StatusCode, Json<E>)> {
    authorize(&state.sessions, &headers)?;
    let created = state.backend.create(draft).await?;
    info!("Created {} {}", E::NAME, created.id());
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_item<E: Collection>(
    State(state): State<CollectionState<E>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(patch): Json<E::Patch>,
) -> Result<Json<E>> {
    authorize(&state.sessions, &headers)?;
    Ok(Json(state.backend.update(id, patch).await?))
}

async fn delete_item<E: Collection>(
    State(state): State<CollectionState<E>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    authorize(&state.sessions, &headers)?;
    state.backend.delete(id).await?;
    info!("Deleted {} {}", E::NAME, id);
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_document<D: Singleton>(State(state): State<SingletonState<D>>) -> Result<Json<D>> {
    Ok(Json(state.backend.fetch().await?))
}

async fn merge_document<D: Singleton>(
    State(state): State<SingletonState<D>>,
    headers: HeaderMap,
    Json(patch): Json<D::Patch>,
) -> Result<Json<D>> {
    authorize(&state.sessions, &headers)?;
    Ok(Json(state.backend.update(patch).await?))
}

async fn sign_in(State(sessions): State<Arc<Sessions>>, Json(req): Json<SignInRequest>) -> Result<Json<AuthResponse>> {
    Ok(Json(sessions.sign_in(req)?))
}

async fn sign_up(
    State(sessions): State<Arc<Sessions>>,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    Ok((StatusCode::CREATED, Json(sessions.sign_up(req)?)))
}

async fn unknown_route() -> Error {
    Error::not_found("route", "unknown endpoint")
}

fn collection_routes<E: Collection>(backend: Arc<MockCollection<E>>, sessions: Arc<Sessions>) -> Router {
    let item_path = format!("{}/:id", E::ENDPOINT);
    Router::new()
        .route(E::ENDPOINT, get(list_items::<E>).post(create_item::<E>))
        .route(
            &item_path,
            get(get_item::<E>).put(update_item::<E>).delete(delete_item::<E>),
        )
        .with_state(CollectionState { backend, sessions })
}

fn singleton_routes<D: Singleton>(backend: Arc<MockSingleton<D>>, sessions: Arc<Sessions>) -> Router {
    Router::new()
        .route(D::ENDPOINT, get(fetch_document::<D>).put(merge_document::<D>))
        .with_state(SingletonState { backend, sessions })
}

/// Builds the HTTP routes of the content server.
///
/// Reads are public. Every write needs `Authorization: Bearer <token>` from
/// a prior sign-in or sign-up.
pub fn router(state: &ServerState) -> Router {
    let content = &state.content;
    let sessions = state.sessions.clone();
    let auth = Router::new()
        .route(SIGN_IN_ENDPOINT, post(sign_in))
        .route(SIGN_UP_ENDPOINT, post(sign_up))
        .with_state(sessions.clone());

    Router::new()
        .merge(collection_routes(content.blog.clone(), sessions.clone()))
        .merge(collection_routes(content.projects.clone(), sessions.clone()))
        .merge(singleton_routes(content.home.clone(), sessions.clone()))
        .merge(singleton_routes(content.contact.clone(), sessions.clone()))
        .merge(singleton_routes(content.about.clone(), sessions))
        .merge(auth)
        .fallback(unknown_route)
}

/// Serves [`router`] on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: &ServerState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("Portfolio content server listening on {}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
