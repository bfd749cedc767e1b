use std::sync::Arc;
use std::time::Duration;

use log::warn;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::HttpConfig;
use crate::{Error, Result, TokenProvider};

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn classify(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else if e.is_builder() {
        Error::Internal(e.to_string())
    } else {
        Error::Network(e.to_string())
    }
}

/// JSON-over-HTTP client for the remote content backend.
///
/// Every request is bounded by the configured timeout. Timeouts and network
/// failures are retried up to `max_retries` times with a linearly growing
/// pause; HTTP error statuses are returned immediately. A 401 on a request
/// that carried a token purges the stored credentials before surfacing
/// [`Error::AuthExpired`]; on an anonymous request, such as a sign-in with a
/// wrong password, it is [`Error::Unauthorized`] and the session is kept.
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
    config: HttpConfig,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpClient {
    pub fn new(base_url: &str, config: HttpConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            config,
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.config.retry_backoff * attempt
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
        authenticated: bool,
    ) -> Result<reqwest::Response> {
        let url = self.url(endpoint);
        let token = if authenticated { self.tokens.token() } else { None };
        let mut attempt = 0;
        loop {
            let mut req = self
                .client
                .request(method.clone(), &url)
                .timeout(self.config.timeout);
            if let Some(b) = &body {
                req = req.json(b);
            }
            if let Some(token) = &token {
                req = req.bearer_auth(token);
            }

            let err = match req.send().await {
                Ok(resp) => return self.check(resp, token.is_some()).await,
                Err(e) => classify(e),
            };
            if !err.is_transient() || attempt >= self.config.max_retries {
                return Err(err);
            }
            attempt += 1;
            let wait = self.backoff(attempt);
            warn!(
                "{} {} failed: {}; retry {}/{} in {:?}",
                method, url, err, attempt, self.config.max_retries, wait
            );
            tokio::time::sleep(wait).await;
        }
    }

    async fn check(&self, resp: reqwest::Response, sent_token: bool) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED && sent_token {
            warn!("{} rejected credentials; signing out", resp.url());
            self.tokens.clear();
            return Err(Error::AuthExpired);
        }
        let path = resp.url().path().to_string();
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or(text);
        match status {
            StatusCode::UNAUTHORIZED => Err(Error::Unauthorized(message)),
            StatusCode::NOT_FOUND => Err(Error::not_found("resource", path)),
            _ => Err(Error::Remote {
                status: status.as_u16(),
                message,
            }),
        }
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let bytes = resp.bytes().await.map_err(classify)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, authenticated: bool) -> Result<T> {
        let resp = self.send(Method::GET, endpoint, None, authenticated).await?;
        Self::decode(resp).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        authenticated: bool,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        let resp = self.send(Method::POST, endpoint, Some(body), authenticated).await?;
        Self::decode(resp).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        authenticated: bool,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        let resp = self.send(Method::PUT, endpoint, Some(body), authenticated).await?;
        Self::decode(resp).await
    }

    pub async fn delete(&self, endpoint: &str, authenticated: bool) -> Result<()> {
        self.send(Method::DELETE, endpoint, None, authenticated).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{LocalStorage, DEFAULT_QUOTA};
    use crate::remote::{AuthUser, CredentialStore};
    use axum::extract::State;
    use axum::routing::get;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client(base: &str, retries: u32) -> HttpClient {
        let creds = Arc::new(CredentialStore::new(Arc::new(LocalStorage::in_memory(DEFAULT_QUOTA))));
        let config = HttpConfig {
            timeout: Duration::from_millis(500),
            max_retries: retries,
            retry_backoff: Duration::from_millis(10),
        };
        HttpClient::new(base, config, creds).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let c = client("http://localhost:8080/", 0);
        assert_eq!(c.url("/api/home"), "http://localhost:8080/api/home");
    }

    #[test]
    fn test_linear_backoff() {
        let c = client("http://localhost", 3);
        assert_eq!(c.backoff(1), Duration::from_millis(10));
        assert_eq!(c.backoff(3), Duration::from_millis(30));
    }

    #[derive(Default)]
    struct Hits {
        failing: AtomicUsize,
        slow: AtomicUsize,
    }

    async fn spawn_counting_server() -> (String, Arc<Hits>) {
        let hits = Arc::new(Hits::default());
        let app = axum::Router::new()
            .route(
                "/fail",
                get(|State(h): State<Arc<Hits>>| async move {
                    h.failing.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":"boom"}"#)
                }),
            )
            .route(
                "/slow",
                get(|State(h): State<Arc<Hits>>| async move {
                    h.slow.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(400)).await;
                    "{}"
                }),
            )
            .route("/locked", get(|| async { (StatusCode::UNAUTHORIZED, r#"{"message":"bad credentials"}"#) }))
            .with_state(hits.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{}", addr), hits)
    }

    fn signed_in_client(base: &str, config: HttpConfig) -> (HttpClient, Arc<CredentialStore>) {
        let creds = Arc::new(CredentialStore::new(Arc::new(LocalStorage::in_memory(DEFAULT_QUOTA))));
        let user = AuthUser { id: 1, name: "Admin".to_string(), email: "admin@example.com".to_string() };
        creds.store("t0k3n", &user).unwrap();
        (HttpClient::new(base, config, creds.clone()).unwrap(), creds)
    }

    #[tokio::test]
    async fn test_error_status_is_not_retried() {
        let (base, hits) = spawn_counting_server().await;
        let c = client(&base, 3);
        let res: Result<serde_json::Value> = c.get("/fail", false).await;
        assert!(matches!(res, Err(Error::Remote { status: 500, ref message }) if message == "boom"));
        assert_eq!(hits.failing.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeouts_are_retried_with_linear_backoff() {
        let (base, hits) = spawn_counting_server().await;
        let config = HttpConfig {
            timeout: Duration::from_millis(100),
            max_retries: 2,
            retry_backoff: Duration::from_millis(20),
        };
        let creds = Arc::new(CredentialStore::new(Arc::new(LocalStorage::in_memory(DEFAULT_QUOTA))));
        let c = HttpClient::new(&base, config, creds).unwrap();

        let start = std::time::Instant::now();
        let res: Result<serde_json::Value> = c.get("/slow", false).await;
        assert!(matches!(res, Err(Error::Timeout(_))));
        assert_eq!(hits.slow.load(Ordering::SeqCst), 3);
        // Three timed-out attempts plus waits of 20ms and 40ms.
        assert!(start.elapsed() >= Duration::from_millis(360));
    }

    #[tokio::test]
    async fn test_401_purges_only_when_a_token_was_sent() {
        let (base, _) = spawn_counting_server().await;
        let (c, creds) = signed_in_client(&base, HttpConfig::default());

        let res: Result<serde_json::Value> = c.get("/locked", false).await;
        assert!(matches!(res, Err(Error::Unauthorized(ref m)) if m == "bad credentials"));
        assert!(creds.is_signed_in());

        let res: Result<serde_json::Value> = c.get("/locked", true).await;
        assert!(matches!(res, Err(Error::AuthExpired)));
        assert!(!creds.is_signed_in());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_error_after_retries() {
        // Port 9 (discard) on loopback is reliably closed in test environments.
        let c = client("http://127.0.0.1:9", 2);
        let res: Result<serde_json::Value> = c.get("/api/home", false).await;
        assert!(matches!(res, Err(Error::Network(_)) | Err(Error::Timeout(_))));
    }
}
