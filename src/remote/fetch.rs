use async_trait::async_trait;
use log::debug;

use crate::engine::ImageFetcher;
use crate::remote::HttpClient;

/// Checks image URLs with a `GET`; relative sources resolve against the API base URL.
pub struct HttpImageFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpImageFetcher {
    pub fn new(http: &HttpClient) -> Self {
        Self {
            client: http.inner().clone(),
            base_url: http.base_url().to_string(),
        }
    }

    fn absolute(&self, src: &str) -> String {
        if src.starts_with("http://") || src.starts_with("https://") {
            src.to_string()
        } else if src.starts_with('/') {
            format!("{}{}", self.base_url, src)
        } else {
            format!("{}/{}", self.base_url, src)
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn is_loadable(&self, src: &str) -> bool {
        if src.starts_with("data:image/") {
            return true;
        }
        if src.trim().is_empty() {
            return false;
        }
        let url = self.absolute(src);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Image check for {} failed: {}", url, e);
                false
            }
        }
    }
}
