use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::remote::{AuthUser, CredentialStore, HttpClient};
use crate::{Result, TokenProvider};

pub const SIGN_IN_ENDPOINT: &str = "/api/auth/signin";
pub const SIGN_UP_ENDPOINT: &str = "/api/auth/signup";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}

/// Sign-in, sign-up and sign-out against the remote backend.
pub struct AuthClient {
    http: Arc<HttpClient>,
    credentials: Arc<CredentialStore>,
}

impl AuthClient {
    pub fn new(http: Arc<HttpClient>, credentials: Arc<CredentialStore>) -> Self {
        Self { http, credentials }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let req = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.http.post(SIGN_IN_ENDPOINT, &req, false).await?;
        self.credentials.store(&resp.token, &resp.user)?;
        Ok(resp.user)
    }

    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<AuthUser> {
        let req = SignUpRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.http.post(SIGN_UP_ENDPOINT, &req, false).await?;
        self.credentials.store(&resp.token, &resp.user)?;
        Ok(resp.user)
    }

    pub fn sign_out(&self) {
        self.credentials.clear();
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.credentials.user()
    }
}
