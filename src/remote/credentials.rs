use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::engine::LocalStorage;
use crate::{Result, TokenProvider};

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key of the signed-in user.
pub const USER_KEY: &str = "auth_user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Token and current user kept under well-known keys in [`LocalStorage`].
///
/// Both are written and cleared together.
pub struct CredentialStore {
    storage: Arc<LocalStorage>,
}

impl CredentialStore {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self { storage }
    }

    pub fn store(&self, token: &str, user: &AuthUser) -> Result<()> {
        let user_json = serde_json::to_string(user)?;
        self.storage.set_item(TOKEN_KEY, token)?;
        if let Err(e) = self.storage.set_item(USER_KEY, &user_json) {
            self.storage.remove_item(TOKEN_KEY);
            return Err(e);
        }
        Ok(())
    }

    pub fn user(&self) -> Option<AuthUser> {
        let raw = self.storage.get_item(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Stored user record is unreadable: {}", e);
                None
            }
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.storage.get_item(TOKEN_KEY).is_some()
    }
}

impl TokenProvider for CredentialStore {
    fn token(&self) -> Option<String> {
        self.storage.get_item(TOKEN_KEY)
    }

    fn clear(&self) {
        self.storage.remove_item(TOKEN_KEY);
        self.storage.remove_item(USER_KEY);
    }
}
