use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use log::info;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::engine::LocalStorage;
use crate::remote::{AuthResponse, AuthUser, SignInRequest, SignUpRequest};
use crate::{Error, Result};

/// Storage key of the server's user table.
pub const USERS_KEY: &str = "server_users";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: u64,
    name: String,
    email: String,
    password_hash: String,
}

impl UserRecord {
    fn public(&self) -> AuthUser {
        AuthUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Users persisted in [`LocalStorage`] plus in-memory bearer sessions.
///
/// Sessions do not survive a restart; clients see a 401 and sign in again.
pub struct Sessions {
    storage: Arc<LocalStorage>,
    tokens: RwLock<HashMap<String, AuthUser>>,
    /// Held across the read-modify-write of the user table.
    users_lock: Mutex<()>,
}

impl Sessions {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self {
            storage,
            tokens: RwLock::new(HashMap::new()),
            users_lock: Mutex::new(()),
        }
    }

    fn users(&self) -> Result<Vec<UserRecord>> {
        match self.storage.get_item(USERS_KEY) {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn issue(&self, user: AuthUser) -> AuthResponse {
        let token = uuid::Uuid::new_v4().to_string();
        self.tokens
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token.clone(), user.clone());
        AuthResponse { token, user }
    }

    fn add_user(&self, name: &str, email: &str, password: &str) -> Result<AuthUser> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(Error::Validation("email and password are required".to_string()));
        }
        let _guard = self.users_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut users = self.users()?;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(Error::Conflict(format!("{} is already registered", email)));
        }
        let record = UserRecord {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            name: name.trim().to_string(),
            email: email.to_string(),
            password_hash: hash_password(password),
        };
        let user = record.public();
        users.push(record);
        self.storage.set_item(USERS_KEY, &serde_json::to_string(&users)?)?;
        Ok(user)
    }

    pub fn sign_up(&self, req: SignUpRequest) -> Result<AuthResponse> {
        let user = self.add_user(&req.name, &req.email, &req.password)?;
        info!("Registered user {}", user.email);
        Ok(self.issue(user))
    }

    pub fn sign_in(&self, req: SignInRequest) -> Result<AuthResponse> {
        let hash = hash_password(&req.password);
        let user = self
            .users()?
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(req.email.trim()) && u.password_hash == hash)
            .ok_or_else(|| Error::Unauthorized("invalid email or password".to_string()))?;
        Ok(self.issue(user.public()))
    }

    /// Creates the user unless the email is already registered.
    pub fn ensure_user(&self, name: &str, email: &str, password: &str) -> Result<()> {
        match self.add_user(name, email, password) {
            Ok(_) | Err(Error::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Resolves an `Authorization` header value to its session user.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<AuthUser> {
        let token = authorization
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Unauthorized("missing bearer token".to_string()))?;
        self.tokens
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(token)
            .cloned()
            .ok_or_else(|| Error::Unauthorized("unknown or expired token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DEFAULT_QUOTA;

    fn sessions() -> Sessions {
        Sessions::new(Arc::new(LocalStorage::in_memory(DEFAULT_QUOTA)))
    }

    fn signup(email: &str) -> SignUpRequest {
        SignUpRequest {
            name: "Admin".to_string(),
            email: email.to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[test]
    fn test_sign_up_then_authenticate() {
        let s = sessions();
        let resp = s.sign_up(signup("a@example.com")).unwrap();
        let header = format!("Bearer {}", resp.token);
        assert_eq!(s.authenticate(Some(&header)).unwrap(), resp.user);
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let s = sessions();
        s.sign_up(signup("a@example.com")).unwrap();
        assert!(matches!(s.sign_up(signup("A@example.com")), Err(Error::Conflict(_))));
        assert!(s.ensure_user("Admin", "a@example.com", "x").is_ok());
    }

    #[test]
    fn test_sign_in_checks_password() {
        let s = sessions();
        s.sign_up(signup("a@example.com")).unwrap();
        let ok = SignInRequest { email: "a@example.com".to_string(), password: "hunter2".to_string() };
        let bad = SignInRequest { email: "a@example.com".to_string(), password: "nope".to_string() };
        assert!(s.sign_in(ok).is_ok());
        assert!(matches!(s.sign_in(bad), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_concurrent_sign_ups_keep_every_user() {
        let s = sessions();
        std::thread::scope(|scope| {
            for i in 0..16 {
                let s = &s;
                scope.spawn(move || s.sign_up(signup(&format!("user{}@example.com", i))).unwrap());
            }
        });

        let users = s.users().unwrap();
        assert_eq!(users.len(), 16);
        let mut ids: Vec<u64> = users.iter().map(|u| u.id).collect();
        ids.sort();
        assert_eq!(ids, (1..=16).collect::<Vec<u64>>());
    }

    #[test]
    fn test_rejects_missing_or_unknown_tokens() {
        let s = sessions();
        assert!(s.authenticate(None).is_err());
        assert!(s.authenticate(Some("Bearer ")).is_err());
        assert!(s.authenticate(Some("Bearer not-a-session")).is_err());
    }
}
