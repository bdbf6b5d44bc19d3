use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::error::{json_or_error, ClientError};
use crate::session::{Session, SessionStore};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub password_confirm: String,
}

/// Pre-network checks; validation failures surface immediately and are
/// never sent to the server.
pub fn validate_registration(r: &Registration) -> Result<(), ClientError> {
    if r.name.trim().is_empty()
        || r.email.trim().is_empty()
        || r.phone.trim().is_empty()
        || r.password.is_empty()
        || r.password_confirm.is_empty()
    {
        return Err(ClientError::validation("Please fill in all fields"));
    }
    let digits = r.phone.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < 7 {
        return Err(ClientError::validation("Please enter a valid phone number"));
    }
    if r.password != r.password_confirm {
        return Err(ClientError::validation("Passwords do not match"));
    }
    Ok(())
}

/// Client for the auth API. Successful responses are normalized through the
/// session adapter and persisted so every later call can read the token.
pub struct AuthClient {
    http: Client,
    base_url: String,
    sessions: SessionStore,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, sessions: SessionStore) -> Self {
        let base_url: String = base_url.into();
        AuthClient {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            sessions,
        }
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<Session, ClientError> {
        if identifier.trim().is_empty() || password.is_empty() {
            return Err(ClientError::validation("Please fill in all fields"));
        }
        let resp = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&LoginRequest {
                identifier: identifier.trim(),
                password,
            })
            .send()
            .await?;
        let body = json_or_error(resp).await?;
        let session = Session::from_value(&body).ok_or(ClientError::Malformed("auth response"))?;
        self.sessions.save(&session)?;
        info!(user = %session.user.name, "logged in");
        Ok(session)
    }

    pub async fn register(&self, registration: &Registration) -> Result<Session, ClientError> {
        validate_registration(registration)?;
        let resp = self
            .http
            .post(format!("{}/auth/register", self.base_url))
            .json(&RegisterRequest {
                name: registration.name.trim(),
                email: registration.email.trim(),
                phone: registration.phone.trim(),
                password: &registration.password,
            })
            .send()
            .await?;
        let body = json_or_error(resp).await?;
        let session = Session::from_value(&body).ok_or(ClientError::Malformed("auth response"))?;
        self.sessions.save(&session)?;
        info!(user = %session.user.name, "registered");
        Ok(session)
    }

    pub fn logout(&self) {
        self.sessions.clear();
    }
}
