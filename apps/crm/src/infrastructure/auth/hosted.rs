// Hosted auth provider client
// Talks to a GoTrue-style REST API under `<base>/auth/v1`

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::verify_token;
use crate::auth::{AuthFailure, AuthProvider, AuthSession};

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct UserResponse {
    id: Uuid,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    user: UserResponse,
}

/// Signup answers with a bare user, or with a session when email
/// confirmation is off
#[derive(Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    user: Option<UserResponse>,
}

/// HTTP client for the hosted auth provider
///
/// Every request carries the public API key. When a JWT secret is
/// configured, access tokens are resolved locally instead of over the wire.
pub struct HostedAuthProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    jwt_secret: Option<String>,
}

impl HostedAuthProvider {
    /// Create a new client with the given base URL and timeout
    pub fn new(
        base_url: &str,
        api_key: &str,
        jwt_secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build auth client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            jwt_secret,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthProvider for HostedAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthFailure> {
        let resp = self
            .client
            .post(self.url("/token?grant_type=password"))
            .header("apikey", self.api_key.as_str())
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(transport)?;
        let token: TokenResponse = parse_response(resp).await?;

        Ok(AuthSession {
            user_id: token.user.id,
            access_token: token.access_token,
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Uuid, AuthFailure> {
        let resp = self
            .client
            .post(self.url("/signup"))
            .header("apikey", self.api_key.as_str())
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(transport)?;
        let created: SignUpResponse = parse_response(resp).await?;

        created
            .id
            .or(created.user.map(|user| user.id))
            .ok_or_else(|| AuthFailure::Unavailable("Signup response carried no user id".to_string()))
    }

    async fn resolve(&self, access_token: &str) -> Result<Uuid, AuthFailure> {
        if let Some(secret) = &self.jwt_secret {
            return verify_token(access_token, secret)
                .map(|claims| claims.sub)
                .map_err(AuthFailure::Rejected);
        }

        let resp = self
            .client
            .get(self.url("/user"))
            .header("apikey", self.api_key.as_str())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport)?;
        let user: UserResponse = parse_response(resp).await?;
        Ok(user.id)
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthFailure> {
        let resp = self
            .client
            .post(self.url("/logout"))
            .header("apikey", self.api_key.as_str())
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify(status, &body));
        }
        Ok(())
    }
}

fn transport(e: reqwest::Error) -> AuthFailure {
    AuthFailure::Unavailable(e.to_string())
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, AuthFailure> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(classify(status, &body));
    }
    resp.json()
        .await
        .map_err(|e| AuthFailure::Unavailable(format!("Malformed auth response: {}", e)))
}

/// Client errors are refusals; everything else means the provider is unwell
fn classify(status: StatusCode, body: &str) -> AuthFailure {
    let message = error_message(body).unwrap_or_else(|| format!("{}: {}", status, body));
    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        AuthFailure::Rejected(message)
    } else {
        AuthFailure::Unavailable(message)
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
