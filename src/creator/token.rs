use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use super::{ForwardError, describe};
use crate::config::CreatorConfig;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A bearer token and the instant it stops being usable.
#[derive(Clone, PartialEq)]
pub struct Credential {
    pub token: String,
    pub expiry: DateTime<Utc>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

struct RefreshGrant {
    url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    refresh_token: String,
}

/// Lazily refreshed access token.
///
/// The lock is held across the refresh so concurrent callers wait for one
/// exchange instead of each starting their own.
pub struct TokenCache {
    http: reqwest::Client,
    grant: RefreshGrant,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<Credential>>,
}

impl TokenCache {
    pub fn new(http: reqwest::Client, config: &CreatorConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            http,
            grant: RefreshGrant {
                url: config.token_url.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                redirect_uri: config.redirect_uri.clone(),
                refresh_token: config.refresh_token.clone(),
            },
            clock,
            cached: Mutex::new(None),
        }
    }

    /// Return the cached credential while it is unexpired, otherwise refresh.
    pub async fn get_valid_token(&self) -> Result<Credential, ForwardError> {
        let mut cached = self.cached.lock().await;

        if let Some(credential) = cached.as_ref() {
            if self.clock.now() < credential.expiry {
                return Ok(credential.clone());
            }
        }

        let credential = self.refresh().await?;
        *cached = Some(credential.clone());
        Ok(credential)
    }

    /// Drop the cached credential so the next call refreshes.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn refresh(&self) -> Result<Credential, ForwardError> {
        tracing::debug!("Refreshing Creator access token");

        let resp = self
            .http
            .post(&self.grant.url)
            .query(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.grant.client_id.as_str()),
                ("client_secret", self.grant.client_secret.as_str()),
                ("redirect_uri", self.grant.redirect_uri.as_str()),
                ("refresh_token", self.grant.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Token request failed: {e}");
                ForwardError::Auth(format!("token request failed: {e}"))
            })?;

        let status = resp.status();
        let body: Value = resp.json().await.map_err(|e| {
            ForwardError::Auth(format!("unreadable token response (HTTP {status}): {e}"))
        })?;

        let Some(token) = body
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
        else {
            let detail = body.get("error").map(describe).unwrap_or_default();
            tracing::error!(%status, "Access token missing from token response: {detail}");
            return Err(ForwardError::Auth(format!(
                "access token not found in the response {detail}"
            )
            .trim_end()
            .to_string()));
        };

        // The expiry has to land strictly in the future and be representable.
        let lifetime = expires_in_secs(&body).filter(|secs| *secs > 0);
        let Some(expiry) = lifetime
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| self.clock.now().checked_add_signed(delta))
        else {
            let raw = body.get("expires_in").map(describe).unwrap_or_default();
            tracing::error!(%status, expires_in = %raw, "Token response has no usable lifetime");
            return Err(ForwardError::Auth(format!(
                "invalid token lifetime in the response: {raw:?}"
            )));
        };
        let lifetime = lifetime.unwrap_or_default();
        let credential = Credential {
            token: token.to_string(),
            expiry,
        };

        tracing::info!(expires_in = lifetime, "Creator access token refreshed");
        Ok(credential)
    }
}

/// `expires_in` as seconds; some deployments send it as a string.
fn expires_in_secs(body: &Value) -> Option<i64> {
    match body.get("expires_in")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
