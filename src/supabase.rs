use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::models::SiteRecord;

/// Shared HTTP client for Supabase requests (connection pooling + timeout).
fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build supabase client")
    })
}

/// Outcome of a credentials call against the identity provider.
#[derive(Debug)]
pub enum AuthOutcome {
    /// Provider accepted the credentials: the `user` object plus the full
    /// session body (access token, refresh token, expiry).
    Success { user: Value, session: Value },
    /// Provider rejected the credentials with a human-readable message.
    Rejected(String),
}

/// Outcome of writing the site record.
#[derive(Debug)]
pub enum SaveOutcome {
    Saved,
    /// Raw error text from the store, surfaced verbatim to the caller.
    StoreError(String),
}

/// Thin client over Supabase's auth and PostgREST endpoints. Carries no
/// state of its own; the caller's bearer token travels on every data call
/// so row-level security stays in the store's hands.
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    sites_table: String,
    client: reqwest::Client,
}

impl SupabaseClient {
    /// Returns `None` when the Supabase credentials are not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        Some(Self {
            base_url: config.supabase_url.clone()?,
            anon_key: config.supabase_anon_key.clone()?,
            sites_table: config.sites_table.clone(),
            client: http_client().clone(),
        })
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<AuthOutcome> {
        let body: Value = self
            .client
            .post(format!("{}/auth/v1/signup", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Failed to reach identity provider for signup")?
            .json()
            .await
            .context("Failed to parse signup response")?;

        Ok(credentials_outcome(body, "Signup failed"))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome> {
        let body: Value = self
            .client
            .post(format!(
                "{}/auth/v1/token?grant_type=password",
                self.base_url
            ))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Failed to reach identity provider for login")?
            .json()
            .await
            .context("Failed to parse login response")?;

        Ok(credentials_outcome(body, "Login failed"))
    }

    /// Resolve a bearer token to the owning user id. `None` means the token
    /// is invalid or expired, not a transport failure.
    pub async fn get_user_id(&self, token: &str) -> Result<Option<String>> {
        let body: Value = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to reach identity provider for token verification")?
            .json()
            .await
            .context("Failed to parse user response")?;

        Ok(body.get("id").and_then(Value::as_str).map(str::to_string))
    }

    /// Fetch the user's site record, if any. Absence is not an error; a
    /// store rejection is, carrying the store's raw error text.
    pub async fn find_site(&self, user_id: &str, token: &str) -> Result<Option<Value>> {
        let response = self
            .client
            .get(self.table_url())
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("select", "*".to_string()),
                ("limit", "1".to_string()),
            ])
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to query site record")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if text.is_empty() {
                bail!("Site record query failed ({})", status);
            }
            bail!("{}", text);
        }

        let rows: Value = response
            .json()
            .await
            .context("Failed to parse site record response")?;

        Ok(rows.as_array().and_then(|r| r.first()).cloned())
    }

    /// Insert-or-update the site record, keyed on `user_id` (one row per
    /// user): PATCH the existing row if there is one, INSERT otherwise.
    pub async fn upsert_site(&self, token: &str, record: &SiteRecord) -> Result<SaveOutcome> {
        let existing: Value = self
            .client
            .get(self.table_url())
            .query(&[
                ("user_id", format!("eq.{}", record.user_id)),
                ("select", "id".to_string()),
            ])
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to check for an existing site record")?
            .json()
            .await
            .context("Failed to parse existing-record response")?;

        let has_existing = existing.as_array().is_some_and(|rows| !rows.is_empty());

        let request = if has_existing {
            self.client
                .patch(self.table_url())
                .query(&[("user_id", format!("eq.{}", record.user_id))])
        } else {
            self.client.post(self.table_url())
        };

        let response = request
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .context("Failed to write site record")?;

        if response.status().is_success() {
            debug!("Site record saved for user {}", record.user_id);
            Ok(SaveOutcome::Saved)
        } else {
            let text = response.text().await.unwrap_or_default();
            Ok(SaveOutcome::StoreError(text))
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.sites_table)
    }
}

/// Supabase reports credential failures in the response body rather than the
/// status line; any of `error`, `msg` or `error_description` marks a rejection.
fn credentials_outcome(body: Value, fallback: &str) -> AuthOutcome {
    let rejected = body.get("error").is_some()
        || body.get("msg").is_some()
        || body.get("error_description").is_some();

    if rejected {
        let message = body
            .get("error_description")
            .and_then(Value::as_str)
            .or_else(|| body.get("msg").and_then(Value::as_str))
            .unwrap_or(fallback)
            .to_string();
        return AuthOutcome::Rejected(message);
    }

    let user = body.get("user").cloned().unwrap_or(Value::Null);
    AuthOutcome::Success {
        user,
        session: body,
    }
}
