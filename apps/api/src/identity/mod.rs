//! Identity provider client — the single point of entry for all calls to the
//! hosted identity service (session verification, user lookup, private
//! metadata updates).
//!
//! ARCHITECTURAL RULE: no other module may talk to the identity provider
//! directly. Plan/usage state lives in the provider's private metadata bag and
//! is only reached through `entitlement::EntitlementStore`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid or expired session token")]
    InvalidToken,
}

/// A user record as returned by the identity provider.
///
/// `plan` is the provider-managed entitlement tier; `private_metadata` is the
/// provider's free-form server-side metadata bag (never exposed to clients).
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityUser {
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub private_metadata: Value,
}

impl IdentityUser {
    pub fn has_premium_plan(&self) -> bool {
        self.plan.as_deref() == Some("premium")
    }
}

#[derive(Debug, Serialize)]
struct VerifyTokenRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifiedToken {
    user_id: String,
}

#[derive(Debug, Serialize)]
struct MetadataPatch<'a> {
    private_metadata: &'a Value,
}

/// Backend REST client for the identity provider.
#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl IdentityClient {
    pub fn new(base_url: String, secret_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            secret_key,
        }
    }

    /// Verifies a bearer session token and returns the opaque user id.
    /// A 4xx from the provider means the token is invalid, not that the
    /// provider is down.
    pub async fn verify_token(&self, token: &str) -> Result<String, IdentityError> {
        let response = self
            .client
            .post(format!("{}/tokens/verify", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&VerifyTokenRequest { token })
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            return Err(IdentityError::InvalidToken);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let verified: VerifiedToken = response.json().await?;
        debug!("Verified session for user {}", verified.user_id);
        Ok(verified.user_id)
    }

    /// Fetches a user record, including plan and private metadata.
    pub async fn get_user(&self, user_id: &str) -> Result<IdentityUser, IdentityError> {
        let response = self
            .client
            .get(format!("{}/users/{user_id}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Merge-patches the user's private metadata. The provider performs a
    /// shallow merge, so fields not named in `patch` are preserved.
    pub async fn merge_private_metadata(
        &self,
        user_id: &str,
        patch: &Value,
    ) -> Result<(), IdentityError> {
        let response = self
            .client
            .patch(format!("{}/users/{user_id}/metadata", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&MetadataPatch {
                private_metadata: patch,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Patched private metadata for user {user_id}");
        Ok(())
    }
}
