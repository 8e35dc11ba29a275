use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::entitlement::EntitlementStore;
use crate::identity::IdentityClient;
use crate::llm_client::LlmClient;
use crate::media::MediaClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub llm: LlmClient,
    pub media: MediaClient,
    pub identity: IdentityClient,
    /// Plan/usage capability. Default: identity-provider metadata backed.
    /// Swappable without touching handlers.
    pub entitlements: Arc<dyn EntitlementStore>,
    pub config: Config,
}
