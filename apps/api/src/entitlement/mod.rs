//! Entitlement Resolver — decides, per request, whether a paid action may
//! proceed, and maintains the free-tier usage counter.
//!
//! Plan/usage state lives in the identity provider's private metadata bag.
//! It is only reached through the narrow `EntitlementStore` capability trait,
//! so the storage mechanism (metadata field, dedicated table, cache) can
//! change without touching handlers.
//!
//! `AppState` holds an `Arc<dyn EntitlementStore>`.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::identity::IdentityClient;

/// Number of paid actions a free-tier identity may perform.
pub const FREE_USAGE_LIMIT: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Free,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
        }
    }
}

/// Resolved plan tier and working usage count for one request.
///
/// For premium identities usage is not tracked; `free_usage` is reported as 0
/// and never enforced.
#[derive(Debug, Clone, Copy)]
pub struct Entitlement {
    pub plan: Plan,
    pub free_usage: u64,
}

impl Entitlement {
    /// Gate check. Must run before any external generation call; a rejection
    /// means no generation call is made and no Creation is written.
    pub fn ensure_within_quota(&self) -> Result<(), AppError> {
        if self.plan == Plan::Free && self.free_usage >= FREE_USAGE_LIMIT {
            return Err(AppError::QuotaExceeded);
        }
        Ok(())
    }
}

/// Narrow capability interface over the plan/usage store.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Resolves the caller's plan and working usage count. For a free-tier
    /// identity whose counter field is absent this initializes the stored
    /// counter to 0 (preserving all other metadata fields).
    async fn plan_and_usage(&self, user_id: &str) -> Result<Entitlement, AppError>;

    /// Increments the stored free-usage counter by 1 and returns the new
    /// count. A non-numeric stored value counts as 0 before incrementing.
    async fn increment_usage(&self, user_id: &str) -> Result<u64, AppError>;
}

/// Post-success accounting. Called only after the generation call succeeded
/// and the Creation row is written. Best-effort: a provider failure is logged
/// and never surfaced — the counter may under-count as a result.
pub async fn record_usage(store: &dyn EntitlementStore, user_id: &str, plan: Plan) {
    if plan == Plan::Premium {
        return;
    }
    match store.increment_usage(user_id).await {
        Ok(count) => info!("Free usage for {user_id} is now {count}"),
        Err(e) => warn!("Failed to update free usage for {user_id}: {e}"),
    }
}

/// Reads the `free_usage` field as an optional count.
///
/// Presence-tracking by design: a stored 0 is a real count, not a missing
/// field, so it never triggers a re-initialization write. Numeric strings are
/// accepted because earlier writers stored the counter as text.
fn parse_usage(metadata: &Value) -> Option<u64> {
    match metadata.get("free_usage")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `EntitlementStore` backed by the identity provider's private metadata.
pub struct IdentityEntitlements {
    identity: IdentityClient,
}

impl IdentityEntitlements {
    pub fn new(identity: IdentityClient) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl EntitlementStore for IdentityEntitlements {
    async fn plan_and_usage(&self, user_id: &str) -> Result<Entitlement, AppError> {
        let user = self
            .identity
            .get_user(user_id)
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        if user.has_premium_plan() {
            return Ok(Entitlement {
                plan: Plan::Premium,
                free_usage: 0,
            });
        }

        match parse_usage(&user.private_metadata) {
            Some(count) => Ok(Entitlement {
                plan: Plan::Free,
                free_usage: count,
            }),
            None => {
                // Fresh quota period: initialize the counter. The provider
                // merge-patches metadata, so other fields are preserved.
                self.identity
                    .merge_private_metadata(user_id, &json!({ "free_usage": 0 }))
                    .await
                    .map_err(|e| AppError::Identity(e.to_string()))?;
                info!("Initialized free usage counter for {user_id}");
                Ok(Entitlement {
                    plan: Plan::Free,
                    free_usage: 0,
                })
            }
        }
    }

    async fn increment_usage(&self, user_id: &str) -> Result<u64, AppError> {
        let user = self
            .identity
            .get_user(user_id)
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        let next = parse_usage(&user.private_metadata).unwrap_or(0) + 1;
        self.identity
            .merge_private_metadata(user_id, &json!({ "free_usage": next }))
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn free(usage: u64) -> Entitlement {
        Entitlement {
            plan: Plan::Free,
            free_usage: usage,
        }
    }

    #[test]
    fn test_gate_allows_free_under_limit() {
        assert!(free(0).ensure_within_quota().is_ok());
        assert!(free(9).ensure_within_quota().is_ok());
    }

    #[test]
    fn test_gate_rejects_free_at_limit() {
        assert!(matches!(
            free(10).ensure_within_quota(),
            Err(AppError::QuotaExceeded)
        ));
        assert!(matches!(
            free(25).ensure_within_quota(),
            Err(AppError::QuotaExceeded)
        ));
    }

    #[test]
    fn test_gate_never_rejects_premium() {
        let ent = Entitlement {
            plan: Plan::Premium,
            free_usage: 1000,
        };
        assert!(ent.ensure_within_quota().is_ok());
    }

    #[test]
    fn test_parse_usage_numeric() {
        assert_eq!(parse_usage(&json!({ "free_usage": 7 })), Some(7));
    }

    #[test]
    fn test_parse_usage_stored_zero_is_present() {
        // 0 is a real count, not an absent field.
        assert_eq!(parse_usage(&json!({ "free_usage": 0 })), Some(0));
    }

    #[test]
    fn test_parse_usage_numeric_string() {
        assert_eq!(parse_usage(&json!({ "free_usage": "3" })), Some(3));
    }

    #[test]
    fn test_parse_usage_absent_or_garbage() {
        assert_eq!(parse_usage(&json!({})), None);
        assert_eq!(parse_usage(&json!({ "free_usage": true })), None);
        assert_eq!(parse_usage(&json!({ "free_usage": "lots" })), None);
    }

    /// In-memory store with the same resolution contract as
    /// `IdentityEntitlements`, over a plain metadata map.
    struct MemoryEntitlements {
        premium: bool,
        metadata: Mutex<HashMap<String, Value>>,
    }

    impl MemoryEntitlements {
        fn new(premium: bool) -> Self {
            Self {
                premium,
                metadata: Mutex::new(HashMap::new()),
            }
        }

        fn stored_usage(&self, user_id: &str) -> Option<Value> {
            self.metadata
                .lock()
                .unwrap()
                .get(user_id)
                .and_then(|m| m.get("free_usage").cloned())
        }

        fn seed(&self, user_id: &str, value: Value) {
            self.metadata
                .lock()
                .unwrap()
                .insert(user_id.to_string(), json!({ "free_usage": value }));
        }
    }

    #[async_trait]
    impl EntitlementStore for MemoryEntitlements {
        async fn plan_and_usage(&self, user_id: &str) -> Result<Entitlement, AppError> {
            if self.premium {
                return Ok(Entitlement {
                    plan: Plan::Premium,
                    free_usage: 0,
                });
            }
            let mut metadata = self.metadata.lock().unwrap();
            let bag = metadata.entry(user_id.to_string()).or_insert(json!({}));
            match parse_usage(bag) {
                Some(count) => Ok(free(count)),
                None => {
                    bag["free_usage"] = json!(0);
                    Ok(free(0))
                }
            }
        }

        async fn increment_usage(&self, user_id: &str) -> Result<u64, AppError> {
            let mut metadata = self.metadata.lock().unwrap();
            let bag = metadata.entry(user_id.to_string()).or_insert(json!({}));
            let next = parse_usage(bag).unwrap_or(0) + 1;
            bag["free_usage"] = json!(next);
            Ok(next)
        }
    }

    #[tokio::test]
    async fn test_fresh_identity_resolves_to_zero_and_initializes() {
        let store = MemoryEntitlements::new(false);
        let ent = store.plan_and_usage("u1").await.unwrap();
        assert_eq!(ent.plan, Plan::Free);
        assert_eq!(ent.free_usage, 0);
        assert_eq!(store.stored_usage("u1"), Some(json!(0)));
    }

    #[tokio::test]
    async fn test_first_ten_actions_pass_eleventh_rejected() {
        let store = MemoryEntitlements::new(false);
        for _ in 0..10 {
            let ent = store.plan_and_usage("u1").await.unwrap();
            ent.ensure_within_quota().unwrap();
            record_usage(&store, "u1", ent.plan).await;
        }
        let ent = store.plan_and_usage("u1").await.unwrap();
        assert_eq!(ent.free_usage, 10);
        assert!(matches!(
            ent.ensure_within_quota(),
            Err(AppError::QuotaExceeded)
        ));
    }

    #[tokio::test]
    async fn test_seeded_at_limit_is_rejected() {
        let store = MemoryEntitlements::new(false);
        store.seed("u2", json!(10));
        let ent = store.plan_and_usage("u2").await.unwrap();
        assert!(matches!(
            ent.ensure_within_quota(),
            Err(AppError::QuotaExceeded)
        ));
    }

    #[tokio::test]
    async fn test_premium_skips_counting() {
        let store = MemoryEntitlements::new(true);
        let ent = store.plan_and_usage("u3").await.unwrap();
        assert_eq!(ent.plan, Plan::Premium);
        ent.ensure_within_quota().unwrap();
        // record_usage is a no-op for premium; nothing is written.
        record_usage(&store, "u3", ent.plan).await;
        assert_eq!(store.stored_usage("u3"), None);
    }

    #[tokio::test]
    async fn test_increment_treats_non_numeric_as_zero() {
        let store = MemoryEntitlements::new(false);
        store.seed("u4", json!("not-a-number"));
        assert_eq!(store.increment_usage("u4").await.unwrap(), 1);
    }
}
