//! Creation Ledger — append-only persistence and retrieval of Creation
//! records. Rows are inserted exactly once per successful generation action
//! and never deleted.

use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::models::creation::CreationRow;

/// Logical type of a Creation, fixed at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationKind {
    Article,
    Image,
    Resume,
}

impl CreationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreationKind::Article => "article",
            CreationKind::Image => "image",
            CreationKind::Resume => "resume",
        }
    }
}

/// Inserts a new Creation with `publish = FALSE` and DB-assigned id and
/// timestamps, returning the full row.
///
/// Callers must only invoke this after the external generation call has
/// succeeded. No idempotency key is kept; a retried client request produces a
/// second row.
pub async fn append(
    pool: &PgPool,
    user_id: &str,
    prompt: &str,
    content: &str,
    kind: CreationKind,
) -> Result<CreationRow, AppError> {
    let row = sqlx::query_as::<_, CreationRow>(
        r#"
        INSERT INTO creations (user_id, prompt, content, type, publish)
        VALUES ($1, $2, $3, $4, FALSE)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(prompt)
    .bind(content)
    .bind(kind.as_str())
    .fetch_one(pool)
    .await?;

    info!(
        "Recorded {} creation {} for user {user_id}",
        kind.as_str(),
        row.id
    );
    Ok(row)
}

/// Returns all Creations owned by `user_id`, newest first.
pub async fn list_by_owner(pool: &PgPool, user_id: &str) -> Result<Vec<CreationRow>, AppError> {
    Ok(sqlx::query_as::<_, CreationRow>(
        "SELECT * FROM creations WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

/// Returns all published Creations across all owners, newest first.
pub async fn list_published(pool: &PgPool) -> Result<Vec<CreationRow>, AppError> {
    Ok(sqlx::query_as::<_, CreationRow>(
        "SELECT * FROM creations WHERE publish = TRUE ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels_match_stored_type_column() {
        assert_eq!(CreationKind::Article.as_str(), "article");
        assert_eq!(CreationKind::Image.as_str(), "image");
        assert_eq!(CreationKind::Resume.as_str(), "resume");
    }

    #[test]
    fn test_creation_row_serializes_kind_as_type() {
        let row = CreationRow {
            id: uuid::Uuid::nil(),
            user_id: "u1".to_string(),
            prompt: "write about cats".to_string(),
            content: "<text>".to_string(),
            kind: "article".to_string(),
            publish: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["type"], "article");
        assert!(json.get("kind").is_none());
        assert_eq!(json["publish"], false);
    }
}
