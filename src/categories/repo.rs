use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Closed set of category kinds, mirrored by the `category_type` enum in
/// Postgres. Unknown values are rejected at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "category_type", rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    Expense,
    Both,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[sqlx(rename = "type")]
    pub r#type: CategoryType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Owner-scoped category operations. Every query filters by `user_id`, so a
/// category owned by someone else is indistinguishable from one that does
/// not exist.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>>;
    async fn find_by_id(&self, user_id: Uuid, category_id: Uuid)
        -> anyhow::Result<Option<Category>>;
    async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        r#type: CategoryType,
    ) -> anyhow::Result<Category>;
    async fn update(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        name: &str,
        r#type: CategoryType,
    ) -> anyhow::Result<Option<Category>>;
    /// Returns false when nothing matched. On success, referencing
    /// transactions have their `category_id` cleared by the `ON DELETE SET
    /// NULL` constraint inside the same statement, so no dangling reference
    /// can be observed.
    async fn delete(&self, user_id: Uuid, category_id: Uuid) -> anyhow::Result<bool>;
}

pub struct PgCategoryStore {
    db: PgPool,
}

impl PgCategoryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn list(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, user_id, name, type, created_at, updated_at
            FROM categories
            WHERE user_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> anyhow::Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, user_id, name, type, created_at, updated_at
            FROM categories
            WHERE id = $2 AND user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(category_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(category)
    }

    async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        r#type: CategoryType,
    ) -> anyhow::Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (user_id, name, type)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, type, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(r#type)
        .fetch_one(&self.db)
        .await?;
        Ok(category)
    }

    async fn update(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        name: &str,
        r#type: CategoryType,
    ) -> anyhow::Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $3, type = $4, updated_at = now()
            WHERE id = $2 AND user_id = $1
            RETURNING id, user_id, name, type, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(category_id)
        .bind(name)
        .bind(r#type)
        .fetch_optional(&self.db)
        .await?;
        Ok(category)
    }

    async fn delete(&self, user_id: Uuid, category_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM categories
            WHERE id = $2 AND user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(category_id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_type_round_trips_as_lowercase() {
        assert_eq!(
            serde_json::to_string(&CategoryType::Income).unwrap(),
            "\"income\""
        );
        assert_eq!(
            serde_json::from_str::<CategoryType>("\"both\"").unwrap(),
            CategoryType::Both
        );
        assert!(serde_json::from_str::<CategoryType>("\"savings\"").is_err());
    }
}
