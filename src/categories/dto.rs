use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::categories::repo::{Category, CategoryType};
use crate::error::ApiError;

/// Body shared by create and update; updates replace both fields wholesale.
#[derive(Debug, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    pub r#type: CategoryType,
}

impl CategoryPayload {
    pub fn validated_name(&self) -> Result<String, ApiError> {
        let name = self.name.trim().to_string();
        let len = name.chars().count();
        if !(2..=80).contains(&len) {
            return Err(ApiError::Validation(
                "Name must be between 2 and 80 characters".into(),
            ));
        }
        Ok(name)
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryOut {
    pub id: Uuid,
    pub name: String,
    pub r#type: CategoryType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Category> for CategoryOut {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            r#type: category.r#type,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}
