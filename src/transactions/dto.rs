use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::ApiError;
use crate::transactions::repo::{Transaction, TransactionData, TransactionFilter, TransactionType};

/// Body shared by create and update; updates replace every field.
#[derive(Debug, Deserialize)]
pub struct TransactionPayload {
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub r#type: TransactionType,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "crate::iso_date")]
    pub date: Date,
}

impl TransactionPayload {
    pub fn validated(&self) -> Result<TransactionData, ApiError> {
        if self.amount <= Decimal::ZERO {
            return Err(ApiError::Validation("Amount must be positive".into()));
        }
        if let Some(description) = &self.description {
            if description.chars().count() > 255 {
                return Err(ApiError::Validation(
                    "Description must be at most 255 characters".into(),
                ));
            }
        }
        Ok(TransactionData {
            category_id: self.category_id,
            r#type: self.r#type,
            amount: self.amount,
            description: self.description.clone(),
            date: self.date,
        })
    }
}

/// Query parameters accepted by list, export and summary endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    #[serde(default, with = "crate::iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "crate::iso_date::option")]
    pub end_date: Option<Date>,
    #[serde(default)]
    pub r#type: Option<TransactionType>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
}

impl TransactionQuery {
    pub fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            r#type: self.r#type,
            category_id: self.category_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionOut {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub r#type: TransactionType,
    pub amount: Decimal,
    pub description: Option<String>,
    #[serde(with = "crate::iso_date")]
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Transaction> for TransactionOut {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            category_id: transaction.category_id,
            r#type: transaction.r#type,
            amount: transaction.amount,
            description: transaction.description,
            date: transaction.date,
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
        }
    }
}
