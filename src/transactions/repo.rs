use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Mirrored by the `transaction_type` enum in Postgres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    #[sqlx(rename = "type")]
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

/// Optional listing filters; absent fields leave that dimension unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub r#type: Option<TransactionType>,
    pub category_id: Option<Uuid>,
}

/// Mutable fields of a transaction; updates replace them wholesale.
#[derive(Debug, Clone)]
pub struct TransactionData {
    pub category_id: Option<Uuid>,
    pub r#type: TransactionType,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: Date,
}

/// Income/expense totals over an inclusive date window. Bounds are echoed
/// back so the client can confirm what was aggregated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    #[serde(with = "crate::iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(with = "crate::iso_date::option")]
    pub end_date: Option<Date>,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
}

impl Summary {
    pub fn new(
        total_income: Decimal,
        total_expense: Decimal,
        start_date: Option<Date>,
        end_date: Option<Date>,
    ) -> Self {
        Self {
            start_date,
            end_date,
            total_income,
            total_expense,
            balance: total_income - total_expense,
        }
    }
}

/// Owner-scoped transaction operations, same contract as the category store:
/// rows belonging to a different user look absent.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Ordered by date descending, then creation time descending, so
    /// same-day entries keep a stable relative order.
    async fn list(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
    ) -> anyhow::Result<Vec<Transaction>>;
    /// The caller validates category ownership beforehand; the foreign key
    /// still rejects a reference that vanished in between.
    async fn create(&self, user_id: Uuid, data: &TransactionData) -> anyhow::Result<Transaction>;
    async fn update(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
        data: &TransactionData,
    ) -> anyhow::Result<Option<Transaction>>;
    async fn delete(&self, user_id: Uuid, transaction_id: Uuid) -> anyhow::Result<bool>;
    async fn summarize(
        &self,
        user_id: Uuid,
        start_date: Option<Date>,
        end_date: Option<Date>,
    ) -> anyhow::Result<Summary>;
}

pub struct PgTransactionStore {
    db: PgPool,
}

impl PgTransactionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn sum_by_type(
        &self,
        user_id: Uuid,
        r#type: TransactionType,
        start_date: Option<Date>,
        end_date: Option<Date>,
    ) -> anyhow::Result<Decimal> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE user_id = $1
              AND type = $2
              AND ($3::date IS NULL OR date >= $3)
              AND ($4::date IS NULL OR date <= $4)
            "#,
        )
        .bind(user_id)
        .bind(r#type)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.db)
        .await?;
        Ok(total)
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn list(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
    ) -> anyhow::Result<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, category_id, type, amount, description, date,
                   created_at, updated_at
            FROM transactions
            WHERE user_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
              AND ($4::transaction_type IS NULL OR type = $4)
              AND ($5::uuid IS NULL OR category_id = $5)
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.r#type)
        .bind(filter.category_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn create(&self, user_id: Uuid, data: &TransactionData) -> anyhow::Result<Transaction> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (user_id, category_id, type, amount, description, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, category_id, type, amount, description, date,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(data.category_id)
        .bind(data.r#type)
        .bind(data.amount)
        .bind(data.description.as_deref())
        .bind(data.date)
        .fetch_one(&self.db)
        .await?;
        Ok(transaction)
    }

    async fn update(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
        data: &TransactionData,
    ) -> anyhow::Result<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET category_id = $3, type = $4, amount = $5, description = $6,
                date = $7, updated_at = now()
            WHERE id = $2 AND user_id = $1
            RETURNING id, user_id, category_id, type, amount, description, date,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(transaction_id)
        .bind(data.category_id)
        .bind(data.r#type)
        .bind(data.amount)
        .bind(data.description.as_deref())
        .bind(data.date)
        .fetch_optional(&self.db)
        .await?;
        Ok(transaction)
    }

    async fn delete(&self, user_id: Uuid, transaction_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM transactions
            WHERE id = $2 AND user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(transaction_id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn summarize(
        &self,
        user_id: Uuid,
        start_date: Option<Date>,
        end_date: Option<Date>,
    ) -> anyhow::Result<Summary> {
        let total_income = self
            .sum_by_type(user_id, TransactionType::Income, start_date, end_date)
            .await?;
        let total_expense = self
            .sum_by_type(user_id, TransactionType::Expense, start_date, end_date)
            .await?;
        Ok(Summary::new(
            total_income,
            total_expense,
            start_date,
            end_date,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use time::macros::date;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn balance_is_exact_decimal_subtraction() {
        let summary = Summary::new(dec("100.00"), dec("40.00"), None, None);
        assert_eq!(summary.balance, dec("60.00"));
    }

    #[test]
    fn balance_has_no_binary_float_drift() {
        let summary = Summary::new(dec("0.30"), dec("0.10"), None, None);
        assert_eq!(summary.balance, dec("0.20"));
        assert_eq!(summary.balance.to_string(), "0.20");
    }

    #[test]
    fn empty_summary_is_exact_zero() {
        let summary = Summary::new(Decimal::ZERO, Decimal::ZERO, None, None);
        assert_eq!(summary.total_income, Decimal::ZERO);
        assert_eq!(summary.total_expense, Decimal::ZERO);
        assert_eq!(summary.balance, Decimal::ZERO);
    }

    #[test]
    fn summary_echoes_window_bounds() {
        let start = Some(date!(2026 - 01 - 01));
        let end = Some(date!(2026 - 01 - 31));
        let summary = Summary::new(dec("1.00"), dec("2.00"), start, end);
        assert_eq!(summary.start_date, start);
        assert_eq!(summary.end_date, end);
        assert_eq!(summary.balance, dec("-1.00"));
    }

    #[test]
    fn summary_serializes_amounts_as_strings() {
        let summary = Summary::new(dec("100.00"), dec("0.00"), None, None);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["total_income"], "100.00");
        assert_eq!(json["total_expense"], "0.00");
        assert_eq!(json["balance"], "100.00");
        assert_eq!(json["start_date"], serde_json::Value::Null);
    }

    #[test]
    fn transaction_type_round_trips_as_lowercase() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Expense).unwrap(),
            "\"expense\""
        );
        assert_eq!(
            serde_json::from_str::<TransactionType>("\"income\"").unwrap(),
            TransactionType::Income
        );
        assert!(serde_json::from_str::<TransactionType>("\"transfer\"").is_err());
    }
}
