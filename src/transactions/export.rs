use bytes::Bytes;
use futures::{stream, Stream};
use rust_decimal::Decimal;

use crate::transactions::repo::Transaction;

const HEADER: [&str; 6] = ["id", "category_id", "type", "amount", "description", "date"];

/// Fixed two-decimal rendering regardless of the stored scale.
fn format_amount(amount: Decimal) -> String {
    let mut amount = amount.round_dp(2);
    amount.rescale(2);
    amount.to_string()
}

fn record(transaction: &Transaction) -> [String; 6] {
    [
        transaction.id.to_string(),
        transaction
            .category_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        transaction.r#type.as_str().to_string(),
        format_amount(transaction.amount),
        transaction.description.clone().unwrap_or_default(),
        transaction.date.to_string(),
    ]
}

fn record_bytes<I, T>(fields: I) -> anyhow::Result<Bytes>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(fields)?;
    let buf = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(Bytes::from(buf))
}

/// One chunk per record, header first. Rows are rendered as the stream is
/// polled, so the response body scales with chunk size rather than the full
/// export.
pub fn csv_stream(
    transactions: Vec<Transaction>,
) -> impl Stream<Item = anyhow::Result<Bytes>> + Send {
    let header = std::iter::once_with(|| record_bytes(HEADER));
    let rows = transactions.into_iter().map(|t| record_bytes(record(&t)));
    stream::iter(header.chain(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::repo::TransactionType;
    use futures::StreamExt;
    use std::str::FromStr;
    use time::macros::date;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn sample(description: Option<&str>, category_id: Option<Uuid>) -> Transaction {
        Transaction {
            id: Uuid::nil(),
            user_id: Uuid::new_v4(),
            category_id,
            r#type: TransactionType::Income,
            amount: Decimal::from_str("100.00").unwrap(),
            description: description.map(Into::into),
            date: date!(2026 - 08 - 25),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn amount_is_always_two_decimals() {
        assert_eq!(format_amount(Decimal::from_str("100").unwrap()), "100.00");
        assert_eq!(format_amount(Decimal::from_str("7.5").unwrap()), "7.50");
        assert_eq!(format_amount(Decimal::from_str("0.01").unwrap()), "0.01");
    }

    #[test]
    fn absent_fields_render_empty() {
        let fields = record(&sample(None, None));
        assert_eq!(fields[1], "");
        assert_eq!(fields[4], "");
        assert_eq!(fields[5], "2026-08-25");
    }

    #[test]
    fn row_with_comma_in_description_is_quoted() {
        let bytes = record_bytes(record(&sample(Some("rent, august"), None))).unwrap();
        let line = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(line.contains("\"rent, august\""));
    }

    #[tokio::test]
    async fn stream_yields_header_then_one_chunk_per_row() {
        let rows = vec![sample(Some("a"), None), sample(Some("b"), Some(Uuid::new_v4()))];
        let chunks: Vec<_> = csv_stream(rows)
            .map(|c| String::from_utf8(c.unwrap().to_vec()).unwrap())
            .collect()
            .await;
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].trim_end(), "id,category_id,type,amount,description,date");
        assert!(chunks[1].contains("income,100.00,a,2026-08-25"));
    }
}
