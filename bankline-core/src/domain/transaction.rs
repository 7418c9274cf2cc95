//! Transaction domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The two balance-changing events the ledger records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }
}

/// A single ledger entry belonging to an account.
///
/// Transactions are immutable and append-only once created; the client
/// never edits or deletes one. `id` is assigned by the backing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "accountId")]
    pub account_id: String,
    pub kind: TransactionKind,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// The amount with its ledger sign: deposits positive, withdrawals negative
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Deposit => self.amount,
            TransactionKind::Withdrawal => -self.amount,
        }
    }
}

/// A transaction as sent to the store for creation, before an id exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(rename = "accountId")]
    pub account_id: String,
    pub kind: TransactionKind,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl NewTransaction {
    pub fn new(account_id: impl Into<String>, kind: TransactionKind, amount: Decimal) -> Self {
        Self {
            account_id: account_id.into(),
            kind,
            amount,
            timestamp: Utc::now(),
        }
    }

    /// Attach a store-assigned id
    pub fn with_id(self, id: impl Into<String>) -> Transaction {
        Transaction {
            id: id.into(),
            account_id: self.account_id,
            kind: self.kind,
            amount: self.amount,
            timestamp: self.timestamp,
        }
    }
}

/// Sort newest-first by timestamp (ties keep their relative order)
pub fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Deserialize an amount that can be a JSON number or string
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e))),
        JsonValue::String(s) => s
            .parse::<Decimal>()
            .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e))),
        _ => Err(D::Error::custom("expected number or string for amount")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tx(id: &str, kind: TransactionKind, cents: i64, ts: DateTime<Utc>) -> Transaction {
        Transaction {
            id: id.to_string(),
            account_id: "acct-1".to_string(),
            kind,
            amount: Decimal::new(cents, 2),
            timestamp: ts,
        }
    }

    #[test]
    fn test_kind_wire_format() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::Deposit).unwrap(),
            "\"deposit\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionKind::Withdrawal).unwrap(),
            "\"withdrawal\""
        );
    }

    #[test]
    fn test_signed_amount() {
        let now = Utc::now();
        assert_eq!(
            tx("1", TransactionKind::Deposit, 5000, now).signed_amount(),
            Decimal::new(5000, 2)
        );
        assert_eq!(
            tx("2", TransactionKind::Withdrawal, 5000, now).signed_amount(),
            Decimal::new(-5000, 2)
        );
    }

    #[test]
    fn test_sort_newest_first() {
        let now = Utc::now();
        let mut history = vec![
            tx("old", TransactionKind::Deposit, 100, now - Duration::hours(2)),
            tx("new", TransactionKind::Deposit, 200, now),
            tx("mid", TransactionKind::Withdrawal, 50, now - Duration::hours(1)),
        ];
        sort_newest_first(&mut history);
        let ids: Vec<&str> = history.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_account_id_serializes_camel_case() {
        let new_tx = NewTransaction::new("acct-1", TransactionKind::Deposit, Decimal::new(50, 0));
        let json = serde_json::to_string(&new_tx).unwrap();
        assert!(json.contains("\"accountId\":\"acct-1\""));
        assert!(json.contains("\"kind\":\"deposit\""));
    }

    #[test]
    fn test_amount_deserializes_from_number() {
        let parsed: Transaction = serde_json::from_str(
            r#"{"id":"t1","accountId":"acct-1","kind":"deposit","amount":50,"timestamp":"2024-03-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(parsed.amount, Decimal::new(50, 0));
        assert_eq!(parsed.kind, TransactionKind::Deposit);
    }
}
