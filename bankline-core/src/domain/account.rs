//! Account domain model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A bank account held by a single user.
///
/// `id` is caller-chosen at registration and immutable afterwards. The
/// credential travels inside the record because the backing collection API
/// matches on it with an exact-field filter; the demo makes no claim that
/// this is secure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    /// Current balance. Never negative after a completed operation.
    #[serde(deserialize_with = "deserialize_balance")]
    pub balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            balance: Decimal::ZERO,
            password: Some(password.into()),
        }
    }

    /// Validate account data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.id.trim().is_empty() {
            return Err("account id cannot be empty");
        }
        if self.name.trim().is_empty() {
            return Err("account name cannot be empty");
        }
        if self.balance < Decimal::ZERO {
            return Err("balance cannot be negative");
        }
        Ok(())
    }

    /// Whether the balance covers a withdrawal of `amount`
    pub fn can_withdraw(&self, amount: Decimal) -> bool {
        amount <= self.balance
    }
}

/// Deserialize a balance that can be a JSON number or string
///
/// The collection API stores what it was given; hand-edited db.json files
/// carry plain numbers while this client writes decimal strings.
fn deserialize_balance<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
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
        _ => Err(D::Error::custom("expected number or string for balance")),
    }
}
