use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of balance mutation a [`Transaction`] records
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
}

/// **A transaction log entry**
///
/// Transactions are immutable once created and are only ever appended to the log.
///
/// A deposit references only its destination account, a withdrawal only its
/// source account, and a transfer references both.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_account_id: Option<String>,
}

impl Transaction {
    pub fn deposit(account: &str, amount: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx_type: TransactionType::Deposit,
            amount,
            timestamp,
            source_account_id: None,
            destination_account_id: Some(account.to_string()),
        }
    }

    pub fn withdrawal(account: &str, amount: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx_type: TransactionType::Withdrawal,
            amount,
            timestamp,
            source_account_id: Some(account.to_string()),
            destination_account_id: None,
        }
    }

    pub fn transfer(
        source: &str,
        destination: &str,
        amount: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx_type: TransactionType::Transfer,
            amount,
            timestamp,
            source_account_id: Some(source.to_string()),
            destination_account_id: Some(destination.to_string()),
        }
    }

    /// Whether the account is either the source or the destination of this transaction.
    pub fn touches(&self, account: &str) -> bool {
        self.source_account_id.as_deref() == Some(account)
            || self.destination_account_id.as_deref() == Some(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn transfer_touches_both_sides() {
        let tx = Transaction::transfer("A", "B", dec!(1), Utc::now());
        assert!(tx.touches("A"));
        assert!(tx.touches("B"));
        assert!(!tx.touches("C"));
    }

    #[test]
    fn deposit_has_destination_only() {
        let tx = Transaction::deposit("A", dec!(1), Utc::now());
        assert_eq!(None, tx.source_account_id);
        assert_eq!(Some("A".to_string()), tx.destination_account_id);
    }

    #[test]
    fn serializes_type_in_upper_case() {
        let tx = Transaction::withdrawal("A", dec!(2.5), Utc::now());
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!("WITHDRAWAL", json["type"]);
        assert_eq!("A", json["sourceAccountId"]);
        assert!(json.get("destinationAccountId").is_none());
    }
}
