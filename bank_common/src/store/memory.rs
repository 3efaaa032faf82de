use super::{AccountRepository, StoreError, StoreResult, TransactionRepository};
use crate::account::BankAccount;
use crate::tx::Transaction;
use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// **An in-process document store**
///
/// Holds both collections. Documents are cloned on the way in and on the way out,
/// so callers never share state with the store.
///
/// Transactions carry the sequence number of their insertion,
/// which breaks ties between equal timestamps (newer insertions first).
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<BTreeMap<String, BankAccount>>,
    transactions: RwLock<Vec<(u64, Transaction)>>,
}

impl MemoryStore {
    /// Returns an empty store
    pub fn new() -> Self {
        Self::default()
    }

    async fn newest_first<P>(&self, predicate: P) -> Vec<Transaction>
    where
        P: Fn(&Transaction) -> bool,
    {
        let transactions = self.transactions.read().await;
        let mut selected: Vec<&(u64, Transaction)> =
            transactions.iter().filter(|(_, tx)| predicate(tx)).collect();
        selected.sort_by_key(|(seq, tx)| Reverse((tx.timestamp, *seq)));
        selected.into_iter().map(|(_, tx)| tx.clone()).collect()
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<BankAccount>> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> StoreResult<Vec<BankAccount>> {
        Ok(self.accounts.read().await.values().cloned().collect())
    }

    async fn insert(&self, account: BankAccount) -> StoreResult<BankAccount> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.id) {
            return Err(StoreError::DuplicateKey(account.id));
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn replace(&self, account: BankAccount) -> StoreResult<BankAccount> {
        let mut accounts = self.accounts.write().await;
        let stored = accounts
            .get_mut(&account.id)
            .ok_or_else(|| StoreError::DocumentNotFound(account.id.clone()))?;

        if stored.version != account.version {
            return Err(StoreError::VersionConflict {
                id: account.id,
                expected: account.version,
                found: stored.version,
            });
        }

        *stored = BankAccount {
            version: account.version + 1,
            ..account
        };
        Ok(stored.clone())
    }
}

#[async_trait]
impl TransactionRepository for MemoryStore {
    async fn append(&self, tx: Transaction) -> StoreResult<Transaction> {
        let mut transactions = self.transactions.write().await;
        let seq = transactions.len() as u64;
        transactions.push((seq, tx.clone()));
        Ok(tx)
    }

    async fn find_all_newest_first(&self) -> StoreResult<Vec<Transaction>> {
        Ok(self.newest_first(|_| true).await)
    }

    async fn find_by_account_newest_first(&self, account: &str) -> StoreResult<Vec<Transaction>> {
        Ok(self.newest_first(|tx| tx.touches(account)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::TransactionType;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn account(id: &str) -> BankAccount {
        BankAccount {
            id: id.to_string(),
            account_holder: "Alice".to_string(),
            balance: Decimal::ZERO,
            version: 0,
        }
    }

    #[tokio::test]
    async fn insert_err_duplicate_key() {
        let store = MemoryStore::new();
        assert!(store.insert(account("A")).await.is_ok());
        assert_eq!(
            Err(StoreError::DuplicateKey("A".to_string())),
            store.insert(account("A")).await
        );
    }

    #[tokio::test]
    async fn replace_bumps_version() {
        let store = MemoryStore::new();
        store.insert(account("A")).await.unwrap();

        let mut acc = store.find_by_id("A").await.unwrap().unwrap();
        acc.balance = dec!(10);
        let stored = store.replace(acc).await.unwrap();

        assert_eq!(1, stored.version);
        assert_eq!(Some(stored), store.find_by_id("A").await.unwrap());
    }

    #[tokio::test]
    async fn replace_err_stale_version() {
        let store = MemoryStore::new();
        store.insert(account("A")).await.unwrap();

        let first = store.find_by_id("A").await.unwrap().unwrap();
        let second = first.clone();

        store.replace(first).await.unwrap();
        assert_eq!(
            Err(StoreError::VersionConflict {
                id: "A".to_string(),
                expected: 0,
                found: 1,
            }),
            store.replace(second).await
        );
    }

    #[tokio::test]
    async fn replace_err_missing_document() {
        let store = MemoryStore::new();
        assert_eq!(
            Err(StoreError::DocumentNotFound("A".to_string())),
            store.replace(account("A")).await
        );
    }

    #[tokio::test]
    async fn find_all_sorted_by_id() {
        let store = MemoryStore::new();
        store.insert(account("C")).await.unwrap();
        store.insert(account("A")).await.unwrap();
        store.insert(account("B")).await.unwrap();

        let ids: Vec<String> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|acc| acc.id)
            .collect();
        assert_eq!(vec!["A", "B", "C"], ids);
    }

    #[tokio::test]
    async fn transactions_newest_first_with_ties_by_insertion() {
        let store = MemoryStore::new();
        let t0 = Utc::now();

        let old = Transaction::deposit("A", dec!(1), t0);
        let tie_first = Transaction::withdrawal("A", dec!(2), t0 + Duration::seconds(5));
        let tie_second = Transaction::deposit("B", dec!(3), t0 + Duration::seconds(5));
        let middle = Transaction::transfer("B", "A", dec!(4), t0 + Duration::seconds(2));

        for tx in [&old, &tie_first, &tie_second, &middle] {
            store.append(tx.clone()).await.unwrap();
        }

        assert_eq!(
            vec![&tie_second, &tie_first, &middle, &old],
            store
                .find_all_newest_first()
                .await
                .unwrap()
                .iter()
                .collect::<Vec<_>>()
        );

        let for_a = store.find_by_account_newest_first("A").await.unwrap();
        assert_eq!(vec![&tie_first, &middle, &old], for_a.iter().collect::<Vec<_>>());

        let for_b = store.find_by_account_newest_first("B").await.unwrap();
        assert_eq!(
            vec![TransactionType::Deposit, TransactionType::Transfer],
            for_b.iter().map(|tx| tx.tx_type).collect::<Vec<_>>()
        );

        assert!(store
            .find_by_account_newest_first("nobody")
            .await
            .unwrap()
            .is_empty());
    }
}
