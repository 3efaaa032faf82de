//! Document store contracts
//!
//! Accounts live in a collection keyed by account ID; transactions live in an
//! append-only collection that can be scanned newest first.

mod memory;

pub use memory::MemoryStore;

use crate::account::BankAccount;
use crate::tx::Transaction;
use async_trait::async_trait;
use thiserror::Error;

/// **Errors raised by the document store itself**
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Version conflict on {id}: expected {expected}, found {found}")]
    VersionConflict { id: String, expected: u64, found: u64 },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The `accounts` collection
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<BankAccount>>;

    /// All accounts, ordered by ID
    async fn find_all(&self) -> StoreResult<Vec<BankAccount>>;

    /// Stores a new document.
    ///
    /// # Errors
    /// - The ID is already taken, `StoreError::DuplicateKey`.
    async fn insert(&self, account: BankAccount) -> StoreResult<BankAccount>;

    /// Replaces a stored document, if nobody else has replaced it since it was read.
    ///
    /// The `version` of `account` must match the stored one; the stored copy gets
    /// the next version, and that copy is returned.
    ///
    /// # Errors
    /// - No such document, `StoreError::DocumentNotFound`;
    /// - Stale version, `StoreError::VersionConflict`.
    async fn replace(&self, account: BankAccount) -> StoreResult<BankAccount>;
}

/// The `transactions` collection
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn append(&self, tx: Transaction) -> StoreResult<Transaction>;

    /// All transactions, sorted by timestamp descending
    async fn find_all_newest_first(&self) -> StoreResult<Vec<Transaction>>;

    /// Transactions whose source or destination is `account`, sorted by timestamp descending
    async fn find_by_account_newest_first(&self, account: &str) -> StoreResult<Vec<Transaction>>;
}
