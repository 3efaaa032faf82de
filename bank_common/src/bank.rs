use crate::account::{BankAccount, NewAccount};
use crate::clock::{Clock, SystemClock};
use crate::errors::{BankError, BankResult};
use crate::store::{AccountRepository, MemoryStore, StoreError, TransactionRepository};
use crate::tx::Transaction;
use crate::validation::is_valid_amount;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;

/// **Manages accounts and records every balance mutation in the transaction log.**
///
/// Generic over the document store, so that any store that provides both collections can back it.
///
/// All mutations go through a single gate, which makes each read-check-write sequence
/// atomic with respect to other mutations. Lookups and history queries don't take the gate.
/// On top of that, the store rejects any replace that was based on a stale read.
pub struct Bank<S = MemoryStore> {
    store: S,
    clock: Arc<dyn Clock>,
    mutation_gate: Mutex<()>,
}

impl Bank<MemoryStore> {
    /// **Creates a new instance without any data.**
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new(), Arc::new(SystemClock))
    }
}

impl Default for Bank<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Bank<S>
where
    S: AccountRepository + TransactionRepository,
{
    /// **Creates a service on top of an existing store**
    ///
    /// The mutation gate only orders mutations made through this `Bank`.
    /// Anything else writing to the same store is caught by the store's version check,
    /// which surfaces as `BankError::Store(StoreError::VersionConflict)`.
    pub fn with_store(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            mutation_gate: Mutex::new(()),
        }
    }

    /// **Opens a new account**
    ///
    /// # Errors
    /// - Blank ID or holder's name, `BankError::InvalidAccount`;
    /// - Negative opening balance, `BankError::InvalidAmount`;
    /// - ID already taken, `BankError::AccountAlreadyExists`.
    pub async fn create_account(&self, new_account: NewAccount) -> BankResult<BankAccount> {
        let account = new_account.into_account()?;

        match self.store.insert(account).await {
            Ok(account) => {
                log::info!(
                    "Opened account {} for \"{}\" with balance {}",
                    account.id,
                    account.account_holder,
                    account.balance
                );
                Ok(account)
            }
            Err(StoreError::DuplicateKey(id)) => {
                log::warn!("Refused to open account {}: it already exists", id);
                Err(BankError::AccountAlreadyExists(id))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// **Retrieves an account**
    ///
    /// # Errors
    /// - Account doesn't exist, `BankError::AccountNotFound`
    pub async fn get_account(&self, id: &str) -> BankResult<BankAccount> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| BankError::AccountNotFound(id.to_string()))
    }

    /// **Retrieves all accounts, ordered by ID**
    pub async fn list_accounts(&self) -> BankResult<Vec<BankAccount>> {
        Ok(self.store.find_all().await?)
    }

    /// **Deposit funds**
    ///
    /// # Errors
    /// - Non-positive amount, `BankError::InvalidAmount`;
    /// - Account doesn't exist, `BankError::AccountNotFound`;
    /// - Attempted overflow, `BankError::BalanceOverflow`.
    pub async fn deposit(&self, account_id: &str, amount: Decimal) -> BankResult<Transaction> {
        check_amount(amount)?;
        let _gate = self.mutation_gate.lock().await;

        let mut account = self.get_account(account_id).await?;
        if let Err(err) = account.credit(amount) {
            log::warn!("Deposit refused: {}", err);
            return Err(err);
        }
        self.store.replace(account).await?;

        let tx = Transaction::deposit(account_id, amount, self.clock.now());
        let tx = self.store.append(tx).await?;
        log::info!("Deposited {} into {}", amount, account_id);

        Ok(tx)
    }

    /// **Withdraw funds**
    ///
    /// # Errors
    /// - Non-positive amount, `BankError::InvalidAmount`;
    /// - Account doesn't exist, `BankError::AccountNotFound`;
    /// - Balance lower than the amount, `BankError::InsufficientBalance`.
    pub async fn withdraw(&self, account_id: &str, amount: Decimal) -> BankResult<Transaction> {
        check_amount(amount)?;
        let _gate = self.mutation_gate.lock().await;

        let mut account = self.get_account(account_id).await?;
        if let Err(err) = account.debit(amount) {
            log::warn!("Withdrawal refused: {}", err);
            return Err(err);
        }
        self.store.replace(account).await?;

        let tx = Transaction::withdrawal(account_id, amount, self.clock.now());
        let tx = self.store.append(tx).await?;
        log::info!("Withdrew {} from {}", amount, account_id);

        Ok(tx)
    }

    /// **Transfer funds between a source and a destination account**
    ///
    /// Both accounts are checked before either of them is written,
    /// so a refused transfer leaves both balances untouched and records nothing.
    ///
    /// Checks are made in this order: the source exists, the source is sufficiently
    /// funded, the destination exists, the destination can take the amount.
    ///
    /// If the store refuses the destination's update after the source has been
    /// debited, the source's previous balance is written back before the error is returned.
    ///
    /// # Errors
    /// - Non-positive amount, `BankError::InvalidAmount`;
    /// - Source and destination are the same account, `BankError::SameAccountTransfer`;
    /// - Any of the two accounts doesn't exist, `BankError::AccountNotFound`;
    /// - Source balance lower than the amount, `BankError::InsufficientBalance`;
    /// - Attempted overflow of the destination, `BankError::BalanceOverflow`;
    /// - The store refused an update, `BankError::Store`.
    pub async fn transfer(
        &self,
        source_id: &str,
        destination_id: &str,
        amount: Decimal,
    ) -> BankResult<Transaction> {
        check_amount(amount)?;
        if source_id == destination_id {
            return Err(BankError::SameAccountTransfer(source_id.to_string()));
        }
        let _gate = self.mutation_gate.lock().await;

        let mut source = self.get_account(source_id).await?;
        if let Err(err) = source.debit(amount) {
            log::warn!("Transfer to {} refused: {}", destination_id, err);
            return Err(err);
        }
        let mut destination = self.get_account(destination_id).await?;
        if let Err(err) = destination.credit(amount) {
            log::warn!("Transfer from {} refused: {}", source_id, err);
            return Err(err);
        }

        let debited = self.store.replace(source).await?;
        if let Err(err) = self.store.replace(destination).await {
            log::error!(
                "Crediting {} failed after debiting {}: {}",
                destination_id,
                source_id,
                err
            );
            self.restore(debited, amount).await;
            return Err(err.into());
        }

        let tx = Transaction::transfer(source_id, destination_id, amount, self.clock.now());
        let tx = self.store.append(tx).await?;
        log::info!(
            "Transferred {} from {} to {}",
            amount,
            source_id,
            destination_id
        );

        Ok(tx)
    }

    /// Gives a debited amount back to an account whose transfer could not complete.
    async fn restore(&self, mut debited: BankAccount, amount: Decimal) {
        debited.balance += amount;
        let id = debited.id.clone();
        match self.store.replace(debited).await {
            Ok(_) => log::info!("Restored {} to {}", amount, id),
            Err(err) => log::error!("Could not restore {} to {}: {}", amount, id, err),
        }
    }

    /// **The entire transaction log, newest first**
    pub async fn global_history(&self) -> BankResult<Vec<Transaction>> {
        Ok(self.store.find_all_newest_first().await?)
    }

    /// **Transactions where the account is either the source or the destination, newest first**
    ///
    /// An unknown account simply has no history.
    pub async fn account_history(&self, account_id: &str) -> BankResult<Vec<Transaction>> {
        Ok(self.store.find_by_account_newest_first(account_id).await?)
    }
}

fn check_amount(amount: Decimal) -> BankResult<()> {
    if is_valid_amount(amount) {
        Ok(())
    } else {
        log::warn!("Rejected non-positive amount {}", amount);
        Err(BankError::InvalidAmount(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::StoreResult;
    use crate::tx::TransactionType;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn bank() -> Bank {
        Bank::with_store(
            MemoryStore::new(),
            Arc::new(ManualClock::new(Utc::now(), Duration::milliseconds(1))),
        )
    }

    async fn open(bank: &Bank, id: &str, balance: Decimal) {
        bank.create_account(NewAccount::new(id, "Holder", Some(balance)))
            .await
            .unwrap();
    }

    async fn balance(bank: &Bank, id: &str) -> Decimal {
        bank.get_account(id).await.unwrap().balance
    }

    #[tokio::test]
    async fn create_and_get_works() {
        let bank = bank();

        let created = bank
            .create_account(NewAccount::new("ACC-1", "Alice", Some(dec!(100))))
            .await
            .unwrap();

        assert_eq!(created, bank.get_account("ACC-1").await.unwrap());
        assert_eq!(vec![created], bank.list_accounts().await.unwrap());
    }

    #[tokio::test]
    async fn create_err_already_exists() {
        let bank = bank();
        open(&bank, "ACC-1", dec!(100)).await;

        assert_eq!(
            Err(BankError::AccountAlreadyExists("ACC-1".to_string())),
            bank.create_account(NewAccount::new("ACC-1", "Mallory", None))
                .await
        );
        assert_eq!(dec!(100), balance(&bank, "ACC-1").await);
    }

    #[tokio::test]
    async fn get_err_doesnt_exist() {
        let bank = bank();
        assert_eq!(
            Err(BankError::AccountNotFound("nope".to_string())),
            bank.get_account("nope").await
        );
    }

    #[tokio::test]
    async fn deposit_works() {
        let bank = bank();
        open(&bank, "A", dec!(100)).await;

        let tx = bank.deposit("A", dec!(20.25)).await.unwrap();

        assert_eq!(TransactionType::Deposit, tx.tx_type);
        assert_eq!(dec!(20.25), tx.amount);
        assert_eq!(Some("A".to_string()), tx.destination_account_id);
        assert_eq!(None, tx.source_account_id);
        assert_eq!(dec!(120.25), balance(&bank, "A").await);
        assert_eq!(vec![tx], bank.global_history().await.unwrap());
    }

    #[tokio::test]
    async fn deposit_err_doesnt_exist() {
        let bank = bank();
        assert_eq!(
            Err(BankError::AccountNotFound("A".to_string())),
            bank.deposit("A", dec!(1)).await
        );
        assert!(bank.global_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deposit_err_non_positive() {
        let bank = bank();
        open(&bank, "A", dec!(100)).await;

        assert_eq!(
            Err(BankError::InvalidAmount(dec!(-30))),
            bank.deposit("A", dec!(-30)).await
        );
        assert_eq!(
            Err(BankError::InvalidAmount(Decimal::ZERO)),
            bank.deposit("A", Decimal::ZERO).await
        );
        assert_eq!(dec!(100), balance(&bank, "A").await);
    }

    #[tokio::test]
    async fn withdraw_works() {
        let bank = bank();
        open(&bank, "A", dec!(100)).await;

        let tx = bank.withdraw("A", dec!(30)).await.unwrap();

        assert_eq!(TransactionType::Withdrawal, tx.tx_type);
        assert_eq!(Some("A".to_string()), tx.source_account_id);
        assert_eq!(None, tx.destination_account_id);
        assert_eq!(dec!(70), balance(&bank, "A").await);
    }

    #[tokio::test]
    async fn withdraw_whole_balance_works() {
        let bank = bank();
        open(&bank, "A", dec!(100)).await;

        assert!(bank.withdraw("A", dec!(100)).await.is_ok());
        assert_eq!(Decimal::ZERO, balance(&bank, "A").await);
    }

    #[tokio::test]
    async fn withdraw_err_insufficient() {
        let bank = bank();
        open(&bank, "A", dec!(100)).await;

        assert_eq!(
            Err(BankError::InsufficientBalance {
                account: "A".to_string(),
                balance: dec!(100),
                amount: dec!(130),
            }),
            bank.withdraw("A", dec!(130)).await
        );
        assert_eq!(dec!(100), balance(&bank, "A").await);
        assert!(bank.global_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn withdraw_err_doesnt_exist() {
        let bank = bank();
        assert_eq!(
            Err(BankError::AccountNotFound("A".to_string())),
            bank.withdraw("A", dec!(1)).await
        );
    }

    #[tokio::test]
    async fn transfer_works() {
        let bank = bank();
        open(&bank, "A", dec!(100)).await;
        open(&bank, "B", dec!(50)).await;

        let tx = bank.transfer("A", "B", dec!(10)).await.unwrap();

        assert_eq!(TransactionType::Transfer, tx.tx_type);
        assert_eq!(Some("A".to_string()), tx.source_account_id);
        assert_eq!(Some("B".to_string()), tx.destination_account_id);
        assert_eq!(dec!(90), balance(&bank, "A").await);
        assert_eq!(dec!(60), balance(&bank, "B").await);
        assert_eq!(1, bank.global_history().await.unwrap().len());
    }

    #[tokio::test]
    async fn transfer_err_source_doesnt_exist() {
        let bank = bank();
        open(&bank, "B", dec!(50)).await;

        assert_eq!(
            Err(BankError::AccountNotFound("A".to_string())),
            bank.transfer("A", "B", dec!(10)).await
        );
        assert_eq!(dec!(50), balance(&bank, "B").await);
    }

    #[tokio::test]
    async fn transfer_err_destination_doesnt_exist_leaves_source_untouched() {
        let bank = bank();
        open(&bank, "A", dec!(100)).await;

        assert_eq!(
            Err(BankError::AccountNotFound("B".to_string())),
            bank.transfer("A", "B", dec!(10)).await
        );
        assert_eq!(dec!(100), balance(&bank, "A").await);
        assert!(bank.global_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transfer_err_no_one_exists() {
        let bank = bank();

        // Source is checked first
        assert_eq!(
            Err(BankError::AccountNotFound("A".to_string())),
            bank.transfer("A", "B", dec!(10)).await
        );
    }

    #[tokio::test]
    async fn transfer_err_insufficient_checked_before_destination() {
        let bank = bank();
        open(&bank, "A", dec!(5)).await;

        assert!(matches!(
            bank.transfer("A", "B", dec!(10)).await,
            Err(BankError::InsufficientBalance { .. })
        ));
    }

    #[tokio::test]
    async fn transfer_err_insufficient() {
        let bank = bank();
        open(&bank, "A", dec!(100)).await;
        open(&bank, "B", dec!(50)).await;

        assert_eq!(
            Err(BankError::InsufficientBalance {
                account: "A".to_string(),
                balance: dec!(100),
                amount: dec!(200),
            }),
            bank.transfer("A", "B", dec!(200)).await
        );
        assert_eq!(dec!(100), balance(&bank, "A").await);
        assert_eq!(dec!(50), balance(&bank, "B").await);
    }

    #[tokio::test]
    async fn transfer_err_same_account() {
        let bank = bank();
        open(&bank, "A", dec!(100)).await;

        assert_eq!(
            Err(BankError::SameAccountTransfer("A".to_string())),
            bank.transfer("A", "A", dec!(10)).await
        );
        assert_eq!(dec!(100), balance(&bank, "A").await);
    }

    #[tokio::test]
    async fn history_newest_first() {
        let bank = bank();
        open(&bank, "A", dec!(100)).await;
        open(&bank, "B", dec!(100)).await;
        open(&bank, "C", dec!(100)).await;

        let first = bank.deposit("A", dec!(1)).await.unwrap();
        let second = bank.withdraw("B", dec!(2)).await.unwrap();
        let third = bank.transfer("B", "A", dec!(3)).await.unwrap();
        let fourth = bank.deposit("C", dec!(4)).await.unwrap();

        let global = bank.global_history().await.unwrap();
        assert_eq!(
            vec![fourth.clone(), third.clone(), second.clone(), first.clone()],
            global
        );
        assert!(global.windows(2).all(|w| w[0].timestamp > w[1].timestamp));

        assert_eq!(
            vec![third.clone(), first],
            bank.account_history("A").await.unwrap()
        );
        assert_eq!(vec![third, second], bank.account_history("B").await.unwrap());
        assert!(bank.account_history("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deposit_err_overflow() {
        let bank = bank();
        open(&bank, "A", Decimal::MAX).await;

        assert_eq!(
            Err(BankError::BalanceOverflow {
                account: "A".to_string(),
                balance: Decimal::MAX,
                amount: Decimal::ONE,
            }),
            bank.deposit("A", Decimal::ONE).await
        );
        assert_eq!(Decimal::MAX, balance(&bank, "A").await);
        assert!(bank.global_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transfer_err_destination_overflow() {
        let bank = bank();
        open(&bank, "A", dec!(100)).await;
        open(&bank, "B", Decimal::MAX).await;

        assert!(matches!(
            bank.transfer("A", "B", dec!(10)).await,
            Err(BankError::BalanceOverflow { .. })
        ));
        assert_eq!(dec!(100), balance(&bank, "A").await);
        assert_eq!(Decimal::MAX, balance(&bank, "B").await);
        assert!(bank.global_history().await.unwrap().is_empty());
    }

    /// A store that refuses every replace of one account, the way a concurrent
    /// writer outside of `Bank` would make it do.
    struct RefusingStore {
        inner: MemoryStore,
        refused: &'static str,
    }

    #[async_trait::async_trait]
    impl AccountRepository for RefusingStore {
        async fn find_by_id(&self, id: &str) -> StoreResult<Option<BankAccount>> {
            self.inner.find_by_id(id).await
        }

        async fn find_all(&self) -> StoreResult<Vec<BankAccount>> {
            self.inner.find_all().await
        }

        async fn insert(&self, account: BankAccount) -> StoreResult<BankAccount> {
            self.inner.insert(account).await
        }

        async fn replace(&self, account: BankAccount) -> StoreResult<BankAccount> {
            if account.id == self.refused {
                return Err(StoreError::VersionConflict {
                    id: account.id,
                    expected: account.version,
                    found: account.version + 1,
                });
            }
            self.inner.replace(account).await
        }
    }

    #[async_trait::async_trait]
    impl TransactionRepository for RefusingStore {
        async fn append(&self, tx: Transaction) -> StoreResult<Transaction> {
            self.inner.append(tx).await
        }

        async fn find_all_newest_first(&self) -> StoreResult<Vec<Transaction>> {
            self.inner.find_all_newest_first().await
        }

        async fn find_by_account_newest_first(
            &self,
            account: &str,
        ) -> StoreResult<Vec<Transaction>> {
            self.inner.find_by_account_newest_first(account).await
        }
    }

    #[tokio::test]
    async fn transfer_restores_source_when_destination_update_fails() {
        let bank = Bank::with_store(
            RefusingStore {
                inner: MemoryStore::new(),
                refused: "B",
            },
            Arc::new(SystemClock),
        );
        for (id, amount) in [("A", dec!(100)), ("B", dec!(50))] {
            bank.create_account(NewAccount::new(id, "Holder", Some(amount)))
                .await
                .unwrap();
        }

        assert!(matches!(
            bank.transfer("A", "B", dec!(10)).await,
            Err(BankError::Store(StoreError::VersionConflict { .. }))
        ));

        let source = bank.get_account("A").await.unwrap();
        assert_eq!(dec!(100), source.balance);
        // One replace for the debit, one for giving it back
        assert_eq!(2, source.version);
        assert_eq!(dec!(50), bank.get_account("B").await.unwrap().balance);
        assert!(bank.global_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_deposits_lose_nothing() {
        let bank = Arc::new(Bank::new());
        open(&bank, "A", Decimal::ZERO).await;

        let mut handles = vec![];
        for _ in 0..100 {
            let bank = bank.clone();
            handles.push(tokio::spawn(async move {
                bank.deposit("A", dec!(10)).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(dec!(1000), balance(&bank, "A").await);
        assert_eq!(100, bank.account_history("A").await.unwrap().len());
    }

    #[tokio::test]
    async fn concurrent_withdrawals_never_overdraw() {
        let bank = Arc::new(Bank::new());
        open(&bank, "A", dec!(50)).await;

        let mut handles = vec![];
        for _ in 0..20 {
            let bank = bank.clone();
            handles.push(tokio::spawn(async move {
                bank.withdraw("A", dec!(10)).await.is_ok()
            }));
        }
        let mut succeeded = 0;
        for h in handles {
            if h.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(5, succeeded);
        assert_eq!(Decimal::ZERO, balance(&bank, "A").await);
    }
}
