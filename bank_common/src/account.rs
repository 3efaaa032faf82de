use crate::errors::{BankError, ACCOUNT_HOLDER_NOT_VALID_MSG, ACCOUNT_ID_NOT_VALID_MSG};
use crate::validation::is_valid_name;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// **A bank account document**
///
/// The `id` is the account number and acts as the primary key.
///
/// `version` is owned by the store: it starts at zero and is bumped
/// by every successful replace of the document.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: String,
    pub account_holder: String,
    pub balance: Decimal,
    #[serde(default)]
    pub version: u64,
}

impl BankAccount {
    /// Adds `amount` to the balance, if the result is representable.
    ///
    /// # Errors
    /// - Attempted overflow, `BankError::BalanceOverflow`;
    ///   the balance is left untouched.
    pub fn credit(&mut self, amount: Decimal) -> Result<(), BankError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(BankError::BalanceOverflow {
                account: self.id.clone(),
                balance: self.balance,
                amount,
            })?;
        Ok(())
    }

    /// Subtracts `amount` from the balance, if the balance covers it.
    ///
    /// # Errors
    /// - Balance lower than `amount`, `BankError::InsufficientBalance`;
    ///   the balance is left untouched.
    pub fn debit(&mut self, amount: Decimal) -> Result<(), BankError> {
        if self.balance < amount {
            return Err(BankError::InsufficientBalance {
                account: self.id.clone(),
                balance: self.balance,
                amount,
            });
        }
        self.balance -= amount;
        Ok(())
    }
}

/// **A client-supplied record for opening an account**
///
/// The opening balance is optional and defaults to zero.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub id: String,
    pub account_holder: String,
    pub balance: Option<Decimal>,
}

impl NewAccount {
    pub fn new(id: &str, account_holder: &str, balance: Option<Decimal>) -> Self {
        Self {
            id: id.to_string(),
            account_holder: account_holder.to_string(),
            balance,
        }
    }

    /// Validates the record and turns it into a fresh [`BankAccount`].
    ///
    /// Surrounding whitespace is stripped from the holder's name.
    /// The ID is the lookup key of every other operation, so it is taken verbatim.
    ///
    /// # Errors
    /// - Blank ID or holder's name, `BankError::InvalidAccount`;
    /// - ID with leading or trailing whitespace, `BankError::InvalidAccount`;
    /// - Negative opening balance, `BankError::InvalidAmount`.
    pub fn into_account(self) -> Result<BankAccount, BankError> {
        if let Some(msg) = is_valid_name(&self.id) {
            return Err(BankError::InvalidAccount(format!(
                "{}: \"{}\". {}",
                ACCOUNT_ID_NOT_VALID_MSG, self.id, msg
            )));
        }
        if self.id.trim() != self.id {
            return Err(BankError::InvalidAccount(format!(
                "{}: \"{}\". It cannot start or end with whitespace.",
                ACCOUNT_ID_NOT_VALID_MSG, self.id
            )));
        }
        if let Some(msg) = is_valid_name(&self.account_holder) {
            return Err(BankError::InvalidAccount(format!(
                "{}: \"{}\". {}",
                ACCOUNT_HOLDER_NOT_VALID_MSG, self.account_holder, msg
            )));
        }

        let balance = self.balance.unwrap_or(Decimal::ZERO);
        if balance < Decimal::ZERO {
            return Err(BankError::InvalidAmount(balance));
        }

        Ok(BankAccount {
            id: self.id,
            account_holder: self.account_holder.trim().to_string(),
            balance,
            version: 0,
        })
    }
}
