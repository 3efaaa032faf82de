use crate::store::StoreError;
use rust_decimal::Decimal;
use thiserror::Error;

/// **An application-specific error type**
#[derive(Debug, Error, PartialEq)]
pub enum BankError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Insufficient balance in account {account}: balance {balance}, requested {amount}")]
    InsufficientBalance {
        account: String,
        balance: Decimal,
        amount: Decimal,
    },

    #[error("Balance of account {account} would overflow: balance {balance}, credited {amount}")]
    BalanceOverflow {
        account: String,
        balance: Decimal,
        amount: Decimal,
    },

    #[error("Amount must be positive; got {0}")]
    InvalidAmount(Decimal),

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Cannot transfer from account {0} to itself")]
    SameAccountTransfer(String),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type BankResult<T> = Result<T, BankError>;

pub const ACCOUNT_ID_NOT_VALID_MSG: &str = "Account ID is not valid";
pub const ACCOUNT_HOLDER_NOT_VALID_MSG: &str = "Account holder's name is not valid";
