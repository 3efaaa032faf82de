//! Handler functions

use crate::errors::reject;
use crate::SharedBank;
use bank_common::account::NewAccount;
use bank_common::errors::{BankError, ACCOUNT_ID_NOT_VALID_MSG};
use bank_common::{AccountUpdateRequest, TransferRequest};
use percent_encoding::percent_decode_str;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

/// **Decodes an account ID taken from a URL path segment**
///
/// warp hands path parameters over still percent-encoded.
fn decode_account_id(raw: &str) -> Result<String, Rejection> {
    match percent_decode_str(raw).decode_utf8() {
        Ok(id) => Ok(id.into_owned()),
        Err(_) => {
            let msg = format!(
                "{}: \"{}\". It is not valid UTF-8 once decoded.",
                ACCOUNT_ID_NOT_VALID_MSG, raw
            );
            log::warn!("{}", msg);
            Err(reject(BankError::InvalidAccount(msg)))
        }
    }
}

/// The `create_account` handler
///
/// Responds with the stored account and `201 Created`.
///
/// POST /api/bank-accounts
pub async fn create_account(
    new_account: NewAccount,
    bank: SharedBank,
) -> Result<impl Reply, Rejection> {
    log::debug!("create_account; new_account = {:?}", new_account);

    let account = bank.create_account(new_account).await.map_err(reject)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&account),
        StatusCode::CREATED,
    ))
}

/// The `get_account` handler
///
/// GET /api/bank-accounts/{id}
pub async fn get_account(id: String, bank: SharedBank) -> Result<impl Reply, Rejection> {
    log::debug!("get_account; id = {}", id);
    let id = decode_account_id(&id)?;

    match bank.get_account(&id).await {
        Ok(account) => Ok(warp::reply::json(&account)),
        Err(err) => Err(reject(err)),
    }
}

/// The `all_accounts` handler
///
/// Responds with all accounts, ordered by ID.
///
/// GET /api/bank-accounts
pub async fn all_accounts(bank: SharedBank) -> Result<impl Reply, Rejection> {
    log::debug!("all_accounts");

    let accounts = bank.list_accounts().await.map_err(reject)?;
    Ok(warp::reply::json(&accounts))
}

/// The `deposit` handler
///
/// POST /api/transactions/deposit
pub async fn deposit(
    request: AccountUpdateRequest,
    bank: SharedBank,
) -> Result<impl Reply, Rejection> {
    log::debug!("deposit; request = {:?}", request);

    match bank.deposit(&request.account_id, request.amount).await {
        Ok(tx) => Ok(warp::reply::json(&tx)),
        Err(err) => Err(reject(err)),
    }
}

/// The `withdraw` handler
///
/// POST /api/transactions/withdraw
pub async fn withdraw(
    request: AccountUpdateRequest,
    bank: SharedBank,
) -> Result<impl Reply, Rejection> {
    log::debug!("withdraw; request = {:?}", request);

    match bank.withdraw(&request.account_id, request.amount).await {
        Ok(tx) => Ok(warp::reply::json(&tx)),
        Err(err) => Err(reject(err)),
    }
}

/// The `transfer` handler
///
/// POST /api/transactions/transfer
pub async fn transfer(request: TransferRequest, bank: SharedBank) -> Result<impl Reply, Rejection> {
    log::debug!("transfer; request = {:?}", request);

    match bank
        .transfer(
            &request.source_account_id,
            &request.destination_account_id,
            request.amount,
        )
        .await
    {
        Ok(tx) => Ok(warp::reply::json(&tx)),
        Err(err) => Err(reject(err)),
    }
}

/// The `global_history` handler
///
/// Responds with the entire transaction log, newest first.
///
/// GET /api/transactions
pub async fn global_history(bank: SharedBank) -> Result<impl Reply, Rejection> {
    log::debug!("global_history");

    let history = bank.global_history().await.map_err(reject)?;
    Ok(warp::reply::json(&history))
}

/// The `account_history` handler
///
/// Responds with every transaction in which the account is either
/// the source or the destination, newest first.
/// An unknown account gets an empty list.
///
/// GET /api/transactions/account/{id}
pub async fn account_history(id: String, bank: SharedBank) -> Result<impl Reply, Rejection> {
    log::debug!("account_history; id = {}", id);
    let id = decode_account_id(&id)?;

    let history = bank.account_history(&id).await.map_err(reject)?;
    Ok(warp::reply::json(&history))
}

#[cfg(test)]
mod tests {
    use super::decode_account_id;

    #[test]
    fn test_decodes_escaped_characters() {
        assert_eq!("ACC 001", decode_account_id("ACC%20001").unwrap());
        assert_eq!("a/b#c?d", decode_account_id("a%2Fb%23c%3Fd").unwrap());
    }

    #[test]
    fn test_plain_id_unchanged() {
        assert_eq!("ACC-001", decode_account_id("ACC-001").unwrap());
    }

    #[test]
    fn test_invalid_utf8_fails() {
        assert!(decode_account_id("%FF").is_err());
    }
}
