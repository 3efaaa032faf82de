//! The route tree of the web service

use crate::errors::handle_rejection;
use crate::handlers;
use crate::SharedBank;
use std::convert::Infallible;
use warp::{Filter, Reply};

const MAX_BODY_LEN: u64 = 1024 * 16;

/// Makes the shared bank available to handlers.
fn with_bank(
    bank: SharedBank,
) -> impl Filter<Extract = (SharedBank,), Error = Infallible> + Clone {
    warp::any().map(move || bank.clone())
}

/// **Builds all routes**
///
/// Every rejection is recovered into a JSON error response,
/// and every request is logged under the `bank` target.
pub fn routes(bank: SharedBank) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let log = warp::log("bank");

    let create_account = warp::path!("api" / "bank-accounts")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_LEN))
        .and(warp::body::json())
        .and(with_bank(bank.clone()))
        .and_then(handlers::create_account);

    let get_account = warp::path!("api" / "bank-accounts" / String)
        .and(warp::get())
        .and(with_bank(bank.clone()))
        .and_then(handlers::get_account);

    let all_accounts = warp::path!("api" / "bank-accounts")
        .and(warp::get())
        .and(with_bank(bank.clone()))
        .and_then(handlers::all_accounts);

    let deposit = warp::path!("api" / "transactions" / "deposit")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_LEN))
        .and(warp::body::json())
        .and(with_bank(bank.clone()))
        .and_then(handlers::deposit);

    let withdraw = warp::path!("api" / "transactions" / "withdraw")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_LEN))
        .and(warp::body::json())
        .and(with_bank(bank.clone()))
        .and_then(handlers::withdraw);

    let transfer = warp::path!("api" / "transactions" / "transfer")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_LEN))
        .and(warp::body::json())
        .and(with_bank(bank.clone()))
        .and_then(handlers::transfer);

    let global_history = warp::path!("api" / "transactions")
        .and(warp::get())
        .and(with_bank(bank.clone()))
        .and_then(handlers::global_history);

    let account_history = warp::path!("api" / "transactions" / "account" / String)
        .and(warp::get())
        .and(with_bank(bank))
        .and_then(handlers::account_history);

    create_account
        .or(get_account)
        .or(all_accounts)
        .or(deposit)
        .or(withdraw)
        .or(transfer)
        .or(global_history)
        .or(account_history)
        .recover(handle_rejection)
        .with(log)
}
