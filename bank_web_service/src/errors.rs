//! Rejections and their conversion into HTTP error responses

use bank_common::errors::BankError;
use bank_common::store::StoreError;
use bank_common::ErrorResponse;
use std::convert::Infallible;
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject::{MethodNotAllowed, PayloadTooLarge, Reject, UnsupportedMediaType};
use warp::{Rejection, Reply};

#[derive(Debug)]
pub struct WebServiceBankError(pub BankError);

impl Reject for WebServiceBankError {}

/// Wraps a domain error into a custom rejection
pub fn reject(err: BankError) -> Rejection {
    warp::reject::custom(WebServiceBankError(err))
}

/// Maps a domain error to the status code it is reported with
pub fn status_of(err: &BankError) -> StatusCode {
    match err {
        BankError::AccountNotFound(_) => StatusCode::NOT_FOUND,
        BankError::InsufficientBalance { .. }
        | BankError::BalanceOverflow { .. }
        | BankError::InvalidAmount(_)
        | BankError::InvalidAccount(_)
        | BankError::SameAccountTransfer(_) => StatusCode::BAD_REQUEST,
        BankError::AccountAlreadyExists(_)
        | BankError::Store(StoreError::DuplicateKey(_))
        | BankError::Store(StoreError::VersionConflict { .. }) => StatusCode::CONFLICT,
        BankError::Store(StoreError::DocumentNotFound(_)) => StatusCode::NOT_FOUND,
    }
}

/// **Turns every rejection into a JSON error response**
///
/// The body is always an [`ErrorResponse`].
pub async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "No such resource".to_string())
    } else if let Some(WebServiceBankError(err)) = rejection.find::<WebServiceBankError>() {
        (status_of(err), err.to_string())
    } else if let Some(err) = rejection.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, err.to_string())
    } else if rejection.find::<PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body is too large".to_string(),
        )
    } else if rejection.find::<UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Request body must be JSON".to_string(),
        )
    } else if rejection.find::<MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else {
        log::error!("Unhandled rejection: {:?}", rejection);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    if status.is_server_error() {
        log::error!("{} {}", status, message);
    } else {
        log::debug!("{} {}", status, message);
    }

    let body = ErrorResponse {
        status: status.as_u16(),
        error: status.canonical_reason().unwrap_or("Unknown").to_string(),
        message,
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
