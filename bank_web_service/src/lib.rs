pub mod config;
pub mod errors;
pub mod handlers;
pub mod routes;

use bank_common::bank::Bank;
use std::sync::Arc;

/// The bank service shared by all request handlers
pub type SharedBank = Arc<Bank>;
