pub mod account;
pub mod bank;
pub mod cli;
pub mod clock;
pub mod errors;
pub mod requests;
pub mod store;
pub mod tx;
pub mod validation;

pub use requests::*;
