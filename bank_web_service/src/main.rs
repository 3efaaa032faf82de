//! The "Bank Web Service's" entry point.

use bank_common::bank::Bank;
use bank_web_service::config::ServiceConfig;
use bank_web_service::routes::routes;
use std::env;
use std::sync::Arc;

/// The "Bank Web Service's" entry point.
#[tokio::main]
async fn main() {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "bank=info");
    }
    pretty_env_logger::init();

    let config = ServiceConfig::from_env();
    let bank = Arc::new(Bank::new());

    log::info!("Bank web service listening on {}", config.socket_addr());

    // Start up the server
    warp::serve(routes(bank)).run(config.socket_addr()).await;
}
