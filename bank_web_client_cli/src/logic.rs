use crate::DEFAULT_BASE_URL;
use bank_common::account::{BankAccount, NewAccount};
use bank_common::cli::constants::*;
use bank_common::cli::helpers::*;
use bank_common::requests::*;
use bank_common::tx::Transaction;
use reqwest::{Client, Response, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt::Debug;

pub async fn main_loop(base_url: Url) -> Result<(), Box<dyn Error>> {
    let client = Client::new();

    loop {
        if let Some(line) = read_from_stdin(PROMPT) {
            let words = line.split_whitespace().collect::<Vec<_>>();
            let cmd = words[0].to_lowercase();

            match cmd.as_str() {
                HELP | "h" => help(),
                CREATE | "cr" => create(words, &client, &base_url).await?,
                ACCOUNT | "a" => print_single_account(words, &client, &base_url).await?,
                ACCOUNTS | "as" => print_accounts(&client, &base_url).await?,
                DEPOSIT | "d" => deposit(words, &client, &base_url).await?,
                WITHDRAW | "w" => withdraw(words, &client, &base_url).await?,
                TRANSFER | "t" => transfer(words, &client, &base_url).await?,
                HISTORY | "hi" => print_history(words, &client, &base_url).await?,
                QUIT | "q" => break,
                _ => println!("Unrecognized command; try `help`."),
            }
        }
    }

    Ok(())
}

/// **Get base URL**
///
/// Tries to create a URL from the provided argument.
///
/// If that is not possible, falls back to a default.
///
/// - If the provided argument is the `None` variant,
///   returns a default value as the base URL.
/// - If it's a `String`, tries to parse it into URL.
///   - If it's a valid URL string, returns it as URL.
///   - If it's a malformed URL string, returns the default.
///
/// The default value is [`DEFAULT_BASE_URL`].
pub fn get_base_url(base_url: Option<String>) -> Url {
    let default = || Url::parse(DEFAULT_BASE_URL).expect("the default base URL is valid");

    let Some(base_url) = base_url else {
        println!(
            "No CLI base URL provided; using default: {}",
            DEFAULT_BASE_URL
        );
        return default();
    };

    Url::parse(base_url.as_str()).unwrap_or_else(|_| {
        println!(
            "Provided base URL could not be parsed; using default: {}",
            DEFAULT_BASE_URL
        );
        default()
    })
}

/// **Joins `path` onto the base URL and appends one escaped segment**
///
/// Account IDs may contain spaces or URL-reserved characters such as `/`, `#` and `?`,
/// so they can't be spliced into the path as they are.
fn url_with_segment(base_url: &Url, path: &str, segment: &str) -> Result<Url, Box<dyn Error>> {
    let mut url = base_url.join(path)?;
    url.path_segments_mut()
        .map_err(|_| format!("{} cannot be a base URL", base_url))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

/// **Prints the body of a response**
///
/// A successful response is decoded into `T`;
/// an error response is printed together with its status.
async fn print_response<T>(response: Response, label: &str) -> Result<(), Box<dyn Error>>
where
    T: DeserializeOwned + Debug,
{
    let status = response.status();

    if status.is_success() {
        let body: T = response.json().await?;
        println!("{label}: {:#?}", body);
    } else {
        let text = response.text().await?;
        match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(err) => eprintln!("[ERROR] {} \"{}\"", status, err.message),
            Err(_) => eprintln!("[ERROR] {} \"{}\"", status, text),
        }
    }

    Ok(())
}

/// **Open a new account**
///
/// The holder's name can consist of multiple words.
/// We can wrap it in single or double quotes, but we don't have to use any quotes at all.
///
/// The account opens with a zero balance.
async fn create(words: Vec<&str>, client: &Client, base_url: &Url) -> Result<(), Box<dyn Error>> {
    if words.len() < 3 {
        println!("The create command: {CREATE} <account id> 'holder full name'");
        return Ok(());
    }

    let id = words[1];
    let holder = join_name(&words[2..]);

    if is_valid_id(id) {
        let url = base_url.join("api/bank-accounts")?;
        let response = client
            .post(url)
            .json(&NewAccount::new(id, &holder, None))
            .send()
            .await?;
        print_response::<BankAccount>(response, "Opened").await?;
    }

    Ok(())
}

/// **Send a POST request for `deposit` and `withdraw`**
async fn account_update_request(
    client: &Client,
    base_url: &Url,
    path: &str,
    account_id: &str,
    amount: Decimal,
) -> Result<(), Box<dyn Error>> {
    let url = base_url.join(path)?;

    let response = client
        .post(url)
        .json(&AccountUpdateRequest {
            account_id: account_id.to_string(),
            amount,
        })
        .send()
        .await?;

    print_response::<Transaction>(response, "Recorded").await
}

/// **Deposit funds to an account**
///
/// The account needs to exist in advance.
/// The amount has to be positive; the service refuses anything else.
async fn deposit(words: Vec<&str>, client: &Client, base_url: &Url) -> Result<(), Box<dyn Error>> {
    if words.len() != 3 {
        println!("The deposit command: {DEPOSIT} <account id> <amount>");
        return Ok(());
    }

    if let Some(amount) = parse_amount(words[2]) {
        if is_valid_id(words[1]) {
            account_update_request(
                client,
                base_url,
                "api/transactions/deposit",
                words[1],
                amount,
            )
            .await?;
        }
    }

    Ok(())
}

/// **Withdraw funds from an account**
///
/// If the account doesn't exist or its balance doesn't cover the amount,
/// an error message will be output to the user, but the execution won't break.
async fn withdraw(words: Vec<&str>, client: &Client, base_url: &Url) -> Result<(), Box<dyn Error>> {
    if words.len() != 3 {
        println!("The withdraw command: {WITHDRAW} <account id> <amount>");
        return Ok(());
    }

    if let Some(amount) = parse_amount(words[2]) {
        if is_valid_id(words[1]) {
            account_update_request(
                client,
                base_url,
                "api/transactions/withdraw",
                words[1],
                amount,
            )
            .await?;
        }
    }

    Ok(())
}

/// **Transfer funds from one account to another account**
///
/// Both accounts need to exist in advance.
async fn transfer(words: Vec<&str>, client: &Client, base_url: &Url) -> Result<(), Box<dyn Error>> {
    if words.len() != 5 || words[2] != SEPARATOR {
        println!("The transfer command: {TRANSFER} <source id> {SEPARATOR} <destination id> <amount>");
        return Ok(());
    }

    let source = words[1];
    let destination = words[3];

    if let Some(amount) = parse_amount(words[4]) {
        if is_valid_id(source) && is_valid_id(destination) {
            let url = base_url.join("api/transactions/transfer")?;
            let response = client
                .post(url)
                .json(&TransferRequest {
                    source_account_id: source.to_string(),
                    destination_account_id: destination.to_string(),
                    amount,
                })
                .send()
                .await?;
            print_response::<Transaction>(response, "Recorded").await?;
        }
    }

    Ok(())
}

/// **Print the transaction log, newest first**
///
/// Without an account ID, prints the entire log;
/// otherwise only the transactions that touch the account.
async fn print_history(
    words: Vec<&str>,
    client: &Client,
    base_url: &Url,
) -> Result<(), Box<dyn Error>> {
    let url = match words.get(1) {
        Some(id) => url_with_segment(base_url, "api/transactions/account", id)?,
        None => base_url.join("api/transactions")?,
    };
    let response = client.get(url).send().await?;

    print_response::<Vec<Transaction>>(response, "Transaction history").await
}

/// **Print all accounts and their balances**
pub async fn print_accounts(client: &Client, base_url: &Url) -> Result<(), Box<dyn Error>> {
    let url = base_url.join("api/bank-accounts")?;
    let response = client.get(url).send().await?;

    print_response::<Vec<BankAccount>>(response, "Accounts").await
}

/// **Print a single requested account**
async fn print_single_account(
    words: Vec<&str>,
    client: &Client,
    base_url: &Url,
) -> Result<(), Box<dyn Error>> {
    if words.len() != 2 {
        println!("The account command: {ACCOUNT} <account id>");
        return Ok(());
    }

    let id = words[1];
    if is_valid_id(id) {
        let url = url_with_segment(base_url, "api/bank-accounts", id)?;
        let response = client.get(url).send().await?;
        print_response::<BankAccount>(response, "Account").await?;
    }

    Ok(())
}
