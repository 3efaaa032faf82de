//! Helper functions that are common to CLI apps

use crate::cli::constants::*;
use crate::errors::ACCOUNT_ID_NOT_VALID_MSG;
use crate::validation;
use rust_decimal::Decimal;
use std::io::{stdin, stdout, Write};
use std::str::FromStr;

/// **Contains full variants of all existing commands.**
///
/// Wrapped by `help()` so we can unit-test the contents,
/// so that we don't forget to include a newly-added command to help.
fn help_contents_full() -> String {
    format!(
        "{HELP} {CREATE} {ACCOUNT} {ACCOUNTS} {DEPOSIT} {WITHDRAW} {TRANSFER} {HISTORY} {QUIT}"
    )
}

/// **Contains short variants of all existing commands.**
fn help_contents_short() -> String {
    "h cr a as d w t hi q".to_string()
}

/// **Prints all existing commands in their full and short variants.**
pub fn help() {
    println!("{}", help_contents_full());
    println!("{}", help_contents_short());
}

/// **Reads standard input into a line.**
///
/// Signals an empty line so we can ignore it (in the main loop).
///
/// The end of input is read as the quit command.
pub fn read_from_stdin(label: &str) -> Option<String> {
    let mut out = stdout().lock();
    if write!(out, "\n{label}").and_then(|_| out.flush()).is_err() {
        eprintln!("[ERROR] Failed to write the prompt to stdout.");
    }

    let mut line = String::new();
    match stdin().read_line(&mut line) {
        Ok(0) => Some(QUIT.to_string()),
        Ok(_) => {
            if line.trim().is_empty() {
                None
            } else {
                Some(line.to_owned())
            }
        }
        Err(err) => {
            eprintln!("[ERROR] Failed to read line: {}", err);
            None
        }
    }
}

/// **Joins words into a name and strips optional surrounding quotes.**
///
/// A holder's name can consist of multiple words.
/// We can wrap it in single or double quotes, but we don't have to use any quotes at all.
pub fn join_name(words: &[&str]) -> String {
    words
        .join(" ")
        .trim_matches(|c| c == '\'' || c == '\"')
        .trim()
        .to_string()
}

/// **Basic input validation for an account ID**
///
/// Checks for:
/// - An empty string.
pub fn is_valid_id(id: &str) -> bool {
    match validation::is_valid_name(id) {
        Some(msg) => {
            eprintln!("[ERROR] {}: \"{}\". {}", ACCOUNT_ID_NOT_VALID_MSG, id, msg);
            false
        }
        None => true,
    }
}

/// **Parses an amount of money**
///
/// Prints an error message and returns `None` if the word isn't a decimal number,
/// so that our users get a more informative message than the generic one.
pub fn parse_amount(word: &str) -> Option<Decimal> {
    match Decimal::from_str(word) {
        Ok(amount) => Some(amount),
        Err(_) => {
            eprintln!(
                "[ERROR] Only decimal numbers are allowed as the amount; you provided '{}'.",
                word
            );
            None
        }
    }
}
