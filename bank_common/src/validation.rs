use rust_decimal::Decimal;

/// **Basic input validation for an account ID or a holder's name**
///
/// Checks for:
/// - An empty string.
///
/// Returns a reason in case of an invalid name.
pub fn is_valid_name(name: &str) -> Option<&'static str> {
    if name.trim().is_empty() {
        Some("It cannot be empty.")
    } else {
        None
    }
}

/// **Basic input validation for an amount of money**
///
/// Deposits, withdrawals and transfers only move strictly positive amounts.
pub fn is_valid_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO
}
