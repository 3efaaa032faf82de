/// CLI Commands

pub const HELP: &str = "help";
pub const CREATE: &str = "create";
pub const ACCOUNT: &str = "account";
pub const ACCOUNTS: &str = "accounts";
pub const DEPOSIT: &str = "deposit";
pub const WITHDRAW: &str = "withdraw";
pub const TRANSFER: &str = "transfer";
pub const HISTORY: &str = "history";
pub const QUIT: &str = "quit";

/// Various CLI constants

pub const PROMPT: &str = "> ";
pub const SEPARATOR: &str = "--";
