pub mod account;

pub use account::{validate_email, AccountError, AccountPolicy, AccountService, LoginOutcome, RefreshOutcome};
