// handlers/public/auth/mod.rs - Account lifecycle endpoints
//
// No token is required here: these endpoints are how a client gets one.

pub mod activate;
pub mod login;
pub mod password;
pub mod refresh;
pub mod register;

pub use activate::{activate_get, activate_missing};
pub use login::login_post;
pub use password::{forgot_password_post, renew_password_missing, renew_password_post};
pub use refresh::newtoken_post;
pub use register::register_post;
