// handlers/protected/mod.rs - Handlers behind jwt_auth_middleware
//
// Every handler here can rely on an `AuthUser` for an activated account.

pub mod folders;
pub mod session;

pub use folders::{folder_create, folder_remove, folder_unlock, folders_list};
pub use session::whoami_get;
