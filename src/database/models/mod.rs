pub mod folder;
pub mod user;

pub use folder::Folder;
pub use user::{NewUser, User};
