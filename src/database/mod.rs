pub mod folders;
pub mod manager;
pub mod models;
pub mod users;

pub use folders::{FolderStore, PgFolderStore};
pub use manager::{Database, DatabaseError};
pub use models::{Folder, NewUser, User};
pub use users::{PgUserStore, UserStore};
