use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub pass_hash: Option<String>,
    pub is_locked: bool,
}
