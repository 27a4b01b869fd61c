use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::folder::Folder;

#[async_trait]
pub trait FolderStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Folder>, DatabaseError>;

    async fn find(&self, id: i64) -> Result<Option<Folder>, DatabaseError>;

    /// A taken name is `DatabaseError::Conflict`
    async fn create(
        &self,
        owner_id: i64,
        name: &str,
        pass_hash: Option<String>,
    ) -> Result<Folder, DatabaseError>;

    /// Delete only when `owner_id` owns the folder. Returns whether a row was removed.
    async fn delete_owned(&self, id: i64, owner_id: i64) -> Result<bool, DatabaseError>;
}

const FOLDER_COLUMNS: &str = "id, owner_id, name, pass_hash, is_locked";

pub struct PgFolderStore {
    pool: PgPool,
}

impl PgFolderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderStore for PgFolderStore {
    async fn list(&self) -> Result<Vec<Folder>, DatabaseError> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {} FROM folders ORDER BY id",
            FOLDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(folders)
    }

    async fn find(&self, id: i64) -> Result<Option<Folder>, DatabaseError> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {} FROM folders WHERE id = $1",
            FOLDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(folder)
    }

    async fn create(
        &self,
        owner_id: i64,
        name: &str,
        pass_hash: Option<String>,
    ) -> Result<Folder, DatabaseError> {
        let is_locked = pass_hash.is_some();
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "INSERT INTO folders (owner_id, name, pass_hash, is_locked) VALUES ($1, $2, $3, $4) RETURNING {}",
            FOLDER_COLUMNS
        ))
        .bind(owner_id)
        .bind(name)
        .bind(pass_hash)
        .bind(is_locked)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_insert(e, format!("folder '{}'", name)))?;

        Ok(folder)
    }

    async fn delete_owned(&self, id: i64, owner_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
