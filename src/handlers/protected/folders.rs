// handlers/protected/folders.rs - Folder listing, creation, unlock and removal

use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::{DatabaseError, Folder};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonOrForm};

#[derive(Debug, Deserialize)]
pub struct NewFolder {
    #[serde(rename = "folderName")]
    pub folder_name: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FolderPassword {
    #[serde(default)]
    pub password: String,
}

fn parse_folder_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("Invalid folder_id '{}'", raw)))
}

/// GET /user - Every folder, without password hashes
pub async fn folders_list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<Folder>> {
    let folders = state.folders.list().await?;
    tracing::info!(user_id = user.id, "Listed {} folders", folders.len());
    Ok(ApiResponse::success(folders))
}

/// POST /new_folder - Create a folder owned by the caller; a password locks it
pub async fn folder_create(
    State(state): State<AppState>,
    user: AuthUser,
    JsonOrForm(body): JsonOrForm<NewFolder>,
) -> ApiResult<Value> {
    let name = body.folder_name.trim();
    if name.is_empty() {
        return Err(ApiError::validation_error("folder name cannot be empty"));
    }

    let pass_hash = body
        .password
        .filter(|p| !p.is_empty())
        .map(|p| state.hasher.hash(&p));

    let folder = state
        .folders
        .create(user.id, name, pass_hash)
        .await
        .map_err(|e| match e {
            DatabaseError::Conflict(_) => ApiError::conflict("the folder already exists in the database"),
            other => other.into(),
        })?;

    tracing::info!(user_id = user.id, folder_id = folder.id, "Created folder {}", folder.name);
    Ok(ApiResponse::success(json!({ "id": folder.id })))
}

/// POST /user/:folder_id - Check a folder password. Unlocked folders always pass.
pub async fn folder_unlock(
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
    _user: AuthUser,
    JsonOrForm(body): JsonOrForm<FolderPassword>,
) -> ApiResult<Value> {
    let folder_id = parse_folder_id(&folder_id)?;
    let folder = state
        .folders
        .find(folder_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("folder {} not found", folder_id)))?;

    if let (true, Some(digest)) = (folder.is_locked, folder.pass_hash.as_deref()) {
        if !state.hasher.verify(&body.password, digest) {
            tracing::warn!(folder_id, "Wrong folder password");
            return Err(ApiError::unauthorized("the folder password is not correct"));
        }
    }

    Ok(ApiResponse::message("The password is correct"))
}

/// DELETE /user/:folder_id/remove_folder - Only the owner may remove a folder
pub async fn folder_remove(
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
    user: AuthUser,
) -> ApiResult<Value> {
    let folder_id = parse_folder_id(&folder_id)?;
    let folder = state
        .folders
        .find(folder_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("folder {} not found", folder_id)))?;

    if folder.owner_id != user.id {
        return Err(ApiError::forbidden("only the owner can remove this folder"));
    }

    if !state.folders.delete_owned(folder_id, user.id).await? {
        return Err(ApiError::not_found(format!("folder {} not found", folder_id)));
    }

    tracing::info!(user_id = user.id, folder_id, "Removed folder {}", folder.name);
    Ok(ApiResponse::message("The folder was removed"))
}
