/*
 * Responsibility
 * - request/response DTOs for the /user route group
 * - shape checks (validate) before anything reaches the repo
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::user_repo::UserRow;

const IMAGE_URL_MAX_LEN: usize = 256;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub user_name: String,
    pub image_url: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.user_name.trim().is_empty() {
            return Err("user_name is required");
        }
        if let Some(url) = &self.image_url
            && url.len() > IMAGE_URL_MAX_LEN
        {
            return Err("image_url must be <= 256 chars");
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub user_name: Option<String>,
    // None: key absent, keep; Some(None): null, clear; Some(Some(v)): set
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(name) = &self.user_name
            && name.trim().is_empty()
        {
            return Err("user_name cannot be empty");
        }
        if let Some(Some(url)) = &self.image_url
            && url.len() > IMAGE_URL_MAX_LEN
        {
            return Err("image_url must be <= 256 chars");
        }
        Ok(())
    }
}

// serde maps both "missing" and `null` to None for Option<Option<T>>
// unless the outer layer is forced to Some when the key is present.
fn double_option<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(Some)
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub user_name: String,
    pub image_url: Option<String>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            user_name: row.user_name,
            image_url: row.image_url,
        }
    }
}
