/*
 * Responsibility
 * - URL layout of v1
 * - the single user-facing group lives under /user
 * - paths match with or without a trailing slash
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::users::{create_user, delete_user, get_user, list_users, update_user};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let collection = get(list_users).post(create_user);
    let item = get(get_user).put(update_user).delete(delete_user);

    Router::new()
        .route("/user", collection.clone())
        .route("/user/", collection)
        .route("/user/{user_id}", item.clone())
        .route("/user/{user_id}/", item)
}
