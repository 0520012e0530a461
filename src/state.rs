/*
 * Responsibility
 * - shared context attached to the Router (AppState)
 * - cheap to Clone (PgPool and Arc inside)
 */
use std::sync::Arc;

use sqlx::PgPool;

use crate::services::origin_gate::AllowList;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub allow_list: Arc<AllowList>,
}

impl AppState {
    pub fn new(db: PgPool, allow_list: Arc<AllowList>) -> Self {
        Self { db, allow_list }
    }
}
