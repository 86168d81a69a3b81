//! # User Repository

use sqlx::SqlitePool;

use super::{Record, RecordStore};
use crate::error::DbResult;
use gastro_core::User;

impl Record for User {
    const TABLE: &'static str = "users";
    const ENTITY: &'static str = "User";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    store: RecordStore<User>,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository {
            store: RecordStore::new(pool),
        }
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        self.store.list().await
    }

    pub async fn upsert(&self, user: &User) -> DbResult<()> {
        self.store.upsert(user).await
    }

    /// Looks a user up by PIN (the till login).
    pub async fn find_by_pin(&self, pin: &str) -> DbResult<Option<User>> {
        Ok(self.list().await?.into_iter().find(|u| u.pin == pin))
    }
}
