//! In-memory [`UserRepository`] used by tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Result, ServerError};
use crate::user::{User, UserRepository};

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl MemoryUserRepository {
    fn users(&self) -> std::sync::MutexGuard<'_, Vec<User>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Mirrors the unique indexes of the `users` table.
fn check_unique(users: &[User], user: &User) -> Result<()> {
    for other in users.iter().filter(|u| u.id != user.id) {
        if other.email == user.email {
            return Err(ServerError::Conflict("users_email_key is already in use".into()));
        }
        if other.account == user.account {
            return Err(ServerError::Conflict(
                "users_account_key is already in use".into(),
            ));
        }
        if user.phone.is_some() && other.phone == user.phone {
            return Err(ServerError::Conflict("users_phone_key is already in use".into()));
        }
    }
    Ok(())
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        let mut users = self.users();
        if users.iter().any(|u| u.id == user.id) {
            return Err(ServerError::Conflict("users_pkey is already in use".into()));
        }
        check_unique(&users, user)?;
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        Ok(self
            .users()
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn find_all_active(&self) -> Result<Vec<User>> {
        Ok(self.users().iter().filter(|u| u.status).cloned().collect())
    }

    async fn exists(&self, email: &str, account: &str) -> Result<bool> {
        Ok(self
            .users()
            .iter()
            .any(|u| u.email == email || u.account == account))
    }

    async fn save(&self, user: &User) -> Result<()> {
        let mut users = self.users();
        check_unique(&users, user)?;
        let stored = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(ServerError::NotFound("user not found"))?;
        *stored = user.clone();
        Ok(())
    }

    async fn deactivate(
        &self,
        ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let mut modified = 0;
        for user in self
            .users()
            .iter_mut()
            .filter(|u| u.status && ids.contains(&u.id))
        {
            user.status = false;
            user.updated_at = now;
            modified += 1;
        }
        Ok(modified)
    }
}
