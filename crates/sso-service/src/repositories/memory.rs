//! In-memory storage backend.
//!
//! Everything lives behind one lock, so the email uniqueness check and the
//! insert are atomic. Counters let tests assert that a rejected request
//! never reached storage.

use super::{Storage, StorageError};
use crate::models::{App, Role, User};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct State {
    /// Ordered by id.
    users: Vec<User>,
    apps: HashMap<i32, App>,
    last_id: i64,
}

/// Storage kept in process memory. Ids start at 1.
#[derive(Default)]
pub struct InMemoryStorage {
    state: Mutex<State>,
    call_count: AtomicUsize,
    mutation_count: AtomicUsize,
    failing: bool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage where every call fails with `StorageError::Database`.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Seed an application.
    #[must_use]
    pub fn with_app(mut self, app: App) -> Self {
        self.state.get_mut().apps.insert(app.id, app);
        self
    }

    /// Total calls received, across all operations.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Calls received by `save_user` and `update_role`.
    pub fn mutation_count(&self) -> usize {
        self.mutation_count.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<(), StorageError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(StorageError::Database(
                "in-memory storage configured to fail".to_string(),
            ));
        }
        Ok(())
    }

    fn record_mutation(&self) -> Result<(), StorageError> {
        self.mutation_count.fetch_add(1, Ordering::SeqCst);
        self.record_call()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save_user(
        &self,
        email: &str,
        pass_hash: &[u8],
        role: Role,
    ) -> Result<i64, StorageError> {
        self.record_mutation()?;
        let mut state = self.state.lock().await;

        if state.users.iter().any(|u| u.email == email) {
            return Err(StorageError::AlreadyExists);
        }

        state.last_id += 1;
        let id = state.last_id;
        state.users.push(User {
            id,
            email: email.to_string(),
            pass_hash: pass_hash.to_vec(),
            role,
        });
        Ok(id)
    }

    async fn user(&self, email: &str) -> Result<User, StorageError> {
        self.record_call()?;
        let state = self.state.lock().await;
        state
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn user_by_id(&self, id: i64) -> Result<User, StorageError> {
        self.record_call()?;
        let state = self.state.lock().await;
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn get_user_role(&self, id: i64) -> Result<Role, StorageError> {
        self.record_call()?;
        let state = self.state.lock().await;
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.role)
            .ok_or(StorageError::NotFound)
    }

    async fn update_role(&self, id: i64, role: Role) -> Result<(), StorageError> {
        self.record_mutation()?;
        let mut state = self.state.lock().await;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StorageError::NotFound)?;
        user.role = role;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        self.record_call()?;
        Ok(self.state.lock().await.users.clone())
    }

    async fn app(&self, app_id: i32) -> Result<App, StorageError> {
        self.record_call()?;
        let state = self.state.lock().await;
        state
            .apps
            .get(&app_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}
