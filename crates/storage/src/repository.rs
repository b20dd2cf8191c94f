use async_trait::async_trait;
use drill_core::model::{Card, GoalState, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Whole-pool persistence for a user's cards.
///
/// Saves overwrite the stored collection; there is no per-card upsert, so
/// concurrent writers resolve as last-writer-wins.
#[async_trait]
pub trait CardPoolRepository: Send + Sync {
    /// Load the user's pool in stored order. A user without a pool yields an
    /// empty vector.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the pool cannot be read or decoded.
    async fn load_card_pool(&self, user: &UserId) -> Result<Vec<Card>, StorageError>;

    /// Replace the user's pool with `cards`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the pool cannot be written.
    async fn save_card_pool(&self, user: &UserId, cards: &[Card]) -> Result<(), StorageError>;
}

/// Persistence for a user's daily goal state.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Load the stored goal state, `None` for a user that never practiced.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be read or decoded.
    async fn load_goal_state(&self, user: &UserId) -> Result<Option<GoalState>, StorageError>;

    /// Overwrite the stored goal state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be written.
    async fn save_goal_state(&self, user: &UserId, state: &GoalState) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Writes can be made to fail on demand to exercise error paths.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    pools: Arc<Mutex<HashMap<UserId, Vec<Card>>>>,
    goals: Arc<Mutex<HashMap<UserId, GoalState>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save return `StorageError::Connection` until
    /// turned off again. Loads keep working.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("writes disabled".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CardPoolRepository for InMemoryRepository {
    async fn load_card_pool(&self, user: &UserId) -> Result<Vec<Card>, StorageError> {
        let guard = self
            .pools
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(user).cloned().unwrap_or_default())
    }

    async fn save_card_pool(&self, user: &UserId, cards: &[Card]) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut guard = self
            .pools
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(user.clone(), cards.to_vec());
        debug!(user_id = %user, cards = cards.len(), "saved card pool in memory");
        Ok(())
    }
}

#[async_trait]
impl GoalRepository for InMemoryRepository {
    async fn load_goal_state(&self, user: &UserId) -> Result<Option<GoalState>, StorageError> {
        let guard = self
            .goals
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(user).copied())
    }

    async fn save_goal_state(&self, user: &UserId, state: &GoalState) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut guard = self
            .goals
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(user.clone(), *state);
        Ok(())
    }
}

/// Aggregates pool and goal repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub cards: Arc<dyn CardPoolRepository>,
    pub goals: Arc<dyn GoalRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    /// Wrap an existing in-memory repository, keeping a handle for tests.
    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let cards: Arc<dyn CardPoolRepository> = Arc::new(repo.clone());
        let goals: Arc<dyn GoalRepository> = Arc::new(repo);
        Self { cards, goals }
    }
}
