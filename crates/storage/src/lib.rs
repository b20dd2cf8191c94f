#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    CardPoolRepository, GoalRepository, InMemoryRepository, Storage, StorageError,
};
