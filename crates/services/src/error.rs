//! Shared error types for the services crate.

use thiserror::Error;

use drill_core::SettingsError;
use drill_core::model::CardId;
use storage::repository::StorageError;

/// Errors emitted by the practice coordinator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error("practice cycle already completed")]
    Completed,
    #[error("no cards available to practice")]
    EmptyPool,
    #[error("card {0} is not in the pool")]
    UnknownCard(CardId),
    #[error("card {0} is already mastered")]
    CardMastered(CardId),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by CSV import and export.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("no mastered cards to export")]
    NothingMastered,
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
