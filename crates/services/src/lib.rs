#![forbid(unsafe_code)]

pub mod error;
pub mod import_service;
pub mod practice;

pub use drill_core::{Clock, EngineSettings};

pub use error::{ImportError, PracticeError};
pub use import_service::{
    ImportReport, ImportedCards, export_csv, export_mastered_csv, import_csv,
};
pub use practice::{
    AnswerReport, CycleStatus, PracticeCoordinator, PracticeSession, SubmitOutcome,
    default_seed_pool,
};
