mod coordinator;
mod seed;
mod session;

// Public API of the practice subsystem.
pub use crate::error::PracticeError;
pub use coordinator::{AnswerReport, PracticeCoordinator, SubmitOutcome};
pub use seed::default_seed_pool;
pub use session::{CycleStatus, PracticeSession};
