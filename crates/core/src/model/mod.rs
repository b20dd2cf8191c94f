mod card;
mod goal;
mod ids;
mod legacy;
mod metadata;

pub use card::{Card, CardError, CardPhase, MASTERY_THRESHOLD, PersistedCard};
pub use goal::GoalState;
pub use ids::{CardId, ParseIdError, UserId};
pub use legacy::{LegacyCard, LegacyId, migrate, migrate_cards};
pub use metadata::{METADATA_VERSION, SchedulingMetadata};
