use chrono::{FixedOffset, Offset, Utc};
use thiserror::Error;

/// Daily target used when none is stored or a requested one is invalid.
pub const DEFAULT_TARGET_GOAL: u32 = 20;

/// Similarity above which a wrong typed answer earns a free retry.
pub const DEFAULT_NEAR_MISS_THRESHOLD: f64 = 0.3;

/// Tunables for the practice engine.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineSettings {
    default_target_goal: u32,
    near_miss_threshold: f64,
    day_offset: FixedOffset,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("default target goal must be positive")]
    InvalidDefaultGoal,
    #[error("near-miss threshold must be within [0, 1], got {0}")]
    InvalidNearMissThreshold(f64),
    #[error("day offset must be whole seconds within a day, got {0}")]
    InvalidDayOffset(i32),
}

impl EngineSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_target_goal(mut self, goal: u32) -> Self {
        self.default_target_goal = goal;
        self
    }

    #[must_use]
    pub fn with_near_miss_threshold(mut self, threshold: f64) -> Self {
        self.near_miss_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_day_offset(mut self, offset: FixedOffset) -> Self {
        self.day_offset = offset;
        self
    }

    /// Use the offset `seconds` east of UTC to decide calendar days.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidDayOffset` if the offset is a day or more.
    pub fn with_day_offset_seconds(self, seconds: i32) -> Result<Self, SettingsError> {
        let offset =
            FixedOffset::east_opt(seconds).ok_or(SettingsError::InvalidDayOffset(seconds))?;
        Ok(self.with_day_offset(offset))
    }

    /// Check that the settings can drive a session.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the default goal is zero or the threshold is
    /// outside `[0, 1]`.
    pub fn validate(self) -> Result<Self, SettingsError> {
        if self.default_target_goal == 0 {
            return Err(SettingsError::InvalidDefaultGoal);
        }
        if !(0.0..=1.0).contains(&self.near_miss_threshold) {
            return Err(SettingsError::InvalidNearMissThreshold(
                self.near_miss_threshold,
            ));
        }
        Ok(self)
    }

    #[must_use]
    pub fn default_target_goal(&self) -> u32 {
        self.default_target_goal
    }

    #[must_use]
    pub fn near_miss_threshold(&self) -> f64 {
        self.near_miss_threshold
    }

    #[must_use]
    pub fn day_offset(&self) -> FixedOffset {
        self.day_offset
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_target_goal: DEFAULT_TARGET_GOAL,
            near_miss_threshold: DEFAULT_NEAR_MISS_THRESHOLD,
            day_offset: Utc.fix(),
        }
    }
}
