use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current layout version written by [`SchedulingMetadata::fresh`].
pub const METADATA_VERSION: u64 = 1;

//
// ─── SCHEDULING METADATA ───────────────────────────────────────────────────────
//

/// Long-horizon scheduling state carried alongside each card.
///
/// The practice loop never reads these fields; they are kept so a future
/// interval scheduler can pick up where older clients left off. The value is
/// stored as an opaque JSON object, which means foreign keys written by other
/// tools survive a load/save cycle untouched.
///
/// # Examples
///
/// ```
/// # use drill_core::model::SchedulingMetadata;
/// let meta = SchedulingMetadata::fresh();
/// assert_eq!(meta.version(), Some(1));
/// assert_eq!(meta.stability(), Some(0.0));
/// assert!(meta.due().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchedulingMetadata(Map<String, Value>);

impl SchedulingMetadata {
    /// Freshly-initialized metadata for a card that was never scheduled.
    #[must_use]
    pub fn fresh() -> Self {
        let mut map = Map::new();
        map.insert("version".into(), Value::from(METADATA_VERSION));
        map.insert("stability".into(), Value::from(0.0));
        map.insert("difficulty".into(), Value::from(0.0));
        map.insert("reps".into(), Value::from(0_u32));
        map.insert("lapses".into(), Value::from(0_u32));
        map.insert("state".into(), Value::from("new"));
        map.insert("due".into(), Value::Null);
        Self(map)
    }

    /// Wrap a JSON value read from an external store.
    ///
    /// Anything that is not a JSON object cannot be carried forward and is
    /// replaced with fresh metadata.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::fresh(),
        }
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    #[must_use]
    pub fn version(&self) -> Option<u64> {
        self.0.get("version").and_then(Value::as_u64)
    }

    #[must_use]
    pub fn stability(&self) -> Option<f64> {
        self.0.get("stability").and_then(Value::as_f64)
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<f64> {
        self.0.get("difficulty").and_then(Value::as_f64)
    }

    /// Due date, when present and parseable as RFC 3339.
    #[must_use]
    pub fn due(&self) -> Option<DateTime<Utc>> {
        self.0
            .get("due")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl Default for SchedulingMetadata {
    fn default() -> Self {
        Self::fresh()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
