use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

/// Caller-supplied metadata carried through publish and returned on pop
pub type Tags = BTreeMap<String, String>;

/// Wire form of an unset `run_at`.
pub const ZERO_TIMESTAMP: &str = "0001-01-01T00:00:00Z";

/// One unit of queued work.
///
/// Field names match the wire format shared by every encoding:
/// `id`, `body`, `delay`, `run_at`, `no_exp_backoff`, `attempts`, `tags`.
/// Absent or `null` fields decode to their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Assigned by the queue backend on publish, empty before that
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Opaque payload
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    /// Wait before first delivery, relative to publish time (nanoseconds on the wire)
    #[serde(default, with = "delay_nanos")]
    pub delay: Duration,
    /// Absolute eligibility instant; `None` means immediately eligible
    #[serde(default, with = "run_at_rfc3339")]
    pub run_at: Option<DateTime<FixedOffset>>,
    /// Skip exponential backoff between redeliveries
    #[serde(default, deserialize_with = "null_as_default")]
    pub no_exp_backoff: bool,
    /// Delivery attempts so far, maintained by the backend
    #[serde(default, deserialize_with = "null_as_default")]
    pub attempts: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Tags,
}

impl Task {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_run_at(mut self, run_at: DateTime<FixedOffset>) -> Self {
        self.run_at = Some(run_at);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// True once a backend has accepted the task.
    pub fn is_published(&self) -> bool {
        !self.id.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

mod delay_nanos {
    use super::*;

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Option::<i64>::deserialize(deserializer)? {
            None => Ok(Duration::ZERO),
            // Negative delays are already due.
            Some(nanos) => Ok(Duration::from_nanos(u64::try_from(nanos).unwrap_or(0))),
        }
    }
}

fn zero_instant() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1, 1, 1).and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// `0001-01-01T00:00:00Z` in any offset counts as unset.
pub fn is_zero_timestamp(value: &DateTime<FixedOffset>) -> bool {
    Some(value.naive_utc()) == zero_instant()
}

/// RFC 3339 with `Z` for a zero offset and the fraction trimmed of
/// trailing zeros, so `00.5Z` stays `00.5Z`.
pub fn format_rfc3339(value: &DateTime<FixedOffset>) -> String {
    let mut out = value.format("%Y-%m-%dT%H:%M:%S").to_string();

    let nanos = value.nanosecond() % 1_000_000_000;
    if nanos != 0 {
        let fraction = format!("{:09}", nanos);
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }

    if value.offset().local_minus_utc() == 0 {
        out.push('Z');
    } else {
        out.push_str(&value.format("%:z").to_string());
    }
    out
}

mod run_at_rfc3339 {
    use super::*;

    pub fn serialize<S: Serializer>(
        run_at: &Option<DateTime<FixedOffset>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match run_at {
            Some(value) => serializer.serialize_str(&format_rfc3339(value)),
            None => serializer.serialize_str(ZERO_TIMESTAMP),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        let parsed = DateTime::parse_from_rfc3339(&raw).map_err(serde::de::Error::custom)?;
        Ok((!is_zero_timestamp(&parsed)).then_some(parsed))
    }
}
