//! Serde helpers for durations written as seconds in configuration files
//!
//! Both integers (`30`) and fractional values (`0.25`) are accepted.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

fn to_seconds(duration: &Duration) -> f64 {
    duration.as_secs_f64()
}

fn from_seconds<E: serde::de::Error>(secs: f64) -> Result<Duration, E> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(E::custom(format!(
            "duration must be a non-negative number of seconds, got {}",
            secs
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// `Duration` <-> seconds
pub mod secs {
    use super::*;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_u64(duration.as_secs())
        } else {
            serializer.serialize_f64(to_seconds(duration))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        from_seconds(secs)
    }
}

/// `Option<Duration>` <-> optional seconds
pub mod opt_secs {
    use super::*;

    pub fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(d) => super::secs::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        match Option::<f64>::deserialize(deserializer)? {
            Some(secs) => from_seconds(secs).map(Some),
            None => Ok(None),
        }
    }
}
