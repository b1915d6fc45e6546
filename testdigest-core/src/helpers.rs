// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

/// Converts a millisecond count as found in reports into a `Duration`.
///
/// Negative and non-finite values are treated as zero. The result is rounded to the nearest
/// nanosecond.
pub(crate) fn duration_from_millis_f64(millis: f64) -> Duration {
    if millis.is_finite() && millis > 0.0 {
        Duration::from_nanos((millis * 1_000_000.0).round() as u64)
    } else {
        Duration::ZERO
    }
}

/// Serializes a `Duration` as fractional milliseconds.
pub(crate) mod serde_millis {
    use super::duration_from_millis_f64;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(crate) fn serialize<S: Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        f64::deserialize(deserializer).map(duration_from_millis_f64)
    }
}

/// Like [`serde_millis`], for optional durations.
pub(crate) mod serde_millis_opt {
    use super::duration_from_millis_f64;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::ref_option)]
    pub(crate) fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(duration) => serializer.serialize_some(&(duration.as_secs_f64() * 1000.0)),
            None => serializer.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.map(duration_from_millis_f64))
    }
}
