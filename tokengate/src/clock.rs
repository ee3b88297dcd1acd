//! Clocks used to judge whether a token is currently inside its validity window
//!
//! Verification code asks a [`Clock`] for the current instant instead of
//! reading the system time directly, so tests can pin the instant with a
//! [`TestClock`].

use std::{fmt, time::SystemTime};

use serde::{de, Deserialize, Deserializer, Serialize};

/// Unix time in whole seconds
///
/// This is the `NumericDate` representation used by the `exp`, `nbf`, and
/// `iat` claims. Deserialization also accepts fractional seconds, which are
/// truncated toward the earlier whole second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct UnixTime(pub u64);

impl UnixTime {
    /// The instant `secs` seconds after this one
    #[inline]
    #[must_use]
    pub const fn after(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// The instant `secs` seconds before this one
    #[inline]
    #[must_use]
    pub const fn before(self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }
}

impl<'de> Deserialize<'de> for UnixTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NumericDateVisitor;

        impl<'de> de::Visitor<'de> for NumericDateVisitor {
            type Value = UnixTime;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative number of seconds since the Unix epoch")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(UnixTime(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(UnixTime)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                if v.is_finite() && v >= 0.0 {
                    // Saturates above u64::MAX
                    Ok(UnixTime(v.floor() as u64))
                } else {
                    Err(E::invalid_value(de::Unexpected::Float(v), &self))
                }
            }
        }

        deserializer.deserialize_any(NumericDateVisitor)
    }
}

impl From<SystemTime> for UnixTime {
    /// Instants before the epoch collapse onto the epoch itself
    #[inline]
    fn from(t: SystemTime) -> Self {
        let secs = t
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        UnixTime(secs)
    }
}

/// Something that can tell the current time
pub trait Clock {
    /// The current instant according to this clock
    fn now(&self) -> UnixTime;
}

impl<T> Clock for &'_ T
where
    T: Clock + ?Sized,
{
    #[inline]
    fn now(&self) -> UnixTime {
        T::now(self)
    }
}

/// The system wall clock
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct System;

impl Clock for System {
    #[inline]
    fn now(&self) -> UnixTime {
        UnixTime::from(SystemTime::now())
    }
}

/// A clock frozen at an instant chosen by the test
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestClock(UnixTime);

impl Clock for TestClock {
    #[inline]
    fn now(&self) -> UnixTime {
        self.0
    }
}

impl TestClock {
    /// A clock stopped at `time`
    #[inline]
    pub const fn new(time: UnixTime) -> Self {
        Self(time)
    }

    /// Moves the clock to `time`
    pub fn set(&mut self, time: UnixTime) {
        self.0 = time;
    }

    /// Moves the clock forward by `secs` seconds
    pub fn advance(&mut self, secs: u64) {
        self.0 = self.0.after(secs);
    }
}
