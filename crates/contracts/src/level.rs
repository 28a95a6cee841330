//! LogLevel - bit mask of enabled event categories
//!
//! Every category owns one bit of a `u8`, so any byte is a well-formed mask.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub, SubAssign};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use thiserror::Error;

/// Set of enabled event categories.
///
/// # Examples
/// ```
/// use contracts::LogLevel;
///
/// let level = LogLevel::ERROR | LogLevel::WARNING;
/// assert!(level.contains(LogLevel::ERROR));
/// assert!(!level.contains(LogLevel::INFO));
/// assert_eq!(level.to_string(), "error|warning");
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LogLevel(u8);

impl LogLevel {
    pub const NONE: Self = Self(0);
    pub const ERROR: Self = Self(1);
    pub const WARNING: Self = Self(1 << 1);
    pub const INFO: Self = Self(1 << 2);
    pub const VERBOSE: Self = Self(1 << 3);
    pub const DEBUG: Self = Self(1 << 4);
    pub const EVENT: Self = Self(1 << 5);
    pub const METRIC: Self = Self(1 << 6);
    pub const EXCEPTION: Self = Self(1 << 7);
    pub const ALL: Self = Self(u8::MAX);

    /// Named single-bit flags, lowest bit first
    const FLAGS: [(Self, &'static str); 8] = [
        (Self::ERROR, "error"),
        (Self::WARNING, "warning"),
        (Self::INFO, "info"),
        (Self::VERBOSE, "verbose"),
        (Self::DEBUG, "debug"),
        (Self::EVENT, "event"),
        (Self::METRIC, "metric"),
        (Self::EXCEPTION, "exception"),
    ];

    /// Level a dispatcher starts with: everything except debug output.
    pub const fn default_global() -> Self {
        Self::ALL.subtract(Self::DEBUG)
    }

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Bitwise OR of both masks.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Clears every bit of `other` from `self`.
    #[inline]
    pub const fn subtract(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// True when `self` and `bit` share at least one bit.
    ///
    /// Dispatch passes a single-bit mask here, so this reads as
    /// "is this category enabled".
    #[inline]
    pub const fn contains(self, bit: Self) -> bool {
        self.0 & bit.0 != 0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_all(self) -> bool {
        self.0 == Self::ALL.0
    }

    /// Iterate over the single-bit flags set in this mask, lowest bit first.
    pub fn iter(self) -> impl Iterator<Item = Self> {
        Self::FLAGS
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(flag, _)| flag)
    }

    /// Names of the flags set in this mask.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::FLAGS
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }

    fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "none" => Some(Self::NONE),
            "all" => Some(Self::ALL),
            "warn" => Some(Self::WARNING),
            _ => Self::FLAGS
                .iter()
                .find(|(_, flag_name)| *flag_name == lower)
                .map(|(flag, _)| *flag),
        }
    }
}

impl BitOr for LogLevel {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for LogLevel {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl BitAnd for LogLevel {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for LogLevel {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for LogLevel {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl Sub for LogLevel {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.subtract(rhs)
    }
}

impl SubAssign for LogLevel {
    fn sub_assign(&mut self, rhs: Self) {
        *self = self.subtract(rhs);
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("none");
        }
        if self.is_all() {
            return f.write_str("all");
        }
        let names: Vec<&str> = self.names().collect();
        f.write_str(&names.join("|"))
    }
}

impl fmt::Debug for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogLevel({self})")
    }
}

/// Error returned when a level expression contains an unknown name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level '{token}' (expected none, all, error, warning, info, verbose, debug, event, metric or exception)")]
pub struct ParseLevelError {
    pub token: String,
}

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    /// Parses `"error|warning"`, `"info, event"`, `"all"`, `"none"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut level = Self::NONE;
        let mut seen_token = false;

        for token in s
            .split(|c: char| c == '|' || c == ',' || c == '+' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            seen_token = true;
            let flag = Self::from_name(token).ok_or_else(|| ParseLevelError {
                token: token.to_string(),
            })?;
            level |= flag;
        }

        if !seen_token {
            return Err(ParseLevelError {
                token: s.to_string(),
            });
        }
        Ok(level)
    }
}

impl Serialize for LogLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Category of a single dispatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Error,
    Warn,
    Info,
    Verbose,
    Debug,
    Event,
    Metric,
    Exception,
}

impl EventKind {
    /// The mask bit that gates this kind of call.
    pub const fn level(self) -> LogLevel {
        match self {
            Self::Error => LogLevel::ERROR,
            Self::Warn => LogLevel::WARNING,
            Self::Info => LogLevel::INFO,
            Self::Verbose => LogLevel::VERBOSE,
            Self::Debug => LogLevel::DEBUG,
            Self::Event => LogLevel::EVENT,
            Self::Metric => LogLevel::METRIC,
            Self::Exception => LogLevel::EXCEPTION,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Verbose => "verbose",
            Self::Debug => "debug",
            Self::Event => "event",
            Self::Metric => "metric",
            Self::Exception => "exception",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, mutable level slot.
///
/// Sinks are shared by reference between dispatchers, so the level lives
/// behind an atomic and is changed through `&self`.
#[derive(Debug, Default)]
pub struct LevelCell(AtomicU8);

impl LevelCell {
    pub const fn new(level: LogLevel) -> Self {
        Self(AtomicU8::new(level.bits()))
    }

    #[inline]
    pub fn get(&self) -> LogLevel {
        LogLevel::from_bits(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, level: LogLevel) {
        self.0.store(level.bits(), Ordering::Release);
    }
}
