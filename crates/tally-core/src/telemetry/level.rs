// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Severity levels used to gate metrics.

use super::metrics::MetricsError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// A totally ordered sensitivity level.
///
/// A level is attached to a metric when it is created and is also used as the
/// configured threshold for a name (or for the root). A metric is enabled when
/// the threshold that applies to it is at least as broad as its own level.
///
/// `Off` is the most restrictive value and `All` the broadest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Level {
    /// Nothing is collected.
    Off,
    /// Metrics that are always worth collecting.
    #[default]
    Info,
    /// Diagnostic metrics.
    Debug,
    /// Fine grained metrics, usually expensive.
    Trace,
    /// Everything is collected.
    All,
}

impl Level {
    /// All levels, from the most restrictive to the broadest.
    pub const VALUES: [Level; 5] = [
        Level::Off,
        Level::Info,
        Level::Debug,
        Level::Trace,
        Level::All,
    ];

    /// Returns the canonical upper-case name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Off => "OFF",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
            Level::All => "ALL",
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = MetricsError;

    /// Parses a level name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Level::VALUES
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| MetricsError::InvalidArgument(format!("unknown level '{s}'")))
    }
}

impl TryFrom<String> for Level {
    type Error = MetricsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Off < Level::Info);
        assert!(Level::Info < Level::Debug);
        assert!(Level::Debug < Level::Trace);
        assert!(Level::Trace < Level::All);
        assert_eq!(Level::VALUES.iter().max(), Some(&Level::All));
    }

    #[test]
    fn test_level_parse_is_case_insensitive() {
        assert_eq!("debug".parse::<Level>().unwrap(), Level::Debug);
        assert_eq!(" TRACE ".parse::<Level>().unwrap(), Level::Trace);
        assert_eq!("Off".parse::<Level>().unwrap(), Level::Off);
        assert!(matches!(
            "verbose".parse::<Level>(),
            Err(MetricsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_level_display_round_trips() {
        for level in Level::VALUES {
            assert_eq!(level.to_string().parse::<Level>().unwrap(), level);
        }
    }

    #[test]
    fn test_default_level_is_info() {
        assert_eq!(Level::default(), Level::Info);
    }
}
