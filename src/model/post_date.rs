use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};
use snafu::{ensure, OptionExt as _};

use super::{MalformedPostDateSnafu, ValidationError};

const FORMAT: &str = "%Y-%m-%d";

/// The day a video was posted, always written as `YYYY-MM-DD`.
///
/// Ordering is chronological, which for the fixed-width format is the same as
/// comparing the textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostDate(NaiveDate);

impl PostDate {
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

/// `chrono` alone accepts `2025-1-1`, so the shape is checked separately.
fn is_fixed_width(input: &str) -> bool {
    let bytes = input.as_bytes();

    bytes.len() == 10
        && bytes.iter().enumerate().all(|(index, byte)| match index {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

impl std::str::FromStr for PostDate {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        ensure!(is_fixed_width(input), MalformedPostDateSnafu { value: input });

        let date = NaiveDate::parse_from_str(input, FORMAT)
            .ok()
            .context(MalformedPostDateSnafu { value: input })?;

        // Year zero parses but is not a date anyone posted on.
        ensure!(date.year() >= 1, MalformedPostDateSnafu { value: input });

        Ok(PostDate(date))
    }
}

impl std::fmt::Display for PostDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl Serialize for PostDate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PostDate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
