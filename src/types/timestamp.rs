// Copyright 2025 Fernando Borretti
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

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;

const MILLIS_PER_DAY: i64 = 24 * 3600 * 1000;

/// A point in time, in milliseconds since the Unix epoch. This is the
/// representation used in the review logs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn into_millis(self) -> i64 {
        self.0
    }

    /// The timestamp `days` days after this one. Saturates instead of
    /// overflowing.
    pub fn plus_days(self, days: u32) -> Self {
        Self(self.0.saturating_add(i64::from(days).saturating_mul(MILLIS_PER_DAY)))
    }

    /// The UTC calendar date of this timestamp.
    pub fn utc_date(self) -> Fallible<NaiveDate> {
        let ts = DateTime::<Utc>::from_timestamp_millis(self.0)
            .ok_or_else(|| ErrorReport::new(format!("timestamp out of range: {}", self.0)))?;
        Ok(ts.date_naive())
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match DateTime::<Utc>::from_timestamp_millis(self.0) {
            Some(ts) => write!(f, "{}", ts.to_rfc3339()),
            None => write!(f, "{}ms", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_days() {
        let ts = Timestamp::from_millis(1_000);
        assert_eq!(ts.plus_days(0), ts);
        assert_eq!(ts.plus_days(2).into_millis(), 1_000 + 2 * MILLIS_PER_DAY);
    }

    #[test]
    fn test_plus_days_saturates() {
        let ts = Timestamp::from_millis(i64::MAX - 10);
        assert_eq!(ts.plus_days(1).into_millis(), i64::MAX);
    }

    #[test]
    fn test_utc_date() -> Fallible<()> {
        // 2024-03-01T23:59:59.999Z
        let ts = Timestamp::from_millis(1_709_337_599_999);
        assert_eq!(ts.utc_date()?, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let next = Timestamp::from_millis(1_709_337_600_000);
        assert_eq!(next.utc_date()?, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        Ok(())
    }

    #[test]
    fn test_display() {
        let ts = Timestamp::from_millis(0);
        assert_eq!(ts.to_string(), "1970-01-01T00:00:00+00:00");
    }
}
