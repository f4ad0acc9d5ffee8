/*
 * Copyright (C) 2024 The Android Open Source Project
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Scheduling of the periodic update check.
//!
//! Servers hint the next check with an HTTP date. The hint is clamped into a window so that
//! checks neither run more often than every [`DEFAULT_MIN_HOURS`] nor stall for longer than
//! [`DEFAULT_MAX_HOURS`].

use anyhow::{ensure, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MIN_HOURS: u32 = 6;
pub const DEFAULT_MAX_HOURS: u32 = 72;

const SECONDS_PER_HOUR: i64 = 60 * 60;

// Date and time part of an RFC 1123 date; the day of week and the seconds are optional.
const DATE_TIME_FORMATS: &[&str] =
    &["%a, %d %b %Y %H:%M:%S", "%a, %d %b %Y %H:%M", "%d %b %Y %H:%M:%S", "%d %b %Y %H:%M"];

/// The expiry hint is not an RFC 1123 date.
#[derive(Debug, Error)]
#[error("Malformed expiry date {input:?}: {reason}")]
pub struct ExpiryFormatError {
    input: String,
    reason: &'static str,
    #[source]
    source: Option<chrono::ParseError>,
}

/// Bounds of the next update check, in hours from now.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ExpiryWindow {
    #[serde(default = "default_min_hours")]
    min_hours: u32,
    #[serde(default = "default_max_hours")]
    max_hours: u32,
}

fn default_min_hours() -> u32 {
    DEFAULT_MIN_HOURS
}

fn default_max_hours() -> u32 {
    DEFAULT_MAX_HOURS
}

impl Default for ExpiryWindow {
    fn default() -> Self {
        Self { min_hours: DEFAULT_MIN_HOURS, max_hours: DEFAULT_MAX_HOURS }
    }
}

impl ExpiryWindow {
    pub fn new(min_hours: u32, max_hours: u32) -> Result<Self> {
        let window = Self { min_hours, max_hours };
        window.validate()?;
        Ok(window)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(
            self.min_hours <= self.max_hours,
            "Expiry window is empty: min_hours {} > max_hours {}",
            self.min_hours,
            self.max_hours
        );
        Ok(())
    }

    pub fn min_hours(&self) -> u32 {
        self.min_hours
    }

    pub fn max_hours(&self) -> u32 {
        self.max_hours
    }

    /// Returns the epoch second of the next update check.
    ///
    /// Without a hint the check is due at the lower bound. A hint is parsed as an RFC 1123
    /// date and clamped into `[now + min_hours, now + max_hours]`. Malformed hints are
    /// returned as errors, never replaced by a default.
    pub fn coerce(
        &self,
        hint: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<i64, ExpiryFormatError> {
        let now = now.timestamp();
        let lower = now + i64::from(self.min_hours) * SECONDS_PER_HOUR;
        let upper = now + i64::from(self.max_hours) * SECONDS_PER_HOUR;
        let Some(hint) = hint else {
            return Ok(lower);
        };
        let expiry = parse_rfc1123(hint)?;
        let coerced = expiry.max(lower).min(upper);
        if coerced != expiry {
            debug!("Update check expiry {} clamped to {}", expiry, coerced);
        }
        Ok(coerced)
    }
}

/// Parses `[EEE, ]d MMM yyyy HH:mm[:ss] (GMT|+HHMM)` into epoch seconds.
///
/// Two-digit years, zone names other than `GMT` and trailing comments are rejected.
fn parse_rfc1123(input: &str) -> Result<i64, ExpiryFormatError> {
    let error = |reason: &'static str, source: Option<chrono::ParseError>| ExpiryFormatError {
        input: input.to_owned(),
        reason,
        source,
    };
    let (date_time, zone) = input.rsplit_once(' ').ok_or_else(|| error("missing zone", None))?;
    let offset = parse_offset(zone).ok_or_else(|| error("zone must be GMT or +HHMM", None))?;
    let year = date_time.split(' ').rev().nth(1).unwrap_or_default();
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(error("year must have four digits", None));
    }
    let mut last_error = None;
    for format in DATE_TIME_FORMATS {
        match NaiveDateTime::parse_from_str(date_time, format) {
            Ok(local) => return Ok(local.and_utc().timestamp() - offset),
            Err(e) => last_error = Some(e),
        }
    }
    Err(error("not an RFC 1123 date", last_error))
}

/// Returns the offset of `GMT` or `+HHMM` in seconds east of UTC.
fn parse_offset(zone: &str) -> Option<i64> {
    if zone == "GMT" {
        return Some(0);
    }
    let (sign, digits) = match zone.strip_prefix('+') {
        Some(digits) => (1, digits),
        None => (-1, zone.strip_prefix('-')?),
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i64 = digits[..2].parse().ok()?;
    let minutes: i64 = digits[2..].parse().ok()?;
    if hours > 18 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * SECONDS_PER_HOUR + minutes * 60))
}

/// Returns true if `expiry` (epoch seconds) is strictly before the current time.
pub fn is_last_update_check_expired(expiry: i64) -> bool {
    is_last_update_check_expired_at(expiry, Utc::now())
}

/// Returns true if `expiry` (epoch seconds) is strictly before `now`.
pub fn is_last_update_check_expired_at(expiry: i64, now: DateTime<Utc>) -> bool {
    (expiry, 0) < (now.timestamp(), now.timestamp_subsec_nanos())
}

/// Coerces the server's expiry hint into the default window, relative to the current time.
pub fn coerce_update_check_expiry(hint: Option<&str>) -> Result<i64, ExpiryFormatError> {
    ExpiryWindow::default().coerce(hint, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const HOUR: i64 = SECONDS_PER_HOUR;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn http_date(time: DateTime<Utc>) -> String {
        time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
    }

    #[test]
    fn no_hint_means_lower_bound() {
        let expiry = ExpiryWindow::default().coerce(None, now()).unwrap();
        assert_eq!(expiry, now().timestamp() + 6 * HOUR);
    }

    #[test]
    fn early_hint_is_raised_to_lower_bound() {
        let hint = http_date(now() + Duration::hours(1));
        let expiry = ExpiryWindow::default().coerce(Some(&hint), now()).unwrap();
        assert_eq!(expiry, now().timestamp() + 6 * HOUR);
    }

    #[test]
    fn past_hint_is_raised_to_lower_bound() {
        let expiry = ExpiryWindow::default()
            .coerce(Some("Tue, 15 Nov 1994 08:12:31 GMT"), now())
            .unwrap();
        assert_eq!(expiry, now().timestamp() + 6 * HOUR);
    }

    #[test]
    fn late_hint_is_lowered_to_upper_bound() {
        let hint = http_date(now() + Duration::hours(100));
        let expiry = ExpiryWindow::default().coerce(Some(&hint), now()).unwrap();
        assert_eq!(expiry, now().timestamp() + 72 * HOUR);
    }

    #[test]
    fn hint_inside_window_is_kept() {
        let hint = http_date(now() + Duration::hours(24) + Duration::seconds(17));
        let expiry = ExpiryWindow::default().coerce(Some(&hint), now()).unwrap();
        assert_eq!(expiry, now().timestamp() + 24 * HOUR + 17);
    }

    #[test]
    fn numeric_offsets_are_honoured() {
        // 14:00 at +0200 is 12:00 UTC, i.e. now; raised to the lower bound.
        let expiry = ExpiryWindow::default()
            .coerce(Some("Wed, 01 May 2024 14:00:00 +0200"), now())
            .unwrap();
        assert_eq!(expiry, now().timestamp() + 6 * HOUR);

        // 12:00 at -1000 is 22:00 UTC.
        let expiry = ExpiryWindow::default()
            .coerce(Some("Wed, 01 May 2024 12:00:00 -1000"), now())
            .unwrap();
        assert_eq!(expiry, now().timestamp() + 10 * HOUR);
    }

    #[test]
    fn malformed_hint_is_an_error() {
        let err = ExpiryWindow::default().coerce(Some("not a date"), now()).unwrap_err();
        assert!(err.to_string().contains("not a date"));

        for hint in [
            "Wed, 01 May 24 12:00:00 GMT",
            "Wed, 01 May 2024 12:00:00 EST",
            "Wed, 01 May 2024 12:00:00 Z",
            "01 May 2024 12:00:00 UT",
            "Wed, 01 May 2024 12:00:00 GMT (comment)",
            "Wed, 01 May 2024 12:00:00 +2400",
            "Wed, 01 May 2024 12:00:00 +02",
            "Wed, 01 May 2024 12:00:00",
            "Thu, 01 May 2024 12:00:00 GMT",
            "Wed, 01 Foo 2024 12:00:00 GMT",
        ] {
            assert!(ExpiryWindow::default().coerce(Some(hint), now()).is_err(), "{}", hint);
        }
    }

    #[test]
    fn optional_parts_of_the_date_may_be_omitted() {
        let ten_hours = now().timestamp() + 10 * HOUR;
        for hint in [
            "Wed, 01 May 2024 22:00:00 GMT",
            "Wed, 01 May 2024 22:00 GMT",
            "01 May 2024 22:00:00 GMT",
            "Wed, 1 May 2024 22:00:00 GMT",
            "Wed, 01 May 2024 23:30:00 +0130",
        ] {
            let expiry = ExpiryWindow::default().coerce(Some(hint), now()).unwrap();
            assert_eq!(expiry, ten_hours, "{}", hint);
        }
    }

    #[test]
    fn custom_window_bounds_apply() {
        let window = ExpiryWindow::new(1, 2).unwrap();
        let hint = http_date(now() + Duration::hours(5));
        assert_eq!(window.coerce(Some(&hint), now()).unwrap(), now().timestamp() + 2 * HOUR);
        assert_eq!(window.coerce(None, now()).unwrap(), now().timestamp() + HOUR);
    }

    #[test]
    fn empty_window_is_rejected() {
        assert!(ExpiryWindow::new(10, 9).is_err());
        assert!(ExpiryWindow::new(9, 9).is_ok());
    }

    #[test]
    fn expiry_is_strictly_before_now() {
        let now = now();
        assert!(is_last_update_check_expired_at(now.timestamp() - 1, now));
        assert!(!is_last_update_check_expired_at(now.timestamp(), now));
        assert!(!is_last_update_check_expired_at(now.timestamp() + 1, now));
    }

    #[test]
    fn sub_second_clock_counts() {
        let now = now() + Duration::milliseconds(500);
        assert!(is_last_update_check_expired_at(now.timestamp(), now));
    }
}
