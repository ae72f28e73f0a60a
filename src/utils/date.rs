//! Calendar-checked UTC timestamps.
//!
//! Content timestamps are ISO 8601 strings: `"YYYY-MM-DD"`, optionally with
//! a `"THH:MM:SSZ"` time part. [`DateTimeUtc::parse`] validates the calendar
//! (month lengths, leap years) so an impossible date fails normalization
//! instead of silently mis-sorting the catalog. [`DateTimeUtc::to_rfc2822`]
//! renders the `pubDate` format RSS requires.

use anyhow::{Result, bail};

/// UTC datetime without timezone complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeUtc {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTimeUtc {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Parse from `"YYYY-MM-DD"` or `"YYYY-MM-DDTHH:MM:SSZ"`.
    ///
    /// Returns `None` for any other shape or an impossible calendar date.
    pub fn parse(s: &str) -> Option<Self> {
        let (date, time) = match s.split_once('T') {
            Some((date, time)) => (date, Some(time.strip_suffix('Z')?)),
            None => (s, None),
        };

        let mut date_parts = date.split('-');
        let year = parse_fixed(date_parts.next()?, 4)?;
        let month = parse_fixed(date_parts.next()?, 2)? as u8;
        let day = parse_fixed(date_parts.next()?, 2)? as u8;
        if date_parts.next().is_some() {
            return None;
        }

        let (hour, minute, second) = match time {
            Some(time) => {
                let mut time_parts = time.split(':');
                let hour = parse_fixed(time_parts.next()?, 2)? as u8;
                let minute = parse_fixed(time_parts.next()?, 2)? as u8;
                let second = parse_fixed(time_parts.next()?, 2)? as u8;
                if time_parts.next().is_some() {
                    return None;
                }
                (hour, minute, second)
            }
            None => (0, 0, 0),
        };

        let dt = Self::new(year, month, day, hour, minute, second);
        dt.validate().ok()?;
        Some(dt)
    }

    pub fn validate(&self) -> Result<()> {
        let Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        } = *self;

        if !(1..=12).contains(&month) {
            bail!("month is invalid: {month}");
        }
        if day == 0 || day > days_in_month(year, month) {
            bail!("day is invalid: {day}");
        }
        if hour > 23 {
            bail!("hour is invalid: {hour}");
        }
        if minute > 59 {
            bail!("minute is invalid: {minute}");
        }
        if second > 59 {
            bail!("second is invalid: {second}");
        }

        Ok(())
    }

    /// Render as RFC 2822 (`"Mon, 15 Jan 2024 00:00:00 GMT"`).
    pub fn to_rfc2822(self) -> String {
        const WEEKDAYS: [&str; 7] = ["Sat", "Sun", "Mon", "Tue", "Wed", "Thu", "Fri"];
        const MONTHS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];

        format!(
            "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
            WEEKDAYS[self.weekday_index()],
            self.day,
            MONTHS[(self.month - 1) as usize],
            self.year,
            self.hour,
            self.minute,
            self.second
        )
    }

    /// Zeller's congruence; index 0 is Saturday.
    #[inline]
    fn weekday_index(&self) -> usize {
        let (y, m) = if self.month < 3 {
            (self.year as i32 - 1, self.month as i32 + 12)
        } else {
            (self.year as i32, self.month as i32)
        };
        let d = self.day as i32;
        ((d + (13 * (m + 1)) / 5 + y + y / 4 - y / 100 + y / 400) % 7) as usize
    }
}

/// Parse an ASCII number of exactly `digits` digits.
#[inline]
fn parse_fixed(s: &str, digits: usize) -> Option<u16> {
    if s.len() != digits || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[inline]
fn is_leap_year(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

#[inline]
fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}
