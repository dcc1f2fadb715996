//! How far back a request reaches, written the way watch-list configs write it
//! (`"90d"`, `"4w"`, `"6mo"`, `"2y"`).

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timeframe::TimeFrameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Lookback {
    Days(u32),
    Weeks(u32),
    Months(u32),
    Years(u32),
}

impl Lookback {
    /// The start of the window that ends at `end`.
    ///
    /// Month and year arithmetic is calendar-aware and clamps to the last day
    /// of shorter months.
    pub fn start_from(&self, end: DateTime<Utc>) -> DateTime<Utc> {
        let earlier = match *self {
            Lookback::Days(n) => end.checked_sub_signed(Duration::days(i64::from(n))),
            Lookback::Weeks(n) => end.checked_sub_signed(Duration::weeks(i64::from(n))),
            Lookback::Months(n) => end.checked_sub_months(Months::new(n)),
            Lookback::Years(n) => n
                .checked_mul(12)
                .and_then(|m| end.checked_sub_months(Months::new(m))),
        };
        earlier.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookback::Days(n) => write!(f, "{n}d"),
            Lookback::Weeks(n) => write!(f, "{n}w"),
            Lookback::Months(n) => write!(f, "{n}mo"),
            Lookback::Years(n) => write!(f, "{n}y"),
        }
    }
}

impl FromStr for Lookback {
    type Err = TimeFrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);
        let n: u32 = digits.parse().map_err(|_| TimeFrameError::InvalidInput {
            message: format!("invalid lookback '{s}'"),
        })?;
        if n == 0 {
            return Err(TimeFrameError::InvalidInput {
                message: format!("lookback must be positive: '{s}'"),
            });
        }
        match unit.to_lowercase().as_str() {
            "d" | "day" | "days" => Ok(Lookback::Days(n)),
            "w" | "wk" | "week" | "weeks" => Ok(Lookback::Weeks(n)),
            "mo" | "month" | "months" => Ok(Lookback::Months(n)),
            "y" | "yr" | "year" | "years" => Ok(Lookback::Years(n)),
            _ => Err(TimeFrameError::InvalidInput {
                message: format!("unknown lookback unit in '{s}'"),
            }),
        }
    }
}

impl TryFrom<String> for Lookback {
    type Error = TimeFrameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Lookback> for String {
    fn from(l: Lookback) -> Self {
        l.to_string()
    }
}
