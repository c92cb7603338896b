//! Human-readable rendering of the remaining budget

use std::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};

/// How the remaining time is rendered. Never affects the countdown itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayFormat {
    #[default]
    #[serde(rename = "mm:ss")]
    MmSs,
    #[serde(rename = "seconds")]
    Seconds,
}

impl fmt::Display for DisplayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MmSs => write!(f, "mm:ss"),
            Self::Seconds => write!(f, "seconds"),
        }
    }
}

impl FromStr for DisplayFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mm:ss" => Ok(Self::MmSs),
            "seconds" => Ok(Self::Seconds),
            other => Err(format!("unknown display format '{}', expected 'mm:ss' or 'seconds'", other)),
        }
    }
}

/// Remaining time split for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedTime {
    pub minutes: String,
    pub seconds: String,
    pub display: String,
    pub minutes_raw: u64,
    pub seconds_raw: u64,
}

impl DisplayFormat {
    /// Render a budget in whole seconds
    pub fn format(self, total_seconds: u64) -> FormattedTime {
        let minutes_raw = total_seconds / 60;
        let seconds_raw = total_seconds % 60;

        match self {
            Self::MmSs => {
                let minutes = format!("{:02}", minutes_raw);
                let seconds = format!("{:02}", seconds_raw);
                FormattedTime {
                    display: format!("{}:{}", minutes, seconds),
                    minutes,
                    seconds,
                    minutes_raw,
                    seconds_raw,
                }
            }
            Self::Seconds => FormattedTime {
                minutes: minutes_raw.to_string(),
                seconds: seconds_raw.to_string(),
                display: format!("{}s", total_seconds),
                minutes_raw,
                seconds_raw,
            },
        }
    }
}
