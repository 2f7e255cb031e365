//! Process run mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Controls how much diagnostic detail leaves the process.
///
/// Development exposes stack traces and source references in error reports;
/// production strips them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Development,
    Production,
}

impl FromStr for RunMode {
    type Err = std::convert::Infallible;

    /// Anything other than `production`/`prod` is treated as development.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(RunMode::Production),
            _ => Ok(RunMode::Development),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Development => write!(f, "development"),
            RunMode::Production => write!(f, "production"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_mode() {
        assert_eq!("production".parse::<RunMode>().unwrap(), RunMode::Production);
        assert_eq!(" PROD ".parse::<RunMode>().unwrap(), RunMode::Production);
        assert_eq!("development".parse::<RunMode>().unwrap(), RunMode::Development);
        assert_eq!("staging".parse::<RunMode>().unwrap(), RunMode::Development);
    }
}
