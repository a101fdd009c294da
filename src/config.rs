//! Runtime settings.
//!
//! Priority:
//! 1. command-line flags
//! 2. environment variables (`JEONSE_*`, a `.env` file is honoured)
//! 3. defaults
//!
//! | variable               | default      |
//! |------------------------|--------------|
//! | `JEONSE_DATA_DIR`      | `./data`     |
//! | `JEONSE_DISTRICT_CODE` | `1150010300` |
//! | `JEONSE_GRADE_CAUTION` | `0.56`       |
//! | `JEONSE_GRADE_HIGH`    | `0.68`       |
//! | `JEONSE_LOG_LEVEL`     | `info`       |
//! | `JEONSE_LOG_FORMAT`    | `pretty`     |

use std::path::PathBuf;

use crate::domain::{DEFAULT_DISTRICT_CODE, GradeThresholds};
use crate::error::{RiskError, RiskResult};
use crate::logging::LogFormat;

pub const ENV_DATA_DIR: &str = "JEONSE_DATA_DIR";
pub const ENV_DISTRICT_CODE: &str = "JEONSE_DISTRICT_CODE";
pub const ENV_GRADE_CAUTION: &str = "JEONSE_GRADE_CAUTION";
pub const ENV_GRADE_HIGH: &str = "JEONSE_GRADE_HIGH";
pub const ENV_LOG_LEVEL: &str = "JEONSE_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "JEONSE_LOG_FORMAT";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub district_code: String,
    pub thresholds: GradeThresholds,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            district_code: DEFAULT_DISTRICT_CODE.to_string(),
            thresholds: GradeThresholds::CANONICAL,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub district_code: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl Settings {
    /// Read settings from the process environment (after loading `.env`).
    pub fn from_env() -> RiskResult<Settings> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup` (environment-shaped key → value).
    pub fn from_lookup<F>(lookup: F) -> RiskResult<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Settings::default();

        if let Some(dir) = get(ENV_DATA_DIR) {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Some(code) = get(ENV_DISTRICT_CODE) {
            settings.district_code = parse_district_code(&code)?;
        }

        let caution = get(ENV_GRADE_CAUTION)
            .map(|v| parse_probability(ENV_GRADE_CAUTION, &v))
            .transpose()?
            .unwrap_or(settings.thresholds.caution);
        let high = get(ENV_GRADE_HIGH)
            .map(|v| parse_probability(ENV_GRADE_HIGH, &v))
            .transpose()?
            .unwrap_or(settings.thresholds.high);
        settings.thresholds = GradeThresholds::new(caution, high).ok_or_else(|| {
            RiskError::InvalidInput(format!(
                "grade thresholds must satisfy 0 <= caution < high <= 1 (got {caution} / {high})"
            ))
        })?;

        if let Some(level) = get(ENV_LOG_LEVEL) {
            settings.log_level = level;
        }
        if let Some(format) = get(ENV_LOG_FORMAT) {
            settings.log_format = format
                .parse()
                .map_err(|e: String| RiskError::InvalidInput(format!("{ENV_LOG_FORMAT}: {e}")))?;
        }

        Ok(settings)
    }

    pub fn apply(mut self, overrides: Overrides) -> RiskResult<Settings> {
        if let Some(dir) = overrides.data_dir {
            self.data_dir = dir;
        }
        if let Some(code) = overrides.district_code {
            self.district_code = parse_district_code(&code)?;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(format) = overrides.log_format {
            self.log_format = format;
        }
        Ok(self)
    }
}

fn parse_probability(key: &str, raw: &str) -> RiskResult<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RiskError::InvalidInput(format!("{key}: '{raw}' is not a number")))
}

fn parse_district_code(raw: &str) -> RiskResult<String> {
    let code = raw.trim();
    if code.len() != 10 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(RiskError::InvalidInput(format!(
            "district code must be 10 digits (got '{raw}')"
        )));
    }
    Ok(code.to_string())
}
