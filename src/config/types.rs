use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::args::HttpMethod;
use crate::args::parsers::parse_duration_arg;
use crate::error::ValidationError;

/// On-disk mirror of the CLI options. Every field is optional; only values
/// left at their CLI default are replaced.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub worker_num: Option<u64>,
    pub batch_size: Option<u64>,
    pub endpoint: Option<String>,
    pub method: Option<HttpMethod>,
    pub header_file: Option<PathBuf>,
    pub body_file: Option<PathBuf>,
    pub tick_interval_ms: Option<u64>,
    pub log_dir: Option<PathBuf>,
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub disable_keepalive: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration_arg(text),
        }
    }
}
