use serde::Deserialize;
use std::num::NonZeroU64;

use reqwest::Method;

use crate::error::ValidationError;

/// HTTP method as typed by the user, normalised to upper case.
///
/// Any valid method token is accepted (not only the common verbs), so custom
/// methods reach the target unchanged apart from case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMethod(Method);

impl HttpMethod {
    #[must_use]
    pub const fn as_method(&self) -> &Method {
        &self.0
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for HttpMethod {
    fn default() -> Self {
        HttpMethod(Method::GET)
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(ValidationError::HttpMethodEmpty);
        }
        Method::from_bytes(normalized.as_bytes())
            .map(HttpMethod)
            .map_err(|err| ValidationError::InvalidHttpMethod {
                value: s.to_owned(),
                source: err,
            })
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse::<HttpMethod>().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveU64(NonZeroU64);

impl PositiveU64 {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<u64> for PositiveU64 {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        NonZeroU64::new(value)
            .map(PositiveU64)
            .ok_or(ValidationError::ValueTooSmall { min: 1 })
    }
}

impl std::str::FromStr for PositiveU64 {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Parse signed first so "-5" is reported as too small rather than as garbage.
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|err| ValidationError::InvalidNumber { source: err })?;
        if value < 1 {
            return Err(ValidationError::ValueTooSmall { min: 1 });
        }
        PositiveU64::try_from(value.unsigned_abs())
    }
}

impl From<PositiveU64> for u64 {
    fn from(value: PositiveU64) -> Self {
        value.get()
    }
}
