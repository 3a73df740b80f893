use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{BenchArgs, PositiveU64};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::{ConfigFile, DurationValue};

/// Fills every option not typed on the command line from the config file.
///
/// # Errors
///
/// Returns an error when a config value is out of range.
pub fn apply_config(
    args: &mut BenchArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "worker_num")
        && let Some(value) = config.worker_num
    {
        args.worker_num = ensure_positive_u64(value, "worker_num")?;
    }

    if !is_cli(matches, "batch_size")
        && let Some(value) = config.batch_size
    {
        args.batch_size = ensure_positive_u64(value, "batch_size")?;
    }

    if !is_cli(matches, "endpoint")
        && let Some(endpoint) = config.endpoint.clone()
    {
        args.endpoint = Some(endpoint);
    }

    if !is_cli(matches, "method")
        && let Some(method) = config.method.clone()
    {
        args.method = method;
    }

    if !is_cli(matches, "header_file")
        && let Some(path) = config.header_file.clone()
    {
        args.header_file = Some(path);
    }

    if !is_cli(matches, "body_file")
        && let Some(path) = config.body_file.clone()
    {
        args.body_file = Some(path);
    }

    if !is_cli(matches, "tick_interval_ms")
        && let Some(value) = config.tick_interval_ms
    {
        args.tick_interval_ms = ensure_positive_u64(value, "tick_interval_ms")?;
    }

    if !is_cli(matches, "log_dir")
        && let Some(path) = config.log_dir.clone()
    {
        args.log_dir = path;
    }

    if !is_cli(matches, "request_timeout")
        && let Some(value) = config.timeout.as_ref()
    {
        args.request_timeout = Some(to_duration(value, "timeout")?);
    }

    if !is_cli(matches, "connect_timeout")
        && let Some(value) = config.connect_timeout.as_ref()
    {
        args.connect_timeout = to_duration(value, "connect_timeout")?;
    }

    if !is_cli(matches, "disable_keepalive")
        && let Some(value) = config.disable_keepalive
    {
        args.disable_keepalive = value;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn ensure_positive_u64(value: u64, field: &str) -> AppResult<PositiveU64> {
    PositiveU64::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}

fn to_duration(value: &DurationValue, field: &'static str) -> AppResult<std::time::Duration> {
    value
        .to_duration()
        .map_err(|err| AppError::config(ConfigError::InvalidDuration { field, source: err }))
}
