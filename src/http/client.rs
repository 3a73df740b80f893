use std::time::Duration;

use reqwest::Client;

use crate::args::{BenchArgs, DEFAULT_USER_AGENT};
use crate::error::{AppError, AppResult, HttpError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Option<Duration>,
    pub disable_keepalive: bool,
}

impl ClientOptions {
    #[must_use]
    pub const fn from_args(args: &BenchArgs) -> Self {
        Self {
            connect_timeout: args.connect_timeout,
            request_timeout: args.request_timeout,
            disable_keepalive: args.disable_keepalive,
        }
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(120),
            request_timeout: None,
            disable_keepalive: false,
        }
    }
}

/// Builds the single client shared (by clone) across every worker.
///
/// # Errors
///
/// Returns an error when the TLS backend or client cannot be initialised.
pub fn build_client(options: &ClientOptions) -> AppResult<Client> {
    let mut client_builder = Client::builder()
        .connect_timeout(options.connect_timeout)
        .user_agent(DEFAULT_USER_AGENT);

    if let Some(timeout) = options.request_timeout {
        client_builder = client_builder.timeout(timeout);
    }

    if options.disable_keepalive {
        client_builder = client_builder
            .pool_max_idle_per_host(0)
            .pool_idle_timeout(Some(Duration::from_secs(0)));
    }

    client_builder
        .build()
        .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))
}
