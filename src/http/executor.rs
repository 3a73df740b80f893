use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{AppError, AppResult, HttpError};
use crate::metrics::{SequenceGenerator, StatsAggregator};

use super::context::{RequestContext, WorkerContext};
use super::provider::ContentProvider;

const SUCCESS_STATUS: RangeInclusive<u16> = 200..=299;

/// How a single request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Success { status: u16 },
    /// A response arrived with a status outside `200..=299`.
    Rejected { status: u16 },
    /// No response: connect failure, timeout, DNS, reset.
    Transport { timed_out: bool },
}

impl RequestOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Sends one request per call and records its outcome.
///
/// Cloning is cheap: the client pool, counters, and provider are shared.
#[derive(Clone)]
pub struct RequestExecutor {
    client: Client,
    stats: Arc<StatsAggregator>,
    sequence: Arc<SequenceGenerator>,
    provider: Arc<dyn ContentProvider>,
}

impl RequestExecutor {
    #[must_use]
    pub fn new(
        client: Client,
        stats: Arc<StatsAggregator>,
        sequence: Arc<SequenceGenerator>,
        provider: Arc<dyn ContentProvider>,
    ) -> Self {
        Self {
            client,
            stats,
            sequence,
            provider,
        }
    }

    /// Builds, sends, and classifies one request.
    ///
    /// Transport failures and non-2xx responses are recorded in the
    /// aggregator and returned as outcomes, never as errors.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider yields an invalid header or the
    /// request cannot be built; nothing is recorded in that case.
    pub async fn execute(
        &self,
        batch_index: u64,
        worker: &WorkerContext,
    ) -> AppResult<RequestOutcome> {
        let context = RequestContext {
            worker_id: worker.worker_id,
            batch_index,
            sequence: self.sequence.next(),
        };
        let headers = build_header_map(self.provider.headers(&context))?;
        let body = self.provider.body(&context);

        let mut builder = self
            .client
            .request(worker.method.as_method().clone(), worker.target.clone())
            .headers(headers);
        if !body.is_empty() {
            builder = builder.body(body);
        }
        let request = builder
            .build()
            .map_err(|err| AppError::http(HttpError::BuildRequestFailed { source: err }))?;

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                self.stats.report_failed(&error_chain(&err));
                return Ok(RequestOutcome::Transport {
                    timed_out: err.is_timeout(),
                });
            }
        };

        let status = response.status().as_u16();
        if SUCCESS_STATUS.contains(&status) {
            self.stats.report_success();
            return Ok(RequestOutcome::Success { status });
        }

        let diagnostic = match response.text().await {
            Ok(text) if !text.trim().is_empty() => {
                format!("Status code {} {}", status, text.trim())
            }
            Ok(_) | Err(_) => format!("Status code {}", status),
        };
        self.stats.report_failed(&diagnostic);
        Ok(RequestOutcome::Rejected { status })
    }
}

/// Names differing only by case are kept as repeated headers.
fn build_header_map(headers: BTreeMap<String, String>) -> AppResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            AppError::http(HttpError::InvalidHeaderName {
                header: name.clone(),
                source: err,
            })
        })?;
        let header_value = HeaderValue::from_str(&value).map_err(|err| {
            AppError::http(HttpError::InvalidHeaderValue {
                header: name,
                source: err,
            })
        })?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

/// Error text including every source, e.g. the underlying connect failure.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
