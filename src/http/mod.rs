//! Request construction, execution, and outcome classification.
mod client;
mod context;
mod executor;
mod provider;

#[cfg(test)]
pub(crate) mod test_server;

pub use client::{ClientOptions, build_client};
pub use context::{RequestContext, WorkerContext};
pub use executor::{RequestExecutor, RequestOutcome};
pub use provider::{ContentProvider, SEQUENCE_PLACEHOLDER, TemplateProvider};
