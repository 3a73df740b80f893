use reqwest::Url;

use crate::args::HttpMethod;

/// Identity of one request, handed to the content provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub worker_id: u64,
    pub batch_index: u64,
    pub sequence: u64,
}

/// Per-worker settings, fixed for the worker's lifetime.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    /// 1-based.
    pub worker_id: u64,
    pub batch_size: u64,
    pub target: Url,
    pub method: HttpMethod,
}
