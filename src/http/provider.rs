use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{AppError, AppResult, ConfigError};

use super::context::RequestContext;

/// Token in a body template replaced by the request's sequence number.
pub const SEQUENCE_PLACEHOLDER: &[u8] = b"${SEQ}";

/// Source of per-request headers and body.
pub trait ContentProvider: Send + Sync {
    fn headers(&self, context: &RequestContext) -> BTreeMap<String, String>;
    fn body(&self, context: &RequestContext) -> Vec<u8>;
}

/// Static headers plus a body template loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateProvider {
    headers: BTreeMap<String, String>,
    body: BodyTemplate,
}

impl TemplateProvider {
    #[must_use]
    pub fn new(headers: BTreeMap<String, String>, body: &[u8]) -> Self {
        Self {
            headers,
            body: BodyTemplate::parse(body),
        }
    }

    /// Loads the optional header (JSON object) and body files.
    ///
    /// # Errors
    ///
    /// Returns a config error when a file cannot be read or the header file
    /// is not a JSON object of strings.
    pub fn from_files(header_file: Option<&Path>, body_file: Option<&Path>) -> AppResult<Self> {
        let headers = match header_file {
            Some(path) => load_headers(path)?,
            None => BTreeMap::new(),
        };
        let body = match body_file {
            Some(path) => std::fs::read(path).map_err(|err| {
                AppError::config(ConfigError::ReadBodyFile {
                    path: path.to_path_buf(),
                    source: err,
                })
            })?,
            None => Vec::new(),
        };
        Ok(Self::new(headers, &body))
    }

    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.body.segments.len().saturating_sub(1)
    }
}

impl ContentProvider for TemplateProvider {
    fn headers(&self, _context: &RequestContext) -> BTreeMap<String, String> {
        self.headers.clone()
    }

    fn body(&self, context: &RequestContext) -> Vec<u8> {
        self.body.render(context.sequence)
    }
}

fn load_headers(path: &Path) -> AppResult<BTreeMap<String, String>> {
    let content = std::fs::read(path).map_err(|err| {
        AppError::config(ConfigError::ReadHeaderFile {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    serde_json::from_slice(&content).map_err(|err| {
        AppError::config(ConfigError::ParseHeaderFile {
            path: path.to_path_buf(),
            source: err,
        })
    })
}

/// Body bytes split around every placeholder; rendering joins the pieces
/// with the sequence number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct BodyTemplate {
    segments: Vec<Vec<u8>>,
}

impl BodyTemplate {
    fn parse(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::default();
        }
        let mut segments = Vec::new();
        let mut rest = bytes;
        while let Some(position) = find(rest, SEQUENCE_PLACEHOLDER) {
            let (head, tail) = rest.split_at(position);
            segments.push(head.to_vec());
            rest = tail.get(SEQUENCE_PLACEHOLDER.len()..).unwrap_or_default();
        }
        segments.push(rest.to_vec());
        Self { segments }
    }

    fn render(&self, sequence: u64) -> Vec<u8> {
        match self.segments.as_slice() {
            [] => Vec::new(),
            [only] => only.clone(),
            segments => segments.join(sequence.to_string().as_bytes()),
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
