//! Resource path construction.
//!
//! A `ResourcePath` is a list of raw segments plus query pairs, resolved
//! against the client's base URL at request-build time. Each caller-supplied
//! segment is validated when pushed and percent-encoded as exactly one path
//! segment when resolved, so an id containing `/` or `?` can never address a
//! different resource.

use url::Url;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl ResourcePath {
    /// Start a path at a fixed collection name such as `players`.
    pub fn collection(name: &'static str) -> Self {
        Self {
            segments: vec![name.to_string()],
            query: Vec::new(),
        }
    }

    /// Append a caller-supplied segment (typically an id).
    ///
    /// # Errors
    /// `ApiError::InvalidPath` if the segment is empty, is `.` or `..`, or
    /// contains control characters.
    pub fn segment(mut self, value: &str) -> ApiResult<Self> {
        validate_segment(value)?;
        self.segments.push(value.to_string());
        Ok(self)
    }

    /// Append a query parameter. Values are form-encoded on resolve.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Join this path onto `base`, keeping whatever path `base` already has
    /// (e.g. `/api/v1`).
    pub fn resolve(&self, base: &Url) -> ApiResult<Url> {
        let mut url = base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                ApiError::InvalidPath(format!("base URL {base} cannot carry a path"))
            })?;
            segments.pop_if_empty().extend(&self.segments);
        }
        url.set_query(None);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        url.set_fragment(None);
        Ok(url)
    }
}

fn validate_segment(value: &str) -> ApiResult<()> {
    if value.is_empty() {
        return Err(ApiError::InvalidPath("path segment is empty".to_string()));
    }
    if value == "." || value == ".." {
        return Err(ApiError::InvalidPath(format!(
            "path segment {value:?} is a relative reference"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(ApiError::InvalidPath(format!(
            "path segment {value:?} contains a control character"
        )));
    }
    Ok(())
}
