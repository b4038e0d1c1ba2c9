//! Resource Loader
//!
//! The fetching seam. Widgets only ever issue GET requests for markup,
//! stylesheets, scripts and JSON, so a request is a URL plus headers.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::{NetError, Response};

/// Future returned by [`ResourceFetcher::fetch`]
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Response, NetError>> + 'a>>;

/// Request configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub headers: HashMap<String, String>,
}

impl Request {
    pub fn get(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }
}

/// Anything that can turn a GET request into a response.
///
/// Futures are `!Send`: everything runs on the single UI event loop.
pub trait ResourceFetcher {
    fn fetch(&self, request: Request) -> FetchFuture<'_>;

    /// GET a URL and require a 2xx status
    fn fetch_ok<'a>(&'a self, url: &str) -> FetchFuture<'a> {
        let request = Request::get(url);
        Box::pin(async move {
            let response = self.fetch(request).await?;
            if !response.is_success() {
                return Err(NetError::HttpError {
                    status: response.status,
                });
            }
            Ok(response)
        })
    }
}
