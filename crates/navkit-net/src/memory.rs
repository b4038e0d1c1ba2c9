//! In-memory fetcher
//!
//! Serves canned responses keyed by URL, records every request, and can
//! inject failures or suspend once per request so callers interleave.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::loader::{FetchFuture, Request, ResourceFetcher};
use crate::{NetError, Response};

#[derive(Debug, Clone)]
enum Route {
    Respond(Response),
    Fail(String),
}

/// Fetcher backed by a URL -> response table
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    routes: RefCell<HashMap<String, Route>>,
    log: RefCell<Vec<String>>,
    suspend: Cell<bool>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yield to the executor once inside every fetch
    pub fn suspending(self) -> Self {
        self.suspend.set(true);
        self
    }

    /// Serve `body` with status 200
    pub fn insert(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.insert_response(url, Response::ok(body));
    }

    pub fn insert_response(&self, url: &str, response: Response) {
        self.routes
            .borrow_mut()
            .insert(url.to_string(), Route::Respond(response));
    }

    /// Fail requests for `url` with a network error
    pub fn fail(&self, url: &str, reason: &str) {
        self.routes
            .borrow_mut()
            .insert(url.to_string(), Route::Fail(reason.to_string()));
    }

    pub fn remove(&self, url: &str) {
        self.routes.borrow_mut().remove(url);
    }

    /// How many times `url` was requested
    pub fn request_count(&self, url: &str) -> usize {
        self.log.borrow().iter().filter(|u| *u == url).count()
    }

    /// Every requested URL, in order
    pub fn requests(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl ResourceFetcher for MemoryFetcher {
    fn fetch(&self, request: Request) -> FetchFuture<'_> {
        Box::pin(async move {
            self.log.borrow_mut().push(request.url.clone());
            tracing::debug!("memory fetch {}", request.url);

            if self.suspend.get() {
                smol::future::yield_now().await;
            }

            let route = self.routes.borrow().get(&request.url).cloned();
            match route {
                Some(Route::Respond(response)) => Ok(response),
                Some(Route::Fail(reason)) => Err(NetError::Network(reason)),
                None => Ok(Response::with_status(404)),
            }
        })
    }
}
