//! In-memory transport for tests.

use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use url::Url;

use crate::{
    error::{Error, Result},
    request::RequestDescriptor,
    transport::{RawResponse, Transport},
};

/// A request captured by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: Url,
    pub request: RequestDescriptor,
}

/// A [`Transport`] that replays queued responses and records every request.
///
/// When the queue is empty, `execute` fails with a transport error.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<RawResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push_response(&self, response: RawResponse) {
        self.lock_responses().push_back(Ok(response));
    }

    /// Queues a JSON response.
    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push_response(RawResponse::json(status, &body));
    }

    /// Queues a transport failure.
    pub fn push_error(&self, err: Error) {
        self.lock_responses().push_back(Err(err));
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<RawResponse>>> {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, url: Url, request: RequestDescriptor) -> Result<RawResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest { url, request });

        self.lock_responses()
            .pop_front()
            .unwrap_or_else(|| Err(Error::TransportMessage("no mock response queued".to_string())))
    }
}
