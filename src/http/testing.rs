//! Scripted transport for unit tests

use super::{PreparedRequest, ResponseEnvelope, Transport};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned responses in order, repeating the last one forever.
/// Every request is recorded.
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<ResponseEnvelope>>>,
    last: Mutex<Option<ResponseEnvelope>>,
    requests: Mutex<Vec<PreparedRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Result<ResponseEnvelope>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn responses(responses: Vec<(u16, &str)>) -> Self {
        Self::new(
            responses
                .into_iter()
                .map(|(status, body)| Ok(ResponseEnvelope::from_body(status, body)))
                .collect(),
        )
    }

    pub(crate) fn always(status: u16, body: &str) -> Self {
        Self::responses(vec![(status, body)])
    }

    pub(crate) fn requests(&self) -> Vec<PreparedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<ResponseEnvelope> {
        self.requests.lock().unwrap().push(request.clone());

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(response)) => {
                *self.last.lock().unwrap() = Some(response.clone());
                Ok(response)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| Error::malformed("scripted transport has no responses")),
        }
    }
}
