//! Scripted transport for tests.

use super::{ApiClient, ApiRequest, Transport};
use crate::error::ApiError;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Default)]
struct Script {
    responses: VecDeque<Result<Value, ApiError>>,
    requests: Vec<ApiRequest>,
}

/// Replays queued responses in order and records every request it sees.
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Rc<RefCell<Script>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, value: Value) -> &Self {
        self.script.borrow_mut().responses.push_back(Ok(value));
        self
    }

    pub fn fail(&self, status: u16, message: &str) -> &Self {
        self.script
            .borrow_mut()
            .responses
            .push_back(Err(ApiError::Status {
                status,
                message: message.to_string(),
            }));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script.borrow().requests.clone()
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(Box::new(self.clone()))
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let mut script = self.script.borrow_mut();
        script.requests.push(request.clone());
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted response".to_string())))
    }
}
