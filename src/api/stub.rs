//! In-memory connector for handler tests: canned replies keyed by method and
//! full path, every request recorded in order.

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use super::{Connector, Method, Request};
use crate::error::ApiError;

enum Reply {
    Body(Vec<u8>),
    Fail(u16, String),
}

#[derive(Default)]
pub struct StubConnector {
    replies: HashMap<(Method, String), Reply>,
    calls: RefCell<Vec<Request>>,
    token: Option<String>,
}

impl StubConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, method: Method, path: &str, body: Value) -> Self {
        self.replies
            .insert((method, path.to_string()), Reply::Body(body.to_string().into_bytes()));
        self
    }

    pub fn reply_bytes(mut self, method: Method, path: &str, body: &[u8]) -> Self {
        self.replies
            .insert((method, path.to_string()), Reply::Body(body.to_vec()));
        self
    }

    pub fn fail(mut self, method: Method, path: &str, status: u16, message: &str) -> Self {
        self.replies
            .insert((method, path.to_string()), Reply::Fail(status, message.to_string()));
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.borrow().clone()
    }

    /// `"METHOD /full/path"` for each recorded call.
    pub fn call_lines(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|r| format!("{} {}", r.method, r.full_path()))
            .collect()
    }
}

impl Connector for StubConnector {
    async fn send(&self, request: Request) -> Result<Vec<u8>, ApiError> {
        let key = (request.method, request.full_path());
        self.calls.borrow_mut().push(request);
        match self.replies.get(&key) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Fail(status, message)) => Err(ApiError::Status {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn access_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.token.clone())
    }
}
