use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::transport::{HttpRequest, HttpResponse, HttpTransport};

/// In-memory transport: records every request and replays queued responses in order
#[derive(Clone, Default)]
pub struct MockTransport {
    requests: Rc<RefCell<Vec<HttpRequest>>>,
    responses: Rc<RefCell<VecDeque<Result<HttpResponse, String>>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: HttpResponse) {
        self.responses.borrow_mut().push_back(Ok(response));
    }

    pub fn push_ok(&self, body: &str) {
        self.push(HttpResponse::ok(body));
    }

    pub fn push_network_error(&self, reason: &str) {
        self.responses
            .borrow_mut()
            .push_back(Err(reason.to_string()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

#[async_trait(?Send)]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted response".to_string()))
    }
}
