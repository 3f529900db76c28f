use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use crate::{adapters, model};

#[derive(Default)]
struct MockState {
    responses: VecDeque<model::http::TransportResponse>,
    requests: Vec<model::http::TransportRequest>,
}

// Pops one scripted response per request and records every request it saw,
// so tests can assert on the whole exchange. Clones share state.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new(responses: Vec<model::http::TransportResponse>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                responses: responses.into(),
                requests: Vec::new(),
            })),
        }
    }

    pub fn requests(&self) -> Vec<model::http::TransportRequest> {
        self.state
            .lock()
            .expect("failed to acquire mock state guard")
            .requests
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.state
            .lock()
            .expect("failed to acquire mock state guard")
            .responses
            .len()
    }
}

impl adapters::Transport for MockTransport {
    fn send(
        &self,
        req: &model::http::TransportRequest,
    ) -> Result<model::http::TransportResponse, model::error::StorageError> {
        let mut state = self
            .state
            .lock()
            .expect("failed to acquire mock state guard");

        state.requests.push(req.clone());
        state
            .responses
            .pop_front()
            .ok_or_else(|| model::error::StorageError::Protocol {
                status: 0,
                message: format!("mock transport exhausted at: {} {}", req.method, req.url),
            })
    }
}
