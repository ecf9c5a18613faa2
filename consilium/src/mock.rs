//! In-process gateway that replays queued responses. Test support for this
//! crate and for services embedding it; no runtime provider selects it.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
    error::ProviderError,
    gateway::{CompletionGateway, GenerationRequest},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: impl Into<String>) -> &Self {
        lock(&self.responses).push_back(Ok(text.into()));
        self
    }

    pub fn push_json(&self, value: Value) -> &Self {
        self.push_text(value.to_string())
    }

    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        lock(&self.responses).push_back(Err(ProviderError::new(message)));
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        lock(&self.requests).clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    fn provider(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        lock(&self.requests).push(request.clone());
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::new("no scripted response left")))
    }
}
