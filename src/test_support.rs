use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::config::test_config;
use crate::services::embedding::HashingEmbedder;
use crate::services::llm_provider::{ChatModel, ChatRequest, LlmError};
use crate::state::AppState;

/// Replays canned replies in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(reply: &str) -> Arc<Self> {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Request("no scripted reply left".into())))
    }
}

pub fn test_state(chat: Arc<ScriptedChat>) -> AppState {
    AppState::new(test_config(), Arc::new(HashingEmbedder::new(64)), chat)
}
