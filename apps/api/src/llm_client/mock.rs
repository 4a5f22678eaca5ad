//! Mock completion service for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionService, ModelResponse, UpstreamError};

/// A configurable reply for [`MockCompletion`].
#[derive(Clone, Debug)]
pub enum MockReply {
    /// A usable completion with this content.
    Content(String),
    /// A non-2xx status from the service.
    Status(u16),
    /// A 2xx response without a completion.
    Malformed,
}

impl MockReply {
    fn into_result(self) -> Result<ModelResponse, UpstreamError> {
        match self {
            MockReply::Content(content) => Ok(ModelResponse {
                content,
                usage: None,
            }),
            MockReply::Status(status) => Err(UpstreamError::Api {
                status,
                body: format!("mock status {status}"),
            }),
            MockReply::Malformed => Err(UpstreamError::MalformedCompletion {
                status: 200,
                body: "{}".to_string(),
            }),
        }
    }
}

/// A hand-rolled [`CompletionService`] that replays scripted replies
/// (repeating the last one) and records every prompt it receives.
pub struct MockCompletion {
    replies: Mutex<Vec<MockReply>>,
    last: Mutex<MockReply>,
    prompts: Mutex<Vec<String>>,
    call_count: AtomicUsize,
}

impl MockCompletion {
    pub fn new(reply: MockReply) -> Self {
        Self::with_sequence(vec![reply])
    }

    pub fn with_sequence(mut replies: Vec<MockReply>) -> Self {
        replies.reverse();
        let last = replies.first().cloned().unwrap_or(MockReply::Malformed);
        Self {
            replies: Mutex::new(replies),
            last: Mutex::new(last),
            prompts: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self::new(MockReply::Content(content.into()))
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn evaluate(&self, prompt: &str, _system: &str) -> Result<ModelResponse, UpstreamError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let reply = match self.replies.lock().unwrap().pop() {
            Some(reply) => {
                *self.last.lock().unwrap() = reply.clone();
                reply
            }
            None => self.last.lock().unwrap().clone(),
        };
        reply.into_result()
    }
}
