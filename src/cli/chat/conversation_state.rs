use tracing::{debug, warn};

use crate::response_gateway::{ExchangeError, ExchangeOutcome, FailureKind};

pub const NETWORK_UNREACHABLE_TEXT: &str =
    "The chat service is unreachable. Check that it is running and try again.";
pub const GENERIC_FALLBACK_TEXT: &str = "Sorry, something went wrong. Please try again.";
pub const HTTP_REJECTED_TEXT: &str = "The service rejected the request.";
pub const API_KEY_MISSING_TEXT: &str =
    "API key is not configured. Please check the server configuration.";
pub const AGENT_SILENT_TEXT: &str = "The AI agent is not responding. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Agent,
}

/// A transcript entry. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: Sender,
    text: String,
}

impl Message {
    fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    fn agent(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Agent,
            text: text.into(),
        }
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The transcript plus the in-flight flag and the unsent draft.
///
/// This is the only place conversation state changes. The transcript starts
/// with one seeded greeting and only ever grows; `pending` is true exactly
/// while one exchange is outstanding.
#[derive(Debug)]
pub struct ConversationState {
    messages: Vec<Message>,
    pending: bool,
    draft: String,
}

impl ConversationState {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::agent(greeting)],
            pending: false,
            draft: String::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Accepts a submission, returning the trimmed text to dispatch.
    ///
    /// Blank text, or any text while an exchange is outstanding, is ignored
    /// and leaves the state untouched.
    pub fn submit(&mut self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring blank submission");
            return None;
        }
        if self.pending {
            debug!("Ignoring submission while an exchange is in flight");
            return None;
        }

        self.messages.push(Message::user(text));
        self.pending = true;
        self.draft.clear();
        Some(text.to_string())
    }

    /// Records the outcome of the outstanding exchange as exactly one agent
    /// message and returns to idle.
    pub fn settle(&mut self, outcome: ExchangeOutcome) -> &Message {
        let Self {
            messages, pending, ..
        } = &mut *self;

        if !*pending {
            warn!("Settling with no exchange in flight");
        }
        let release = PendingRelease(pending);

        let index = messages.len();
        messages.push(Message::agent(reply_text(outcome)));
        drop(release);

        &self.messages[index]
    }
}

/// Clears the in-flight flag when dropped, so every exit path of `settle`
/// releases it, unwinding included.
struct PendingRelease<'a>(&'a mut bool);

impl Drop for PendingRelease<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

fn reply_text(outcome: ExchangeOutcome) -> String {
    match outcome {
        ExchangeOutcome::Success(text) if !text.trim().is_empty() => text,
        ExchangeOutcome::Success(_) => {
            warn!("Empty reply treated as a malformed payload");
            GENERIC_FALLBACK_TEXT.to_string()
        }
        ExchangeOutcome::Failure(error) => failure_text(&error),
    }
}

/// The user-facing text for a failed exchange.
pub fn failure_text(error: &ExchangeError) -> String {
    match error.kind {
        FailureKind::Network => NETWORK_UNREACHABLE_TEXT.to_string(),
        FailureKind::HttpStatus => rejection_text(&error.detail),
        FailureKind::MalformedPayload => GENERIC_FALLBACK_TEXT.to_string(),
    }
}

fn rejection_text(detail: &str) -> String {
    if detail.trim().is_empty() {
        HTTP_REJECTED_TEXT.to_string()
    } else if detail.contains("GROQ_API_KEY") {
        API_KEY_MISSING_TEXT.to_string()
    } else if detail.contains("No response from agent") {
        AGENT_SILENT_TEXT.to_string()
    } else {
        detail.to_string()
    }
}
