use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::conversation_state::{ConversationState, Message};
use crate::response_gateway::{ExchangeError, ExchangeOutcome, FailureKind, ResponseGateway};

/// A settled exchange: the reply that was appended and how the exchange ended.
#[derive(Debug)]
pub struct Settlement<'a> {
    pub reply: &'a Message,
    pub failure: Option<FailureKind>,
}

/// Owns the conversation and drives exchanges against a gateway.
pub struct ChatController<G> {
    state: ConversationState,
    gateway: Arc<G>,
    in_flight: Option<JoinHandle<ExchangeOutcome>>,
}

impl<G> ChatController<G>
where
    G: ResponseGateway + 'static,
{
    pub fn new(gateway: G, greeting: impl Into<String>) -> Self {
        Self {
            state: ConversationState::new(greeting),
            gateway: Arc::new(gateway),
            in_flight: None,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.state.update_draft(text);
    }

    /// Submits `text` and dispatches the exchange in the background.
    ///
    /// Returns `false` when the store rejected the submission. On `true` the
    /// user message is already in the transcript and the state is pending.
    pub fn submit(&mut self, text: &str) -> bool {
        let Some(accepted) = self.state.submit(text) else {
            return false;
        };

        debug!("Dispatching exchange");
        let gateway = Arc::clone(&self.gateway);
        self.in_flight = Some(tokio::spawn(async move {
            gateway.exchange(&accepted).await
        }));
        true
    }

    /// Waits for the in-flight exchange and settles it.
    ///
    /// Returns `None` when nothing is in flight. Dropping the returned future
    /// before it completes leaves the exchange in flight for the next call.
    pub async fn settle_pending(&mut self) -> Option<Settlement<'_>> {
        let handle = self.in_flight.as_mut()?;
        let joined = handle.await;
        self.in_flight = None;

        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Exchange task did not complete: {}", e);
                ExchangeOutcome::Failure(ExchangeError::network(format!(
                    "Exchange aborted: {}",
                    e
                )))
            }
        };

        let failure = outcome.failure_kind();
        let reply = self.state.settle(outcome);
        Some(Settlement { reply, failure })
    }
}
