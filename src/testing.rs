//! Test doubles for the response gateway.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use eyre::{Result, eyre};

use crate::response_gateway::{ExchangeOutcome, FailureKind, HealthStatus, ResponseGateway};

/// Gateway that replays queued outcomes and records what it was asked.
#[derive(Default)]
pub struct MockGateway {
    outcomes: Mutex<VecDeque<ExchangeOutcome>>,
    requests: Mutex<Vec<String>>,
    health: Option<HealthStatus>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_health(mut self, status: &str, message: &str) -> Self {
        self.health = Some(HealthStatus {
            status: status.to_string(),
            message: Some(message.to_string()),
        });
        self
    }

    pub fn queue(&self, outcome: ExchangeOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn queue_success(&self, text: &str) {
        self.queue(ExchangeOutcome::Success(text.to_string()));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResponseGateway for MockGateway {
    async fn exchange(&self, user_text: &str) -> ExchangeOutcome {
        self.requests.lock().unwrap().push(user_text.to_string());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ExchangeOutcome::failure(FailureKind::Network, "No mock outcome queued"))
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.health
            .clone()
            .ok_or_else(|| eyre!("connection refused"))
    }
}

/// Gateway whose exchange task panics.
pub struct PanickingGateway;

#[async_trait]
impl ResponseGateway for PanickingGateway {
    async fn exchange(&self, _user_text: &str) -> ExchangeOutcome {
        panic!("gateway exploded")
    }

    async fn health(&self) -> Result<HealthStatus> {
        Err(eyre!("gateway exploded"))
    }
}
