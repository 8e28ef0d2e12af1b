//! NATS fan-out for committed lineup changes.
//!
//! Other devices following the same match subscribe to
//! `matchday.<match>.<team_in_match>.lineup` and reload when a summary
//! arrives. The publisher sits behind a trait so tests can capture messages
//! without a running server.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::traits::BaseCommitNotifier;
use crate::common::AggregateRef;
use crate::domains::commit::CommitSummary;

/// A published message.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub subject: String,
    pub payload: Bytes,
}

#[async_trait]
pub trait NatsPublisher: Send + Sync {
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()>;
}

/// Real NATS client publisher.
pub struct NatsClientPublisher {
    client: async_nats::Client,
}

impl NatsClientPublisher {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let client = async_nats::connect(url)
            .await
            .with_context(|| format!("Failed to connect to NATS at {}", url))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl NatsPublisher for NatsClientPublisher {
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()> {
        self.client.publish(subject, payload).await?;
        Ok(())
    }
}

/// Captures publishes in memory.
#[derive(Default)]
pub struct TestNats {
    published: Mutex<Vec<PublishedMessage>>,
}

impl TestNats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published_messages(&self) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn messages_for_subject(&self, subject: &str) -> Vec<PublishedMessage> {
        self.published_messages()
            .into_iter()
            .filter(|m| m.subject == subject)
            .collect()
    }
}

#[async_trait]
impl NatsPublisher for TestNats {
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()> {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(PublishedMessage { subject, payload });
        Ok(())
    }
}

pub fn lineup_subject(aggregate: AggregateRef) -> String {
    format!(
        "matchday.{}.{}.lineup",
        aggregate.match_id, aggregate.team_in_match_id
    )
}

/// Publishes a JSON [`CommitSummary`] per successful commit.
pub struct NatsCommitNotifier {
    publisher: Arc<dyn NatsPublisher>,
}

impl NatsCommitNotifier {
    pub fn new(publisher: Arc<dyn NatsPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl BaseCommitNotifier for NatsCommitNotifier {
    async fn lineup_committed(
        &self,
        aggregate: AggregateRef,
        summary: &CommitSummary,
    ) -> Result<()> {
        let subject = lineup_subject(aggregate);
        let payload = serde_json::to_vec(summary).context("Failed to encode commit summary")?;

        debug!(subject = %subject, events = summary.event_ids.len(), "publishing lineup commit");
        self.publisher.publish(subject, Bytes::from(payload)).await
    }
}
