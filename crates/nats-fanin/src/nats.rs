//! NATS transport backed by `async-nats`.

use async_nats::{Client, ConnectOptions, Message, Subscriber};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::traits::{ReplySubscription, Transport};

/// NATS connection configuration.
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URL(s)
    pub urls: Vec<String>,
    /// Client name for identification
    pub client_name: String,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            urls: vec!["nats://localhost:4222".to_string()],
            client_name: "nats-fanin".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl NatsConfig {
    /// Create config with single URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            ..Default::default()
        }
    }

    /// Replace the URL list, e.g. for a cluster.
    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }

    /// Set client name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// [`Transport`] over a NATS client connection.
#[derive(Clone)]
pub struct NatsTransport {
    client: Client,
}

impl NatsTransport {
    /// Connect to NATS server.
    pub async fn connect(config: NatsConfig) -> Result<Self, TransportError> {
        info!(urls = ?config.urls, "Connecting to NATS");

        let options = ConnectOptions::new()
            .name(&config.client_name)
            .connection_timeout(config.connect_timeout);

        let client = async_nats::connect_with_options(config.urls.join(","), options)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        info!("Connected to NATS server");
        Ok(Self { client })
    }

    /// Connect with default config.
    pub async fn connect_default() -> Result<Self, TransportError> {
        Self::connect(NatsConfig::default()).await
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Get the raw NATS client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.client.connection_state() == async_nats::connection::State::Connected
    }

    /// Flush buffered publishes to the server.
    pub async fn flush(&self) -> Result<(), TransportError> {
        self.client
            .flush()
            .await
            .map_err(|e| TransportError::PublishFailed(e.to_string()))
    }
}

impl From<Client> for NatsTransport {
    fn from(client: Client) -> Self {
        Self::from_client(client)
    }
}

#[async_trait]
impl Transport for NatsTransport {
    type Message = Message;
    type Subscription = NatsSubscription;

    fn new_inbox(&self) -> String {
        self.client.new_inbox()
    }

    async fn subscribe(&self, subject: &str) -> Result<NatsSubscription, TransportError> {
        debug!(subject = %subject, "Subscribing to subject");

        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| TransportError::SubscribeFailed(e.to_string()))?;

        Ok(NatsSubscription {
            subject: subject.to_string(),
            subscriber,
        })
    }

    async fn publish_with_reply(
        &self,
        subject: &str,
        reply: &str,
        payload: Bytes,
    ) -> Result<(), TransportError> {
        debug!(subject = %subject, reply = %reply, "Publishing request");

        self.client
            .publish_with_reply(subject.to_string(), reply.to_string(), payload)
            .await
            .map_err(|e| TransportError::PublishFailed(e.to_string()))
    }
}

/// Reply subscription on a NATS inbox.
///
/// Dropping it without [`ReplySubscription::unsubscribe`] still releases the
/// server-side interest through `Subscriber`'s own drop.
pub struct NatsSubscription {
    subject: String,
    subscriber: Subscriber,
}

impl NatsSubscription {
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl Stream for NatsSubscription {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        Pin::new(&mut self.subscriber).poll_next(cx)
    }
}

#[async_trait]
impl ReplySubscription<Message> for NatsSubscription {
    async fn unsubscribe(&mut self) {
        if let Err(e) = self.subscriber.unsubscribe().await {
            warn!(subject = %self.subject, error = %e, "Unsubscribe failed");
        }
    }
}
