//! In-process transport used by the unit tests.
//!
//! Replies are scripted per publish as `(delay, payload)` pairs and routed to
//! the publish's reply inbox. Zero-delay replies are routed inside
//! `publish_with_reply`, so they are lost if nobody is subscribed yet.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::traits::{ReplySubscription, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MockMessage {
    pub subject: String,
    pub payload: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Published {
    pub subject: String,
    pub reply: String,
    pub payload: Bytes,
}

type Responder = dyn Fn(&Published) -> Vec<(Duration, Bytes)> + Send + Sync;

#[derive(Default)]
struct MockState {
    inboxes: HashMap<String, mpsc::UnboundedSender<MockMessage>>,
    published: Vec<Published>,
    subscribes: usize,
    unsubscribes: usize,
}

pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
    responder: Arc<Responder>,
    fail_publish: bool,
    fail_subscribe: bool,
    close_after_replies: bool,
}

impl MockTransport {
    fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&Published) -> Vec<(Duration, Bytes)> + Send + Sync + 'static,
    {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            responder: Arc::new(responder),
            fail_publish: false,
            fail_subscribe: false,
            close_after_replies: false,
        }
    }

    /// Answer every publish with the same scripted replies.
    pub fn replying(script: Vec<(Duration, &'static str)>) -> Self {
        Self::with_responder(move |_| {
            script
                .iter()
                .map(|(delay, body)| (*delay, Bytes::from_static(body.as_bytes())))
                .collect()
        })
    }

    /// Echo the request payload back once per delay.
    pub fn echoing(delays: Vec<Duration>) -> Self {
        Self::with_responder(move |published| {
            delays
                .iter()
                .map(|delay| (*delay, published.payload.clone()))
                .collect()
        })
    }

    /// Never answer.
    pub fn silent() -> Self {
        Self::with_responder(|_| Vec::new())
    }

    pub fn fail_publish(mut self) -> Self {
        self.fail_publish = true;
        self
    }

    pub fn fail_subscribe(mut self) -> Self {
        self.fail_subscribe = true;
        self
    }

    /// End the reply stream once the scripted replies are delivered.
    pub fn close_after_replies(mut self) -> Self {
        self.close_after_replies = true;
        self
    }

    pub fn published(&self) -> Vec<Published> {
        lock(&self.state).published.clone()
    }

    pub fn subscribe_count(&self) -> usize {
        lock(&self.state).subscribes
    }

    pub fn unsubscribe_count(&self) -> usize {
        lock(&self.state).unsubscribes
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn deliver(state: &Mutex<MockState>, inbox: &str, payload: Bytes) {
    if let Some(tx) = lock(state).inboxes.get(inbox) {
        let _ = tx.send(MockMessage {
            subject: inbox.to_string(),
            payload,
        });
    }
}

fn close(state: &Mutex<MockState>, inbox: &str) {
    lock(state).inboxes.remove(inbox);
}

#[async_trait]
impl Transport for MockTransport {
    type Message = MockMessage;
    type Subscription = MockSubscription;

    fn new_inbox(&self) -> String {
        format!("_INBOX.{}", uuid::Uuid::new_v4().simple())
    }

    async fn subscribe(&self, subject: &str) -> Result<MockSubscription, TransportError> {
        if self.fail_subscribe {
            return Err(TransportError::SubscribeFailed("mock refused".to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = lock(&self.state);
        state.subscribes += 1;
        state.inboxes.insert(subject.to_string(), tx);
        Ok(MockSubscription {
            inbox: subject.to_string(),
            rx,
            state: Arc::clone(&self.state),
        })
    }

    async fn publish_with_reply(
        &self,
        subject: &str,
        reply: &str,
        payload: Bytes,
    ) -> Result<(), TransportError> {
        if self.fail_publish {
            return Err(TransportError::PublishFailed("mock refused".to_string()));
        }
        let published = Published {
            subject: subject.to_string(),
            reply: reply.to_string(),
            payload,
        };
        lock(&self.state).published.push(published.clone());

        let mut script = (self.responder)(&published);
        script.sort_by_key(|(delay, _)| *delay);
        let delayed = script.split_off(script.partition_point(|(delay, _)| delay.is_zero()));

        for (_, body) in script {
            deliver(&self.state, reply, body);
        }

        let close_after = self.close_after_replies;
        if delayed.is_empty() {
            if close_after {
                close(&self.state, reply);
            }
            return Ok(());
        }

        let state = Arc::clone(&self.state);
        let inbox = reply.to_string();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            for (delay, body) in delayed {
                tokio::time::sleep_until(start + delay).await;
                deliver(&state, &inbox, body);
            }
            if close_after {
                close(&state, &inbox);
            }
        });
        Ok(())
    }
}

pub(crate) struct MockSubscription {
    inbox: String,
    rx: mpsc::UnboundedReceiver<MockMessage>,
    state: Arc<Mutex<MockState>>,
}

impl Stream for MockSubscription {
    type Item = MockMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[async_trait]
impl ReplySubscription<MockMessage> for MockSubscription {
    async fn unsubscribe(&mut self) {
        let mut state = lock(&self.state);
        state.unsubscribes += 1;
        state.inboxes.remove(&self.inbox);
        drop(state);
        self.rx.close();
    }
}

impl Drop for MockSubscription {
    fn drop(&mut self) {
        lock(&self.state).inboxes.remove(&self.inbox);
    }
}
