//! Traits for the messaging transport a request runs against.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::TransportError;

/// A live subscription delivering replies in arrival order.
///
/// The stream ends when the transport closes the subscription.
#[async_trait]
pub trait ReplySubscription<M>: Stream<Item = M> + Send + Unpin {
    /// Stop receiving on this subscription.
    ///
    /// Must tolerate being called once; failures are the transport's to log.
    async fn unsubscribe(&mut self);
}

/// Connection capable of correlated publish/subscribe.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Reply message handed back to the caller untouched.
    type Message: Send + 'static;

    /// Subscription type returned by [`Transport::subscribe`].
    type Subscription: ReplySubscription<Self::Message>;

    /// Generate a unique reply subject.
    fn new_inbox(&self) -> String;

    /// Subscribe to a subject.
    async fn subscribe(&self, subject: &str) -> Result<Self::Subscription, TransportError>;

    /// Publish a payload with a reply-to subject attached.
    async fn publish_with_reply(
        &self,
        subject: &str,
        reply: &str,
        payload: Bytes,
    ) -> Result<(), TransportError>;
}
