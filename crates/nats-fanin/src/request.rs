//! Fan-in request: publish once, collect replies until the target count or the
//! timeout, whichever comes first.
//!
//! ```rust,ignore
//! use nats_fanin::{NatsTransport, Request};
//!
//! let transport = NatsTransport::connect_default().await?;
//! let replies = Request::new("svc.health", "ping")
//!     .expected(3)
//!     .timeout(Duration::from_secs(1))
//!     .send(&transport)
//!     .await?;
//! ```

use bytes::Bytes;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::collector::{Push, ReplyBuffer};
use crate::error::RequestError;
use crate::options::RequestOptions;
use crate::reply::Replies;
use crate::subject::SubjectPatterns;
use crate::traits::{ReplySubscription, Transport};

/// Why the wait for replies ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Satisfied,
    TimedOut,
    Cancelled,
    Closed,
}

/// Publish `payload` to `subject` and collect replies per `options`.
pub async fn request<T>(
    transport: &T,
    subject: &str,
    payload: impl Into<Bytes>,
    options: &RequestOptions,
) -> Result<Replies<T::Message>, RequestError>
where
    T: Transport + ?Sized,
{
    run(transport, subject, payload.into(), options, None).await
}

/// Like [`request`], but stops waiting when `token` is cancelled.
///
/// Cancellation ends the wait early; whatever arrived so far is decided on
/// exactly as if the timeout had fired.
pub async fn request_with_cancellation<T>(
    transport: &T,
    subject: &str,
    payload: impl Into<Bytes>,
    options: &RequestOptions,
    token: &CancellationToken,
) -> Result<Replies<T::Message>, RequestError>
where
    T: Transport + ?Sized,
{
    run(transport, subject, payload.into(), options, Some(token)).await
}

async fn run<T>(
    transport: &T,
    subject: &str,
    payload: Bytes,
    options: &RequestOptions,
    token: Option<&CancellationToken>,
) -> Result<Replies<T::Message>, RequestError>
where
    T: Transport + ?Sized,
{
    options.validate()?;
    SubjectPatterns::validate_publish(subject)?;

    let inbox = transport.new_inbox();
    let mut subscription = transport.subscribe(&inbox).await?;
    debug!(subject = %subject, inbox = %inbox, expected = options.expected, "Subscribed to reply inbox");

    let mut buffer = ReplyBuffer::new(options.expected);
    let started = Instant::now();

    let waited = match transport.publish_with_reply(subject, &inbox, payload).await {
        Ok(()) => Ok(collect(&mut subscription, &mut buffer, options.timeout, token).await),
        Err(e) => {
            warn!(subject = %subject, inbox = %inbox, error = %e, "Publish failed");
            Err(e)
        }
    };

    subscription.unsubscribe().await;

    let completion = waited?;
    debug!(
        subject = %subject,
        inbox = %inbox,
        received = buffer.len(),
        expected = options.expected,
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        ?completion,
        "Request finished"
    );

    buffer.finish(options.error_if_partial)
}

/// Race the reply stream against the deadline and the caller's token.
///
/// The stream is polled first, so a reply already queued when the deadline
/// fires or the token is cancelled still counts. Returns once; dropping the
/// pinned sleep on the way out cancels the timer.
async fn collect<S, M>(
    subscription: &mut S,
    buffer: &mut ReplyBuffer<M>,
    timeout: Duration,
    token: Option<&CancellationToken>,
) -> Completion
where
    S: ReplySubscription<M>,
{
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            biased;

            next = subscription.next() => match next {
                Some(reply) => {
                    if buffer.push(reply) == Push::Complete {
                        return Completion::Satisfied;
                    }
                }
                None => return Completion::Closed,
            },
            () = cancelled(token) => return Completion::Cancelled,
            () = &mut deadline => return Completion::TimedOut,
        }
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// A single fan-in request, immutable once built.
#[derive(Debug, Clone)]
pub struct Request {
    subject: String,
    payload: Bytes,
    options: RequestOptions,
}

impl Request {
    /// Request with default options: one reply within 500ms.
    pub fn new(subject: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn expected(mut self, expected: usize) -> Self {
        self.options.expected = expected;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    pub fn error_if_partial(mut self, strict: bool) -> Self {
        self.options.error_if_partial = strict;
        self
    }

    /// Replace all options at once.
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn request_options(&self) -> &RequestOptions {
        &self.options
    }

    /// Send over `transport` and wait for the replies.
    pub async fn send<T>(self, transport: &T) -> Result<Replies<T::Message>, RequestError>
    where
        T: Transport + ?Sized,
    {
        run(transport, &self.subject, self.payload, &self.options, None).await
    }

    /// Send, stopping the wait early if `token` is cancelled.
    pub async fn send_with_cancellation<T>(
        self,
        transport: &T,
        token: &CancellationToken,
    ) -> Result<Replies<T::Message>, RequestError>
    where
        T: Transport + ?Sized,
    {
        run(transport, &self.subject, self.payload, &self.options, Some(token)).await
    }
}

/// Shared handle issuing requests over one transport with default options.
pub struct Requester<T: ?Sized> {
    transport: Arc<T>,
    defaults: RequestOptions,
}

impl<T: ?Sized> Clone for Requester<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            defaults: self.defaults,
        }
    }
}

impl<T: Transport + ?Sized> Requester<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_options(transport, RequestOptions::default())
    }

    pub fn with_options(transport: Arc<T>, defaults: RequestOptions) -> Self {
        Self {
            transport,
            defaults,
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn defaults(&self) -> &RequestOptions {
        &self.defaults
    }

    /// Request using the default options.
    pub async fn request(
        &self,
        subject: &str,
        payload: impl Into<Bytes>,
    ) -> Result<Replies<T::Message>, RequestError> {
        request(self.transport.as_ref(), subject, payload, &self.defaults).await
    }

    /// Request with explicit options.
    pub async fn request_with(
        &self,
        subject: &str,
        payload: impl Into<Bytes>,
        options: &RequestOptions,
    ) -> Result<Replies<T::Message>, RequestError> {
        request(self.transport.as_ref(), subject, payload, options).await
    }

    /// Request using the default options, stopping the wait early if `token`
    /// is cancelled.
    pub async fn request_with_cancellation(
        &self,
        subject: &str,
        payload: impl Into<Bytes>,
        token: &CancellationToken,
    ) -> Result<Replies<T::Message>, RequestError> {
        request_with_cancellation(self.transport.as_ref(), subject, payload, &self.defaults, token)
            .await
    }
}
