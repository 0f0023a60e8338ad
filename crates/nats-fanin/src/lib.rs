//! # nats-fanin
//!
//! Publish one request on a NATS subject and return its replies as soon as
//! they arrive.
//!
//! A request waits for `expected` replies or `timeout`, whichever comes
//! first. One expected reply is returned as [`Replies::Single`], more as
//! [`Replies::Many`] in arrival order. A short batch is returned as-is unless
//! `error_if_partial` is set; an empty one is always [`RequestError::Timeout`].
//!
//! ```rust,no_run
//! use nats_fanin::{request, NatsTransport, RequestOptions};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = NatsTransport::connect_default().await?;
//! let options = RequestOptions::new(3).timeout(Duration::from_millis(250));
//!
//! for reply in request(&transport, "svc.health", "ping", &options).await? {
//!     println!("{:?}", reply.payload);
//! }
//! # Ok(())
//! # }
//! ```

mod collector;
mod error;
#[cfg(test)]
mod mock;
mod nats;
mod options;
mod reply;
mod request;
mod subject;
mod traits;

pub use error::{RequestError, TransportError};
pub use nats::{NatsConfig, NatsSubscription, NatsTransport};
pub use options::{RequestOptions, DEFAULT_EXPECTED, DEFAULT_TIMEOUT};
pub use reply::Replies;
pub use request::{request, request_with_cancellation, Request, Requester};
pub use subject::{SubjectPatterns, INBOX_PREFIX};
pub use traits::{ReplySubscription, Transport};

pub use tokio_util::sync::CancellationToken;
