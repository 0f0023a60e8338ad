//! Fan-in demo against a local NATS server.
//!
//! Prerequisites:
//! ```bash
//! docker run -d --name nats -p 4222:4222 nats:latest
//! ```
//!
//! Run with: cargo run -p nats-fanin --example fan_in

use futures::StreamExt;
use nats_fanin::{NatsConfig, NatsTransport, Replies, RequestError, RequestOptions, Requester};
use std::sync::Arc;
use std::time::Duration;

const SUBJECT: &str = "demo.fanin.status";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nats_fanin=debug,info".into()),
        )
        .init();

    let nats_url = std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string());
    let transport = NatsTransport::connect(NatsConfig::new(&nats_url).with_name("fanin-demo")).await?;

    // Three workers answer every status request.
    for worker in ["alpha", "beta", "gamma"] {
        let client = transport.client().clone();
        let mut sub = client.subscribe(SUBJECT).await?;
        tokio::spawn(async move {
            while let Some(msg) = sub.next().await {
                if let Some(reply) = msg.reply {
                    let _ = client.publish(reply, worker.into()).await;
                }
            }
        });
    }
    transport.flush().await?;

    let requester = Requester::with_options(
        Arc::new(transport),
        RequestOptions::default().timeout(Duration::from_millis(500)),
    );

    // First answer wins.
    if let Replies::Single(msg) = requester.request(SUBJECT, "status").await? {
        println!("first: {}", String::from_utf8_lossy(&msg.payload));
    }

    // Everyone answers.
    let all = requester
        .request_with(SUBJECT, "status", &RequestOptions::new(3))
        .await?;
    for msg in all {
        println!("all: {}", String::from_utf8_lossy(&msg.payload));
    }

    // Asking for more than exist: lenient returns three, strict times out.
    let lenient = RequestOptions::new(5).timeout(Duration::from_millis(200));
    let replies = requester.request_with(SUBJECT, "status", &lenient).await?;
    println!("lenient: {} of 5", replies.len());

    match requester
        .request_with(SUBJECT, "status", &lenient.error_if_partial(true))
        .await
    {
        Err(RequestError::Timeout) => println!("strict: timed out"),
        other => println!("strict: {other:?}"),
    }

    Ok(())
}
