//! Batch two PATCH requests into one round trip.
//!
//! Run with: cargo run --example simple_client -- http://localhost:5000/batch

use http_batch::{BatchClient, RequestOptions};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:5000/batch".to_string());

    println!("Batch Client Example");
    println!("====================\n");
    println!("Sending batch to {}", endpoint);

    let client = BatchClient::new();
    let (alice, bob) = client
        .batch(&endpoint, |b| {
            let alice = b.patch(
                "/person/alice",
                RequestOptions::new().json(&json!({"favorite_food": "panang curry"}))?,
            )?;
            let bob = b.patch(
                "/person/bob",
                RequestOptions::new().json(&json!({"favorite_food": "butter chicken"}))?,
            )?;
            Ok((alice, bob))
        })
        .await?;

    for (name, result) in [("alice", &alice), ("bob", &bob)] {
        println!("\n{}:", name);
        println!("  Status: {} {}", result.status()?, result.reason()?);
        println!("  Body: {}", result.text()?);
    }

    Ok(())
}
