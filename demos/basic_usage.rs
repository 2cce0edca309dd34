//! Basic usage of objects3
//!
//! Runs against the in-memory store unless `OBJECTS3_ENDPOINT` is set, in
//! which case it talks to that endpoint and uses `OBJECTS3_BUCKET`.
//!
//! ```text
//! cargo run --example basic_usage
//! OBJECTS3_ENDPOINT=http://localhost:9000 OBJECTS3_BUCKET=demo cargo run --example basic_usage
//! ```

use futures::TryStreamExt;
use objects3::{BulkOptions, JsonBucket, MemoryObjectStore, ObjectStore, S3Client};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Serialize, Deserialize)]
struct Profile {
    name: String,
    visits: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "objects3=debug,objects3_store=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bucket = std::env::var("OBJECTS3_BUCKET").unwrap_or_else(|_| "demo".to_string());
    let store: Arc<dyn ObjectStore> = if std::env::var("OBJECTS3_ENDPOINT").is_ok() {
        let client = S3Client::from_env()?;
        tracing::info!("Using endpoint {}", client.config().endpoint);
        Arc::new(client)
    } else {
        tracing::info!("Using in-memory store");
        Arc::new(MemoryObjectStore::with_bucket(&bucket))
    };

    let docs = JsonBucket::new(store, bucket).with_defaults(BulkOptions::new().with_max_keys(2));

    // Write a few documents
    let keys = ["profiles/ada.json", "profiles/alan.json", "profiles/grace.json"];
    let profiles = [
        Profile { name: "Ada".into(), visits: 3 },
        Profile { name: "Alan".into(), visits: 1 },
        Profile { name: "Grace".into(), visits: 7 },
    ];
    let etags = docs.put_multiple(&keys, &profiles, None).await?;
    println!("Wrote {} documents", etags.len());

    // Read one back, and one that does not exist
    if let Some(ada) = docs.get_one::<Profile>("profiles/ada.json").await? {
        println!("ada.json => {:?} (etag {})", ada.body, ada.etag);
    }
    let missing = docs.get_one::<Profile>("profiles/nobody.json").await?;
    println!("nobody.json present: {}", missing.is_some());

    // Walk the prefix two entries at a time
    let mut pages = std::pin::pin!(docs.get_prefix_pages::<Profile>("profiles/", None));
    while let Some(page) = pages.try_next().await? {
        for entry in &page.contents {
            println!("{} => {:?}", entry.key, entry.body);
        }
        println!("truncated: {}", page.is_truncated);
    }

    // Clean up, one page per call
    loop {
        let removed = docs.delete_prefix("profiles/", None).await?;
        println!("{}", serde_json::to_string_pretty(&removed)?);
        if removed.page.contents.is_empty() {
            break;
        }
    }

    Ok(())
}
