//! Plank Client - follows a table over WebSocket and prints its event log.

use plank_client::{ClientConfig, SyncClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plank_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = ClientConfig::from_env()?;

    tracing::info!(
        api = %config.backend.api_base_url,
        ws = %config.backend.ws_url,
        "Starting Plank client"
    );

    let client = SyncClient::spawn_default(config);
    client.refresh();
    client.connect();

    let mut updates = client.subscribe();
    let mut printed = 0usize;
    let mut last_id: Option<String> = None;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();

                // Print entries appended since the last wake-up
                let start = last_id
                    .as_ref()
                    .and_then(|id| snapshot.log.iter().position(|e| &e.id == id))
                    .map(|i| i + 1)
                    .unwrap_or(0);
                for entry in &snapshot.log[start..] {
                    println!("[{}] {}", entry.kind, entry.message);
                    printed += 1;
                }
                last_id = snapshot.log.last().map(|e| e.id.clone());
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
        }
    }

    let items = client.snapshot().items;
    client.shutdown().await;
    tracing::info!(entries = printed, items = items.len(), "Plank client stopped");

    // Final copy of the table, for piping into other tools
    println!("{}", serde_json::to_string_pretty(&items)?);

    Ok(())
}
