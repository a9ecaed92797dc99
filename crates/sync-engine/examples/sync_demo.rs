// crates/sync-engine/examples/sync_demo.rs
//! Builds a few episode actions, queues them and prints the upload body.
//!
//! Run with: cargo run -p castsync-sync-engine --example sync_demo

use castsync_sync_engine::{
    ActionKind, ActionUpload, RemoteActions, SyncAction, SyncActionSink, SyncQueue,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let queue = SyncQueue::new(true);
    let feed = "https://example.com/podcast.xml";

    queue.enqueue_if_enabled(
        SyncAction::builder(feed, "https://example.com/ep1.mp3", ActionKind::Download)
            .guid("ep-1")
            .current_timestamp()
            .build(),
    );
    queue.enqueue_if_enabled(
        SyncAction::builder(feed, "https://example.com/ep1.mp3", ActionKind::Play)
            .guid("ep-1")
            .current_timestamp()
            .started(0)
            .position(600)
            .total(1800)
            .build(),
    );

    println!("Pending actions:");
    for action in queue.pending()? {
        println!("  {}", action);
    }

    let upload = ActionUpload::new(&queue.drain()?)?;
    println!("\nUpload body ({} records):", upload.len());
    println!("{}", serde_json::to_string_pretty(&upload.to_json())?);

    let response = format!(
        r#"{{"actions": {}, "timestamp": 1700000000}}"#,
        upload.to_json_string()?
    );
    let remote = RemoteActions::parse(&response)?;
    println!(
        "\nDecoded {} remote actions ({} skipped)",
        remote.actions.len(),
        remote.skipped
    );

    Ok(())
}
