// FILE: crates/cli/src/commands.rs

use anyhow::{anyhow, bail, Context, Result};
use castsync_config::{Config, ConfigManager};
use castsync_core::Feed;
use castsync_feed_merge::{
    EpisodeDuplicateGuesser, FeedMergeEngine, InMemoryStore, MergeOptions, MergeOutcome,
    NoopEventSink, StoreSnapshot,
};
use castsync_sync_engine::{codec, ActionKind, ActionUpload, RemoteActions, SyncAction, SyncQueue};
use clap::ArgMatches;
use console::style;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Write a default config file and an empty store
pub fn init(manager: &ConfigManager, store_path: &Path) -> Result<()> {
    if manager.initialize().context("Failed to write default config")? {
        println!(
            "{} Config written to {}",
            style("✓").green().bold(),
            manager.config_path().display()
        );
    }

    if store_path.exists() {
        println!("Store already exists at {}", store_path.display());
    } else {
        save_store(store_path, &InMemoryStore::new())?;
        println!(
            "{} Empty store created at {}",
            style("✓").green().bold(),
            store_path.display()
        );
    }
    Ok(())
}

/// Merge a parsed feed into the store
pub fn merge_feed(config: &Config, store_path: &Path, matches: &ArgMatches) -> Result<()> {
    let feed_path = matches
        .get_one::<String>("feed")
        .ok_or_else(|| anyhow!("Feed file is required"))?;
    let remove_unlisted = matches.get_flag("remove-unlisted");

    let (outcome, actions) = run_merge(config, store_path, Path::new(feed_path), remove_unlisted)?;
    print_outcome(&outcome);

    if !actions.is_empty() {
        println!("\n{} sync actions queued", style(actions.len()).bold().cyan());
        for action in &actions {
            println!("  {}", action);
        }
    }

    if let Some(out) = matches.get_one::<String>("actions-out") {
        let upload = ActionUpload::new(&actions).context("Failed to encode sync actions")?;
        fs::write(out, upload.to_json_string()?)
            .with_context(|| format!("Failed to write {}", out))?;
        println!("Upload payload written to {}", out);
    }

    Ok(())
}

/// List stored feeds
pub fn list_feeds(store_path: &Path) -> Result<()> {
    let snapshot = open_store(store_path)?
        .snapshot()
        .context("Failed to read store")?;

    if snapshot.feeds.is_empty() {
        println!("No feeds stored. Use 'merge' to add one.");
        return Ok(());
    }

    println!("\n{} Feeds", style(snapshot.feeds.len()).bold().cyan());
    println!("{}", "=".repeat(80));
    for feed in &snapshot.feeds {
        print_feed_summary(feed);
    }
    Ok(())
}

/// Remove a feed by download URL
pub fn remove_feed(config: &Config, store_path: &Path, matches: &ArgMatches) -> Result<()> {
    let url = matches
        .get_one::<String>("url")
        .ok_or_else(|| anyhow!("Feed URL is required"))?;

    let store = Arc::new(open_store(store_path)?);
    let engine = build_engine(config, Arc::clone(&store), SyncQueue::new(false));
    if !engine
        .remove_feed_with_download_url(url)
        .context("Failed to remove feed")?
    {
        bail!("No feed with download URL {}", url);
    }

    save_store(store_path, &store)?;
    println!("{} Removed {}", style("✓").green().bold(), url);
    Ok(())
}

/// Print the anomaly log
pub fn show_diagnostics(store_path: &Path) -> Result<()> {
    let diagnostics = open_store(store_path)?
        .diagnostics()
        .context("Failed to read diagnostics")?;

    if diagnostics.is_empty() {
        println!("No feed anomalies recorded.");
        return Ok(());
    }

    for record in &diagnostics {
        println!(
            "{} [{}] {} / {}",
            style(record.recorded_at.format("%Y-%m-%d %H:%M:%S")).dim(),
            style(record.kind).yellow(),
            record.feed_title,
            record.item_title
        );
        for line in record.message.lines() {
            println!("    {}", line);
        }
        println!();
    }
    Ok(())
}

/// Print the JSON record of a single action
pub fn encode_action(matches: &ArgMatches) -> Result<()> {
    let action = build_action(matches)?;
    println!("{}", codec::encode_to_string(&action)?);
    Ok(())
}

/// Decode a server response and print its actions
pub fn decode_actions(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("file")
        .ok_or_else(|| anyhow!("Response file is required"))?;

    let remote = read_remote_actions(Path::new(path))?;
    println!(
        "\n{} actions (server timestamp {})",
        style(remote.actions.len()).bold().cyan(),
        remote.timestamp
    );
    for action in &remote.actions {
        println!("  {}", action);
    }
    if remote.skipped > 0 {
        println!(
            "{} {} records could not be decoded and were skipped",
            style("!").yellow().bold(),
            remote.skipped
        );
    }
    Ok(())
}

fn run_merge(
    config: &Config,
    store_path: &Path,
    feed_path: &Path,
    remove_unlisted: bool,
) -> Result<(MergeOutcome, Vec<SyncAction>)> {
    let text = fs::read_to_string(feed_path)
        .with_context(|| format!("Failed to read feed {}", feed_path.display()))?;
    let incoming: Feed = serde_json::from_str(&text)
        .with_context(|| format!("Feed {} is not valid feed JSON", feed_path.display()))?;

    let store = Arc::new(open_store(store_path)?);
    let queue = SyncQueue::new(config.sync.enabled);
    let engine = build_engine(config, Arc::clone(&store), queue.clone());

    let outcome = engine
        .update_feed(incoming, remove_unlisted)
        .context("Merge failed")?;
    save_store(store_path, &store)?;

    let actions = queue.drain().context("Failed to drain sync queue")?;
    Ok((outcome, actions))
}

fn build_engine(config: &Config, store: Arc<InMemoryStore>, queue: SyncQueue) -> FeedMergeEngine {
    FeedMergeEngine::new(
        store,
        Arc::new(EpisodeDuplicateGuesser::from_config(&config.merge)),
        Arc::new(queue),
        Arc::new(NoopEventSink),
    )
    .with_options(MergeOptions::from(&config.merge))
}

fn build_action(matches: &ArgMatches) -> Result<SyncAction> {
    let podcast = matches
        .get_one::<String>("podcast")
        .ok_or_else(|| anyhow!("Podcast URL is required"))?;
    let episode = matches
        .get_one::<String>("episode")
        .ok_or_else(|| anyhow!("Episode URL is required"))?;
    let kind: ActionKind = matches
        .get_one::<String>("action")
        .ok_or_else(|| anyhow!("Action kind is required"))?
        .parse()
        .map_err(|_| anyhow!("Unknown action kind"))?;

    let mut builder = SyncAction::builder(podcast.as_str(), episode.as_str(), kind);
    if let Some(guid) = matches.get_one::<String>("guid") {
        builder = builder.guid(guid.as_str());
    }
    builder = match matches.get_one::<String>("timestamp") {
        Some(text) => builder.timestamp(
            codec::parse_timestamp(text)
                .ok_or_else(|| anyhow!("Timestamp must look like {}", codec::TIMESTAMP_FORMAT))?,
        ),
        None => builder.current_timestamp(),
    };
    if let Some(&started) = matches.get_one::<i64>("started") {
        builder = builder.started(started);
    }
    if let Some(&position) = matches.get_one::<i64>("position") {
        builder = builder.position(position);
    }
    if let Some(&total) = matches.get_one::<i64>("total") {
        builder = builder.total(total);
    }
    Ok(builder.build())
}

fn read_remote_actions(path: &Path) -> Result<RemoteActions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    RemoteActions::parse(&text).context("Invalid sync response")
}

/// Loads a store snapshot; a missing file is an empty store
fn open_store(path: &Path) -> Result<InMemoryStore> {
    if !path.exists() {
        log::info!("No store at {}, starting empty", path.display());
        return Ok(InMemoryStore::new());
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read store {}", path.display()))?;
    let snapshot: StoreSnapshot = serde_json::from_str(&text)
        .with_context(|| format!("Store {} is corrupted", path.display()))?;
    Ok(InMemoryStore::from_snapshot(snapshot))
}

/// Writes a store snapshot through a temp file and rename
fn save_store(path: &Path, store: &InMemoryStore) -> Result<()> {
    let snapshot = store.snapshot().context("Failed to read store")?;
    let json = serde_json::to_string_pretty(&snapshot)?;

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(json.as_bytes())?;
    temp_file.flush()?;
    temp_file
        .persist(path)
        .with_context(|| format!("Failed to write store {}", path.display()))?;
    log::debug!("Store saved to {}", path.display());
    Ok(())
}

fn print_outcome(outcome: &MergeOutcome) {
    let feed = &outcome.feed;
    let new_count = feed.items.iter().filter(|i| i.is_new()).count();

    println!("{} Merged feed", style("✓").green().bold());
    print_feed_summary(feed);
    println!("  New episodes: {}", new_count);
    if !outcome.removed_items.is_empty() {
        println!("  Removed episodes: {}", outcome.removed_items.len());
    }
    for record in &outcome.diagnostics {
        println!(
            "  {} {}",
            style("!").yellow().bold(),
            truncate(record.message.lines().next().unwrap_or(""), 70)
        );
    }
    for failure in &outcome.store_failures {
        println!("  {} {}", style("✗").red().bold(), failure);
    }
}

fn print_feed_summary(feed: &Feed) {
    println!(
        "{} {}",
        style(format!("[{}]", feed.id)).dim(),
        style(&feed.title).bold()
    );
    println!("  URL: {}", feed.download_url);
    println!("  Episodes: {}", feed.items.len());
    if let Some(next) = &feed.next_page_link {
        println!("  Next page: {}", next);
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
