// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use castsync_config::{Config, ConfigManager};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

mod commands;

fn build_cli() -> Command {
    Command::new("castsync")
        .version("0.1.0")
        .author("DrTomLLC")
        .about("Podcast feed reconciliation and episode action sync tools")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("DIR")
                .help("Config directory (defaults to the platform config dir)")
                .global(true),
        )
        .arg(
            Arg::new("store")
                .short('s')
                .long("store")
                .value_name("PATH")
                .help("Feed store snapshot, overrides app.store_path")
                .global(true),
        )
        .subcommand(Command::new("init").about("Write a default config and an empty feed store"))
        .subcommand(
            Command::new("merge")
                .about("Merge a parsed feed (JSON) into the store")
                .arg(Arg::new("feed").required(true).value_name("FEED_JSON").help("Parsed feed file"))
                .arg(
                    Arg::new("remove-unlisted")
                        .short('r')
                        .long("remove-unlisted")
                        .help("Delete stored episodes the feed no longer lists")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("actions-out")
                        .short('o')
                        .long("actions-out")
                        .value_name("FILE")
                        .help("Write queued sync actions as an upload payload"),
                ),
        )
        .subcommand(Command::new("list").about("List stored feeds"))
        .subcommand(
            Command::new("remove-feed")
                .about("Remove a stored feed by its download URL")
                .arg(Arg::new("url").required(true).value_name("URL").help("Feed download URL")),
        )
        .subcommand(Command::new("diagnostics").about("Show the feed anomaly log"))
        .subcommand(
            Command::new("encode-action")
                .about("Print the JSON record of an episode action")
                .arg(Arg::new("podcast").long("podcast").required(true).value_name("URL").help("Feed URL"))
                .arg(Arg::new("episode").long("episode").required(true).value_name("URL").help("Media URL"))
                .arg(
                    Arg::new("action")
                        .long("action")
                        .required(true)
                        .value_name("KIND")
                        .value_parser(["new", "download", "play", "delete"])
                        .help("Action kind"),
                )
                .arg(Arg::new("guid").long("guid").value_name("GUID").help("Episode GUID"))
                .arg(
                    Arg::new("timestamp")
                        .long("timestamp")
                        .value_name("yyyy-MM-ddTHH:mm:ss")
                        .help("UTC timestamp, defaults to now"),
                )
                .arg(Arg::new("started").long("started").value_name("SECS").value_parser(clap::value_parser!(i64)))
                .arg(Arg::new("position").long("position").value_name("SECS").value_parser(clap::value_parser!(i64)))
                .arg(Arg::new("total").long("total").value_name("SECS").value_parser(clap::value_parser!(i64))),
        )
        .subcommand(
            Command::new("decode-actions")
                .about("Decode a sync server response of episode actions")
                .arg(Arg::new("file").required(true).value_name("FILE").help("Response JSON file")),
        )
}

fn load_config(matches: &ArgMatches) -> Result<(ConfigManager, Config)> {
    let manager = match matches.get_one::<String>("config") {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    }
    .context("Failed to locate config directory")?;
    let config = manager
        .load_with_env_overrides()
        .context("Failed to load config")?;
    Ok((manager, config))
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let (manager, config) = load_config(&matches)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_level.to_string()),
    )
    .init();

    let store_path = matches
        .get_one::<String>("store")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.app.store_path.clone());

    match matches.subcommand() {
        Some(("init", _)) => commands::init(&manager, &store_path),
        Some(("merge", sub_matches)) => commands::merge_feed(&config, &store_path, sub_matches),
        Some(("list", _)) => commands::list_feeds(&store_path),
        Some(("remove-feed", sub_matches)) => {
            commands::remove_feed(&config, &store_path, sub_matches)
        }
        Some(("diagnostics", _)) => commands::show_diagnostics(&store_path),
        Some(("encode-action", sub_matches)) => commands::encode_action(sub_matches),
        Some(("decode-actions", sub_matches)) => commands::decode_actions(sub_matches),
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
