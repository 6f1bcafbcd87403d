use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use narrow::config::Config;
use narrow::constants::LOG_FILE_NAME;
use narrow::message::MessageId;
use narrow::narrow::{Filter, NarrowContext, NarrowEnv, NarrowPlan, activate, hash};
use narrow::snapshot::Snapshot;

fn setup_logging(config: &Config) {
    use std::fs::OpenOptions;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));

    // Try to create a log file in the config directory
    let log_file = Config::config_dir()
        .ok()
        .and_then(|dir| std::fs::create_dir_all(&dir).ok().map(|_| dir))
        .map(|dir| dir.join(LOG_FILE_NAME))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"narrow - Chat search narrowing engine

Usage: narrow <command> [args]

Commands:
    parse <query>                       Show how a search query is understood
    select <snapshot.toml> <query>      Decide what a narrow shows from cached state
           [--target ID]
    help                                Show this help message

Configuration file: ~/.config/narrow/config.toml
"#
    );
}

fn run_parse(query: &str) {
    let filter = Filter::parse(query);
    println!("Terms:");
    for term in filter.terms() {
        println!("    {}", term);
    }
    println!("Search string: {}", filter.unparse());
    println!("Hash:          {}", hash::operators_to_hash(filter.terms()));
    println!("Description:   {}", filter.describe());
    println!("Local:         {}", filter.can_apply_locally());
}

fn run_select(
    config: &Config,
    snapshot_path: &Path,
    query: &str,
    target: Option<MessageId>,
) -> Result<()> {
    let snapshot = Snapshot::load(snapshot_path)
        .with_context(|| format!("Failed to load snapshot: {}", snapshot_path.display()))?;
    let env = NarrowEnv {
        messages: &snapshot.messages,
        unread: &snapshot.unread,
        directory: &snapshot.directory,
    };

    let mut context = NarrowContext::new();
    let Some(activation) = activate(
        &mut context,
        Filter::parse(query).operators(),
        target,
        &env,
        &config.fetch,
    ) else {
        println!("Empty query: home view");
        return Ok(());
    };

    let fmt_id = |id: Option<MessageId>| id.map_or("-".to_string(), |id| id.to_string());
    println!("Narrow:          {}", context.search_string());
    println!("Target id:       {}", fmt_id(activation.id_info.target_id));
    println!("Local select id: {}", fmt_id(activation.id_info.local_select_id));
    println!("Final select id: {}", fmt_id(activation.id_info.final_select_id));
    println!("Muting enabled:  {}", context.muting_enabled());
    println!("Cache has newest: {}", snapshot.messages.has_found_newest());

    match activation.plan {
        NarrowPlan::RenderLocally {
            select_id,
            message_ids,
        } => {
            println!("Plan: render {} cached messages, select {}", message_ids.len(), select_id);
            println!(
                "Messages: {}",
                message_ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        NarrowPlan::Fetch {
            anchor,
            num_before,
            num_after,
            ..
        } => {
            println!(
                "Plan: fetch from server, anchor {:?}, {} before, {} after",
                anchor, num_before, num_after
            );
        }
    }
    Ok(())
}

/// Split `args` into positional arguments and an optional `--target ID`.
fn parse_select_args(args: &[String]) -> Result<(Vec<&str>, Option<MessageId>)> {
    let mut positional = Vec::new();
    let mut target = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--target" {
            let value = iter.next().context("--target needs a message id")?;
            target = Some(
                value
                    .parse()
                    .with_context(|| format!("Invalid message id: {}", value))?,
            );
        } else {
            positional.push(arg.as_str());
        }
    }
    Ok((positional, target))
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let config = Config::load()?;
    setup_logging(&config);

    match args.first().map(String::as_str) {
        Some("parse") => {
            run_parse(&args[1..].join(" "));
            Ok(())
        }
        Some("select") => {
            let (positional, target) = parse_select_args(&args[1..])?;
            let Some((snapshot, query)) = positional.split_first() else {
                print_usage();
                anyhow::bail!("select needs a snapshot file");
            };
            run_select(&config, Path::new(snapshot), &query.join(" "), target)
        }
        Some("help") | Some("--help") | Some("-h") | None => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            print_usage();
            anyhow::bail!("Unknown command: {}", other)
        }
    }
}
