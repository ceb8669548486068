mod cli;

use crate::cli::{Command, GeneratorArg, CLI};
use anyhow::bail;
use clap::Parser;
use jiff::tz::TimeZone;
use serde_json::json;
use snaplink_core::{
    ClickContext, Clock, KeyValueStore, LinkStatus, ShortenRequest, Shortener, SystemClock,
};
use snaplink_generator::seq::SeqGenerator;
use snaplink_generator::{Generator, RandomGenerator};
use snaplink_shortener::{LinkTable, ShortLinkStore, StoreSettings};
use snaplink_storage::FileKvStore;
use snaplink_telemetry::EventJournal;
use std::sync::Arc;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let config = CLI::parse();

    let journal = EventJournal::new();
    snaplink_telemetry::init(config.log_format.into(), journal.clone())?;

    let kv = Arc::new(FileKvStore::new(&config.data_dir));
    journal.restore(&kv);

    info!(
        data_dir = %config.data_dir.display(),
        base_url = %config.base_url,
        generator = %config.generator,
        "starting snaplink"
    );

    let settings = StoreSettings::builder()
        .base_url(config.base_url)
        .time_zone(if config.utc {
            TimeZone::UTC
        } else {
            TimeZone::system()
        })
        .build();
    let table = LinkTable::load(&kv);

    let result = match config.generator {
        GeneratorArg::Random => execute(
            ShortLinkStore::with_table(
                kv.clone(),
                table,
                RandomGenerator::new(),
                SystemClock,
                settings,
            ),
            config.command,
            &journal,
        ),
        GeneratorArg::Seq => {
            // Resume the sequence past the codes a previous run already handed out.
            let generator = SeqGenerator::with_offset("", table.len() as u64);
            execute(
                ShortLinkStore::with_table(kv.clone(), table, generator, SystemClock, settings),
                config.command,
                &journal,
            )
        }
    };

    journal.persist(&kv);
    result
}

fn execute<K: KeyValueStore, G: Generator, C: Clock>(
    store: ShortLinkStore<K, G, C>,
    command: Command,
    journal: &EventJournal,
) -> anyhow::Result<()> {
    match command {
        Command::Shorten {
            url,
            code,
            validity,
        } => {
            let request = shorten_request(&url, code.as_deref(), validity);
            let record = store.shorten(request)?;
            print_json(&json!({
                "shortCode": record.short_code(),
                "codeOrigin": record.short_code().origin(),
                "shortUrl": store.short_url(record.short_code()),
                "originalUrl": record.original_url(),
                "expiryTime": record.expires_at(),
                "validityMinutes": record.validity_minutes(),
            }))
        }
        Command::Resolve {
            code,
            referrer,
            user_agent,
        } => {
            let context = ClickContext {
                referrer: Some(referrer),
                user_agent,
            };
            if let Some(url) = store.resolve(&code, context) {
                println!("{url}");
                return Ok(());
            }
            match store.status(&code) {
                LinkStatus::Expired(record) => {
                    bail!("short URL '{code}' expired at {}", record.expires_at())
                }
                _ => bail!("short URL '{code}' not found"),
            }
        }
        Command::Get { code } => match store.get(&code) {
            Some(record) => print_json(&record),
            None => bail!("short URL '{code}' not found or expired"),
        },
        Command::List => print_json(&store.list_all()),
        Command::Stats { code } => match store.stats_for(&code) {
            Some(stats) => print_json(&stats),
            None => bail!("short URL '{code}' not found"),
        },
        Command::Logs { level, limit } => {
            print_json(&journal.entries(level.map(Into::into), limit))
        }
    }
}

/// Builds a request from raw arguments, trimming both inputs. A blank code
/// means "generate one".
fn shorten_request(url: &str, code: Option<&str>, validity: u32) -> ShortenRequest {
    ShortenRequest::builder()
        .original_url(url.trim())
        .custom_code(code.map(str::trim).filter(|c| !c.is_empty()).map(String::from))
        .validity_minutes(validity)
        .build()
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
