//! `pharmstock`: command-line front end over the persisted ledger store.
//!
//! Projections are printed to stdout as JSON; logs go to stderr.

mod args;

use std::path::Path;
use std::{env, fs, process};

use anyhow::Context;
use serde::Serialize;

use pharmstock_analytics::{Aggregator, DateRange};
use pharmstock_core::{Clock, ItemId, SystemClock};
use pharmstock_infra::{scan_blobs, Config, FileBlobStore, LedgerStore};
use pharmstock_inventory::{ImportMode, NewItem, StockMovement};

use crate::args::{Command, LedgerCommand, USAGE};

type Store = LedgerStore<FileBlobStore, SystemClock>;

fn main() {
    let config = Config::from_env();
    pharmstock_observability::init(config.log_format);
    config.report_warnings();

    let command = match args::parse(env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("Error: {err:#}\n\n{USAGE}");
            process::exit(2);
        }
    };

    if let Err(err) = run(&config, command) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run(config: &Config, command: Command) -> anyhow::Result<()> {
    let blobs = FileBlobStore::new(&config.data_dir)
        .with_context(|| format!("opening data directory {}", config.data_dir.display()))?;

    let command = match command {
        // Works even when the active blob is unreadable.
        Command::Scan => return print_json(&scan_blobs(&blobs)?),
        Command::Ledger(command) => command,
    };

    let mut store: Store = LedgerStore::open(blobs, config.storage_key.as_str(), SystemClock)
        .with_context(|| format!("loading inventory from key {:?}", config.storage_key))?;

    match command {
        LedgerCommand::Stats { from, to } => {
            let range = date_range(from, to)?;
            let agg = Aggregator::with_clock(store.dataset(), store.clock());
            print_json(&agg.statistics(range.as_ref()))
        }
        LedgerCommand::Dashboard { from, to } => {
            let range = date_range(from, to)?;
            let agg = Aggregator::with_clock(store.dataset(), store.clock());
            print_json(&agg.dashboard(range.as_ref()))
        }
        LedgerCommand::Items { all } => print_json(&store.items(all)),
        LedgerCommand::Search { query } => print_json(&store.search_items(&query)),
        LedgerCommand::Add { name, price, spec, manufacturer } => {
            let mut new_item = NewItem::new(name, price);
            if let Some(spec) = spec {
                new_item = new_item.with_spec(spec);
            }
            if let Some(manufacturer) = manufacturer {
                new_item = new_item.with_manufacturer(manufacturer);
            }
            print_json(&store.add_item(new_item)?)
        }
        LedgerCommand::Inbound { item_id, quantity, price } => {
            let movement = StockMovement::inbound(item_id, quantity, price);
            print_json(&store.record_transaction(movement)?)
        }
        LedgerCommand::Outbound { item_id, quantity, price } => {
            let mut movement = StockMovement::outbound(item_id, quantity);
            if let Some(price) = price {
                movement = movement.with_price(price);
            }
            print_json(&store.record_transaction(movement)?)
        }
        LedgerCommand::Delete { item_id } => print_json(&store.delete_item(&ItemId::from(item_id))?),
        LedgerCommand::Restore { item_id } => print_json(&store.restore_item(&ItemId::from(item_id))?),
        LedgerCommand::History { limit } => print_json(&store.recent_transactions(limit)),
        LedgerCommand::ExportJson => {
            println!("{}", store.export_snapshot()?);
            Ok(())
        }
        LedgerCommand::ExportCsv { dir } => export_csv(&store, &dir),
        LedgerCommand::Import { file, merge } => {
            let blob = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let mode = if merge { ImportMode::Merge } else { ImportMode::Replace };
            print_json(&store.import_snapshot(&blob, mode)?)
        }
        LedgerCommand::Recover { key } => print_json(&store.restore_from_key(&key)?),
    }
}

fn date_range(from: Option<String>, to: Option<String>) -> anyhow::Result<Option<DateRange>> {
    match (from, to) {
        (Some(from), Some(to)) => Ok(Some(DateRange::parse(&from, &to)?)),
        _ => Ok(None),
    }
}

fn export_csv(store: &Store, dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let today = store.clock().today();

    let catalog = dir.join(format!("catalog-{today}.csv"));
    fs::write(&catalog, store.export_catalog_csv()?)
        .with_context(|| format!("writing {}", catalog.display()))?;

    let ledger = dir.join(format!("ledger-{today}.csv"));
    fs::write(&ledger, store.export_ledger_csv()?)
        .with_context(|| format!("writing {}", ledger.display()))?;

    tracing::info!(catalog = %catalog.display(), ledger = %ledger.display(), "csv export written");
    print_json(&serde_json::json!({
        "catalog": catalog.display().to_string(),
        "ledger": ledger.display().to_string(),
    }))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
