//! Command-line parsing.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};

use pharmstock_infra::ledger_store::DEFAULT_HISTORY_LIMIT;

pub const USAGE: &str = "\
Usage: pharmstock <command>
Commands:
  stats [--from YYYY-MM-DD --to YYYY-MM-DD]
  dashboard [--from YYYY-MM-DD --to YYYY-MM-DD]
  items [--all]
  search <query>
  add <name> <default-price> [--spec <spec>] [--manufacturer <name>]
  in <item-id> <quantity> <unit-price>
  out <item-id> <quantity> [unit-price]
  delete <item-id>
  restore <item-id>
  history [limit]
  export-json
  export-csv <dir>
  import <file.json> [--merge]
  scan
  recover <key>";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Storage recovery scan; runs without loading the active inventory.
    Scan,
    Ledger(LedgerCommand),
}

/// Commands that operate on the loaded inventory.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCommand {
    Stats { from: Option<String>, to: Option<String> },
    Dashboard { from: Option<String>, to: Option<String> },
    Items { all: bool },
    Search { query: String },
    Add { name: String, price: f64, spec: Option<String>, manufacturer: Option<String> },
    Inbound { item_id: String, quantity: i64, price: f64 },
    Outbound { item_id: String, quantity: i64, price: Option<f64> },
    Delete { item_id: String },
    Restore { item_id: String },
    History { limit: usize },
    ExportJson,
    ExportCsv { dir: PathBuf },
    Import { file: PathBuf, merge: bool },
    Recover { key: String },
}

pub fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Command> {
    let mut args = args.into_iter();
    let command = args.next().ok_or_else(|| anyhow!("missing command"))?;
    let mut rest = Rest::new(args.collect());

    if command == "scan" {
        rest.finish()?;
        return Ok(Command::Scan);
    }

    let parsed = match command.as_str() {
        "stats" | "dashboard" => {
            let from = rest.option("--from")?;
            let to = rest.option("--to")?;
            if from.is_some() != to.is_some() {
                bail!("--from and --to must be given together");
            }
            if command == "stats" {
                LedgerCommand::Stats { from, to }
            } else {
                LedgerCommand::Dashboard { from, to }
            }
        }
        "items" => LedgerCommand::Items { all: rest.flag("--all") },
        "search" => LedgerCommand::Search { query: rest.positional("query")? },
        "add" => {
            let spec = rest.option("--spec")?;
            let manufacturer = rest.option("--manufacturer")?;
            LedgerCommand::Add {
                name: rest.positional("name")?,
                price: number(&rest.positional("default-price")?, "default-price")?,
                spec,
                manufacturer,
            }
        }
        "in" => LedgerCommand::Inbound {
            item_id: rest.positional("item-id")?,
            quantity: number(&rest.positional("quantity")?, "quantity")?,
            price: number(&rest.positional("unit-price")?, "unit-price")?,
        },
        "out" => LedgerCommand::Outbound {
            item_id: rest.positional("item-id")?,
            quantity: number(&rest.positional("quantity")?, "quantity")?,
            price: rest
                .optional_positional()
                .map(|raw| number(&raw, "unit-price"))
                .transpose()?,
        },
        "delete" => LedgerCommand::Delete { item_id: rest.positional("item-id")? },
        "restore" => LedgerCommand::Restore { item_id: rest.positional("item-id")? },
        "history" => LedgerCommand::History {
            limit: rest
                .optional_positional()
                .map(|raw| number(&raw, "limit"))
                .transpose()?
                .unwrap_or(DEFAULT_HISTORY_LIMIT),
        },
        "export-json" => LedgerCommand::ExportJson,
        "export-csv" => LedgerCommand::ExportCsv { dir: rest.positional("dir")?.into() },
        "import" => {
            let merge = rest.flag("--merge");
            LedgerCommand::Import { file: rest.positional("file")?.into(), merge }
        }
        "recover" => LedgerCommand::Recover { key: rest.positional("key")? },
        other => bail!("unknown command {other:?}"),
    };

    rest.finish()?;
    Ok(Command::Ledger(parsed))
}

fn number<T>(raw: &str, what: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("{what} must be a number, got {raw:?}"))
}

/// Remaining arguments: options and flags are taken out by name, the rest
/// are consumed in order as positionals.
struct Rest {
    args: Vec<String>,
}

impl Rest {
    fn new(args: Vec<String>) -> Self {
        Self { args }
    }

    fn flag(&mut self, name: &str) -> bool {
        match self.args.iter().position(|a| a == name) {
            Some(idx) => {
                self.args.remove(idx);
                true
            }
            None => false,
        }
    }

    fn option(&mut self, name: &str) -> anyhow::Result<Option<String>> {
        let Some(idx) = self.args.iter().position(|a| a == name) else {
            return Ok(None);
        };
        if idx + 1 >= self.args.len() {
            bail!("{name} needs a value");
        }
        let value = self.args.remove(idx + 1);
        self.args.remove(idx);
        Ok(Some(value))
    }

    fn optional_positional(&mut self) -> Option<String> {
        (!self.args.is_empty()).then(|| self.args.remove(0))
    }

    fn positional(&mut self, what: &str) -> anyhow::Result<String> {
        self.optional_positional()
            .ok_or_else(|| anyhow!("missing <{what}>"))
    }

    fn finish(self) -> anyhow::Result<()> {
        match self.args.first() {
            Some(extra) => bail!("unexpected argument {extra:?}"),
            None => Ok(()),
        }
    }
}
