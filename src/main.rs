use anyhow::Context;
use clap::Parser;
use hug_miner::{read_transactions, Dataset, MiningConfig, Utility};
use lasso::Spur;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Mine high utility generators from a transaction database.
///
/// Input lines have the form `items:total:utilities`. Each result is printed as a tab-separated
/// line of itemset, utility, support, and TWU.
#[derive(Parser, Debug)]
#[command(name = "hug-miner", version)]
struct Cli {
    /// Transaction database to read; standard input if omitted
    input: Option<PathBuf>,

    /// Minimum utility an itemset must reach to be reported
    #[arg(short = 'u', long)]
    min_util: Utility,

    /// Longest itemset to consider (defaults to the number of distinct items)
    #[arg(short = 'l', long)]
    max_length: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let (names, table) = match &cli.input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("opening {}", path.display()))?;
            read_transactions::<_, Spur>(BufReader::new(file))
                .with_context(|| format!("reading {}", path.display()))?
        }
        None => read_transactions::<_, Spur>(io::stdin().lock()).context("reading stdin")?,
    };
    let items = table.items();
    info!(
        transactions = table.transaction_count(),
        items = items.len(),
        "loaded dataset"
    );

    let config = MiningConfig {
        min_util: cli.min_util,
        max_length: cli.max_length,
    };
    let mut registry = config.registry(items)?;
    let mut hugs = Vec::new();
    let summary = registry.mine_all(&table, config.min_util, |hug| hugs.push(hug))?;
    info!(?summary, "mining finished");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for hug in hugs {
        let mut items = hug.label.iter().map(|item| names.resolve(&item));
        if let Some(first) = items.next() {
            write!(out, "{}", first)?;
        }
        for item in items {
            write!(out, " {}", item)?;
        }
        writeln!(out, "\t{}\t{}\t{}", hug.utility, hug.support, hug.twu)?;
    }
    out.flush()?;

    Ok(())
}
