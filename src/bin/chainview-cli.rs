#![forbid(unsafe_code)]
//! Print the recent blocks of a node, and optionally one block's transactions

use chainview::config::{load_config, DEFAULT_CONFIG_FILE};
use chainview::explorer::{ChainSnapshot, Explorer};
use chainview::format::{format_wei, short_hex};
use chainview::numeric::parse_block_selection;
use chainview::rpc::NodeClient;
use clap::Parser;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Node JSON-RPC endpoint (http(s) URL or IPC socket path)
    #[arg(long)]
    endpoint: Option<String>,
    /// Number of recent blocks to show
    #[arg(long)]
    window: Option<usize>,
    /// Decimal block number whose transactions should be listed
    #[arg(long)]
    block: Option<String>,
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|l| {
            Cell::new(l)
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold)
        })
        .collect()
}

fn print_blocks(snapshot: &ChainSnapshot) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Block", "Time", "Hash", "Txs", "Miner"]));

    for block in &snapshot.blocks {
        table.add_row(vec![
            Cell::new(format!("#{}", block.number)).fg(TableColor::White),
            Cell::new(block.timestamp.format("%Y-%m-%d %H:%M:%S")).fg(TableColor::Grey),
            Cell::new(short_hex(&block.hash)),
            Cell::new(block.transaction_count),
            Cell::new(short_hex(&block.miner_address)),
        ]);
    }

    println!("{}", table);
}

fn print_transactions(snapshot: &ChainSnapshot) {
    let Some(selected) = &snapshot.selected_block_number else {
        return;
    };

    println!();
    println!("{}", format!("Transactions in block #{}", selected).bright_green().bold());

    if let Some(err) = &snapshot.enrichment_error {
        println!("{}", format!("Transactions unavailable: {}", err).red());
        return;
    }
    if snapshot.transactions.is_empty() {
        println!("{}", "No transactions in this block".yellow());
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Hash", "To", "Value (ether)", "Fee (wei)", "Contract"]));

    for tx in &snapshot.transactions {
        let to = match &tx.to_address {
            Some(addr) => Cell::new(short_hex(addr)),
            None => Cell::new("contract creation").fg(TableColor::Magenta),
        };
        table.add_row(vec![
            Cell::new(short_hex(&tx.hash)),
            to,
            Cell::new(format_wei(&tx.value_wei)).fg(TableColor::Green),
            Cell::new(tx.fee_wei.to_string()),
            Cell::new(tx.contract_address.as_deref().map(short_hex).unwrap_or_default()),
        ]);
    }

    println!("{}", table);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    if let Some(endpoint) = cli.endpoint {
        config.node.endpoint = endpoint;
    }
    if let Some(window) = cli.window {
        config.explorer.window_size = window;
    }
    config.validate()?;

    let selection = match cli.block.as_deref() {
        Some(raw) => Some(
            parse_block_selection(Some(raw))
                .ok_or_else(|| format!("--block must be a decimal block number, got {:?}", raw))?,
        ),
        None => None,
    };

    let client = NodeClient::connect(&config.node.endpoint, config.rpc_timeout()?)?;
    let explorer = Explorer::new(Arc::new(client)).with_window_size(config.explorer.window_size);

    let snapshot = explorer.build_view(selection).await.map_err(|e| {
        eprintln!("{}", "Unable to retrieve blockchain info".red().bold());
        e
    })?;

    println!(
        "{}",
        format!("Latest block: #{}", snapshot.last_block_number)
            .bright_cyan()
            .bold()
    );
    print_blocks(&snapshot);
    print_transactions(&snapshot);

    Ok(())
}
