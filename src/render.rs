//! HTML rendering of a [`ChainSnapshot`]

use crate::explorer::{BlockSummary, ChainSnapshot, TransactionDetail};
use crate::format::{format_wei, short_hex};

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 2rem; color: #222; }
h1 { font-size: 1.4rem; }
table { border-collapse: collapse; margin-bottom: 2rem; }
th, td { border-bottom: 1px solid #ddd; padding: 0.35rem 0.8rem; text-align: left; }
th { background: #f4f4f4; }
code { font-family: "SFMono-Regular", Consolas, monospace; }
.notice { color: #a33; }
"#;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full explorer page: recent blocks, plus transactions of the selected block.
pub fn index_page(snapshot: &ChainSnapshot) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "<h1>Latest block: {}</h1>\n",
        escape_html(&snapshot.last_block_number.to_string())
    ));

    body.push_str("<h2>Recent blocks</h2>\n");
    if snapshot.blocks.is_empty() {
        body.push_str("<p class=\"notice\">No blocks could be retrieved.</p>\n");
    } else {
        body.push_str(
            "<table>\n<tr><th>Block</th><th>Time</th><th>Hash</th><th>Transactions</th><th>Miner</th></tr>\n",
        );
        for block in &snapshot.blocks {
            body.push_str(&block_row(block));
        }
        body.push_str("</table>\n");
    }

    if let Some(selected) = &snapshot.selected_block_number {
        body.push_str(&format!(
            "<h2>Transactions in block {}</h2>\n",
            escape_html(&selected.to_string())
        ));
        if let Some(err) = &snapshot.enrichment_error {
            body.push_str(&format!(
                "<p class=\"notice\">Transactions unavailable: {}</p>\n",
                escape_html(err)
            ));
        } else if snapshot.transactions.is_empty() {
            body.push_str("<p>This block contains no transactions.</p>\n");
        } else {
            body.push_str(
                "<table>\n<tr><th>Hash</th><th>To</th><th>Value (wei)</th><th>Value (ether)</th><th>Fee (wei)</th><th>Contract</th><th>Input</th></tr>\n",
            );
            for tx in &snapshot.transactions {
                body.push_str(&transaction_row(tx));
            }
            body.push_str("</table>\n");
        }
    }

    document("ChainView", &body)
}

/// Page shown when the chain view could not be built at all.
pub fn error_page(message: &str) -> String {
    let body = format!(
        "<h1>Unable to retrieve blockchain info</h1>\n<p class=\"notice\">{}</p>\n",
        escape_html(message)
    );
    document("ChainView - error", &body)
}

fn block_row(block: &BlockSummary) -> String {
    let number = block.number.to_string();
    format!(
        "<tr><td><a href=\"?blocknum={n}\">{n}</a></td><td>{time}</td><td><code title=\"{hash}\">{short_hash}</code></td><td>{count}</td><td><code title=\"{miner}\">{short_miner}</code></td></tr>\n",
        n = escape_html(&number),
        time = block.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        hash = escape_html(&block.hash),
        short_hash = escape_html(&short_hex(&block.hash)),
        count = block.transaction_count,
        miner = escape_html(&block.miner_address),
        short_miner = escape_html(&short_hex(&block.miner_address)),
    )
}

fn transaction_row(tx: &TransactionDetail) -> String {
    let to = match &tx.to_address {
        Some(addr) => format!("<code title=\"{}\">{}</code>", escape_html(addr), escape_html(&short_hex(addr))),
        None => "<em>contract creation</em>".to_string(),
    };
    let contract = match &tx.contract_address {
        Some(addr) => format!("<code title=\"{}\">{}</code>", escape_html(addr), escape_html(&short_hex(addr))),
        None => String::new(),
    };

    format!(
        "<tr><td><code title=\"{hash}\">{short_hash}</code></td><td>{to}</td><td>{value}</td><td>{ether}</td><td>{fee}</td><td>{contract}</td><td><code>{input}</code></td></tr>\n",
        hash = escape_html(&tx.hash),
        short_hash = escape_html(&short_hex(&tx.hash)),
        to = to,
        value = tx.value_wei,
        ether = format_wei(&tx.value_wei),
        fee = tx.fee_wei,
        contract = contract,
        input = escape_html(&short_hex(&tx.input_data)),
    )
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}
