// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const TRADE_COLUMNS: [&str; 7] = ["id", "symbol", "side", "quantity", "price", "venue", "notes"];

const SYMBOLS: [&str; 12] = [
    "AAPL", "MSFT", "GOOG", "AMZN", "NVDA", "TSLA", "META", "ORCL", "INTC", "IBM", "SAP", "ASML",
];

const VENUES: [&str; 6] = ["XNAS", "XNYS", "BATS", "ARCA", "IEXG", "XLON"];

const NOTE_WORDS: [&str; 16] = [
    "block",
    "partial",
    "fill",
    "amended",
    "late",
    "report",
    "cross",
    "auction",
    "open",
    "close",
    "iceberg",
    "sweep",
    "retail",
    "desk",
    "hedge",
    "rebalance",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub id: u64,
    pub symbol: String,
    pub side: String,
    pub quantity: u32,
    pub price: f64,
    pub venue: String,
    pub notes: String,
}

impl Trade {
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.symbol.clone(),
            self.side.clone(),
            self.quantity.to_string(),
            format!("{:.2}", self.price),
            self.venue.clone(),
            self.notes.clone(),
        ]
    }

    /// Renders the trade as one delimited line, quoting any cell that
    /// contains the delimiter.
    pub fn to_line(&self, delimiter: char) -> String {
        self.cells()
            .into_iter()
            .map(|cell| {
                if cell.contains(delimiter) {
                    format!("\"{cell}\"")
                } else {
                    cell
                }
            })
            .collect::<Vec<_>>()
            .join(delimiter.to_string().as_str())
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

#[derive(Debug, Clone)]
pub struct TradeFaker {
    rng: DeterministicRng,
    next_id: u64,
}

impl TradeFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn trade(&mut self) -> Trade {
        let id = self.next_id;
        self.next_id += 1;

        let side = if self.rng.bool() { "BUY" } else { "SELL" };
        let quantity = (self.rng.int_n(100) as u32 + 1) * 100;
        let price = (self.rng.int_n(90_000) as f64 + 1_000.0) / 100.0;

        Trade {
            id,
            symbol: self.pick(&SYMBOLS).to_owned(),
            side: side.to_owned(),
            quantity,
            price,
            venue: self.pick(&VENUES).to_owned(),
            notes: self.notes(),
        }
    }

    pub fn trades(&mut self, count: usize) -> Vec<Trade> {
        (0..count).map(|_| self.trade()).collect()
    }

    /// Builds a complete delimited document: header line followed by
    /// `count` trade lines.
    pub fn document(&mut self, count: usize, delimiter: char) -> String {
        let mut out = TRADE_COLUMNS.join(delimiter.to_string().as_str());
        out.push('\n');
        for trade in self.trades(count) {
            out.push_str(&trade.to_line(delimiter));
            out.push('\n');
        }
        out
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    // Notes sometimes carry a comma so fixtures exercise the quoted path.
    fn notes(&mut self) -> String {
        let count = self.rng.int_n(3) + 1;
        let words = (0..count)
            .map(|_| self.pick(&NOTE_WORDS))
            .collect::<Vec<_>>();
        if count > 1 && self.rng.bool() {
            words.join(", ")
        } else {
            words.join(" ")
        }
    }
}

pub fn write_fixture(file_name: &str, contents: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join(file_name);
    std::fs::write(&path, contents).with_context(|| format!("write fixture {}", path.display()))?;
    Ok((dir, path))
}

/// The small mixed document used across crates: a quoted cell holding the
/// delimiter and a short row.
pub fn ragged_document() -> &'static str {
    "h1,h2,h3\na,b,c\n\"x,y\",z,w\np,q\n"
}
