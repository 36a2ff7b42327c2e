use std::path::{Path, PathBuf};

use crate::models::trade::AssetClass;

/// Where every persisted file lives. One instance per tracker; all
/// storage operations take their paths from here, so tests can point the
/// whole tracker at a temp directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    /// Equity weekly ledger (JSON array of entries).
    pub equity_entries: PathBuf,

    /// Crypto weekly ledger (JSON array of entries).
    pub crypto_entries: PathBuf,

    /// Equity holdings mirror (CSV: ticker,shares,avg_cost,currency).
    pub equity_holdings: PathBuf,

    /// Crypto holdings mirror (CSV: symbol,amount,avg_cost_base).
    pub crypto_holdings: PathBuf,

    /// Latest market price snapshot (JSON).
    pub price_snapshot: PathBuf,

    /// Benchmark reference data: index levels + savings APY (JSON).
    pub benchmark: PathBuf,

    /// Intraday valuation snapshots (JSON array, rolling window).
    pub intraday_snapshots: PathBuf,

    /// Week-completion snapshots (JSON array, rolling window).
    pub week_completions: PathBuf,
}

impl DataPaths {
    /// Standard file layout under a single data directory.
    pub fn under(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            equity_entries: dir.join("entries.json"),
            crypto_entries: dir.join("crypto_entries.json"),
            equity_holdings: dir.join("holdings.csv"),
            crypto_holdings: dir.join("crypto_holdings.csv"),
            price_snapshot: dir.join("prices.json"),
            benchmark: dir.join("benchmark.json"),
            intraday_snapshots: dir.join("intraday_snapshots.json"),
            week_completions: dir.join("week_completions.json"),
        }
    }

    /// Ledger file for an asset class.
    #[must_use]
    pub fn entries_for(&self, asset_class: AssetClass) -> &Path {
        match asset_class {
            AssetClass::Equity => &self.equity_entries,
            AssetClass::Crypto => &self.crypto_entries,
        }
    }

    /// Holdings mirror for an asset class.
    #[must_use]
    pub fn holdings_for(&self, asset_class: AssetClass) -> &Path {
        match asset_class {
            AssetClass::Equity => &self.equity_holdings,
            AssetClass::Crypto => &self.crypto_holdings,
        }
    }
}
