use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::CoreError;
use crate::models::position::Position;
use crate::models::trade::AssetClass;

use super::fsutil;

/// The CSV holdings mirror: a denormalized, overwritable view of the
/// positions the ledger replay would produce, kept for quick display and
/// advanced incrementally by the record-week flow.
///
/// Equity schema: `ticker,shares,avg_cost,currency`
/// Crypto schema: `symbol,amount,avg_cost_base`
/// (crypto costs are always in the base currency, so no currency column).
///
/// Every save backs the previous file up first, which is what makes
/// single-step undo possible.
pub struct HoldingsStore;

impl HoldingsStore {
    /// Load the mirror into a position map. Absent file → empty map.
    pub fn load(
        path: &Path,
        asset_class: AssetClass,
    ) -> Result<BTreeMap<String, Position>, CoreError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers = reader
            .headers()
            .map_err(|e| malformed(path, e.to_string()))?
            .clone();

        let required: &[&str] = match asset_class {
            AssetClass::Equity => &["ticker", "shares", "avg_cost", "currency"],
            AssetClass::Crypto => &["symbol", "amount", "avg_cost_base"],
        };
        let missing: Vec<&str> = required
            .iter()
            .filter(|col| !headers.iter().any(|h| h == **col))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(malformed(
                path,
                format!("holdings CSV missing columns: {missing:?}"),
            ));
        }

        let column = |name: &str| headers.iter().position(|h| h == name);
        let (id_idx, qty_idx, cost_idx, cur_idx) = match asset_class {
            AssetClass::Equity => (
                column("ticker"),
                column("shares"),
                column("avg_cost"),
                column("currency"),
            ),
            AssetClass::Crypto => (
                column("symbol"),
                column("amount"),
                column("avg_cost_base"),
                None,
            ),
        };

        let mut positions = BTreeMap::new();
        for record in reader.records() {
            let record = record.map_err(|e| malformed(path, e.to_string()))?;
            let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

            let instrument_id = field(id_idx).trim().to_uppercase();
            if instrument_id.is_empty() {
                continue;
            }
            let quantity = parse_decimal(path, field(qty_idx))?;
            let avg_cost = parse_decimal(path, field(cost_idx))?;
            let currency = match asset_class {
                AssetClass::Equity => field(cur_idx).trim().to_uppercase(),
                AssetClass::Crypto => crate::BASE_CURRENCY.to_string(),
            };

            positions.insert(
                instrument_id.clone(),
                Position {
                    instrument_id,
                    asset_class,
                    quantity,
                    avg_cost,
                    currency,
                },
            );
        }

        Ok(positions)
    }

    /// Back up the current mirror, then atomically rewrite it from the
    /// position map (rows sorted by instrument). Returns the backup path,
    /// if a previous file existed.
    pub fn save(
        path: &Path,
        positions: &BTreeMap<String, Position>,
        asset_class: AssetClass,
    ) -> Result<Option<PathBuf>, CoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        match asset_class {
            AssetClass::Equity => {
                writer.write_record(["ticker", "shares", "avg_cost", "currency"])?;
                for position in positions.values() {
                    writer.write_record([
                        position.instrument_id.as_str(),
                        &position.quantity.to_string(),
                        &position.avg_cost.to_string(),
                        position.currency.as_str(),
                    ])?;
                }
            }
            AssetClass::Crypto => {
                writer.write_record(["symbol", "amount", "avg_cost_base"])?;
                for position in positions.values() {
                    writer.write_record([
                        position.instrument_id.as_str(),
                        &position.quantity.to_string(),
                        &position.avg_cost.to_string(),
                    ])?;
                }
            }
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| CoreError::Serialization(e.to_string()))?;

        let backup = fsutil::backup_file(path)?;
        fsutil::atomic_write(path, &bytes)?;
        log::info!(
            "wrote {} holdings rows to {}",
            positions.len(),
            path.display()
        );
        Ok(backup)
    }

    /// Roll the mirror back to its most recent backup (undo support).
    pub fn restore_latest_backup(path: &Path) -> Result<(), CoreError> {
        fsutil::restore_latest_backup(path)
    }
}

fn malformed(path: &Path, reason: String) -> CoreError {
    CoreError::MalformedFile {
        path: path.display().to_string(),
        reason,
    }
}

fn parse_decimal(path: &Path, raw: &str) -> Result<Decimal, CoreError> {
    Decimal::from_str(raw.trim())
        .map_err(|e| malformed(path, format!("bad decimal '{raw}': {e}")))
}
