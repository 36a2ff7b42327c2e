pub mod entry_store;
pub mod fsutil;
pub mod holdings_store;
pub mod locks;
pub mod market_store;
pub mod paths;
pub mod snapshot_store;
