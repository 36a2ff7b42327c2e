pub mod benchmark;
pub mod entry;
pub mod fill;
pub mod metrics;
pub mod position;
pub mod price;
pub mod snapshot;
pub mod trade;
