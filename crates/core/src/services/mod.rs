pub mod applier;
pub mod benchmark;
pub mod fills;
pub mod irr;
pub mod ledger;
pub mod metrics;
