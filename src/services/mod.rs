pub mod aggregator;
pub mod cache;
pub mod catalog;
pub mod classifier;
pub mod error;
pub mod http;
pub mod language;
pub mod metrics;
pub mod mirror;
pub mod normalizer;
pub mod providers;
pub mod query;
pub mod scorer;
