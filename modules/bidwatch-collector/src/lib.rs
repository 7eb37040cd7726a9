pub mod collector;
pub mod dedup;
pub mod filter;
pub mod query;
pub mod sink;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use collector::Collector;
pub use stats::CollectStats;
