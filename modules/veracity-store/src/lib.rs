pub mod migrate;
pub mod stats;
pub mod store;

pub use migrate::migrate;
pub use stats::{CachedStats, DashboardStats, StatsReader, TimeRange};
pub use store::{CorpusArticle, Store};
