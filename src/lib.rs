pub mod config;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod sqlite_pragma;
pub mod store;

pub use pipeline::{ChangePct, ChangeResult, HolderRecord, RankingPipeline, Report};
pub use providers::{HolderSource, ProviderChain};
pub use store::SnapshotStore;
