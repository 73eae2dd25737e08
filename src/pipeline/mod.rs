//! # Holder ranking pipeline
//!
//! Tracks the largest holders of a native balance and detects large swings
//! between successive checks.
//!
//! ## Architecture
//!
//! ```text
//! ProviderChain (primary → fallback)
//!     ↓ Vec<RawHolder>
//! RankingPipeline (normalize, sort, top N, rank)
//!     ↓ Vec<HolderRecord>                ↑ previous Snapshot
//! ChangeEngine ───────────────────── SnapshotStore
//!     ↓ Vec<ChangeResult>
//! report::render_report (chunked text)
//! ```
//!
//! ## Module Organization
//!
//! - `types` - Core data structures (HolderRecord, ChangeResult, Snapshot)
//! - `engine` - Change detection, pure
//! - `ranking` - Orchestration, fallback and persistence policy
//! - `config` - Environment configuration

pub mod config;
pub mod engine;
pub mod ranking;
pub mod types;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use engine::{compute_changes, ChangeEngine};
pub use ranking::{Persistence, RankingPipeline, Report};
pub use types::{ChangePct, ChangeResult, HolderRecord, RawHolder, Snapshot};
