//! Batch processor core and public API
//!
//! One invocation of [`BatchProcessor::process`](driver::BatchProcessor::process)
//! replays an ordered batch of operation requests against a single in-memory
//! materialization of one entity's state and produces the per-request result
//! ledger, the final state snapshot, and the outgoing signal ledger.

use serde::{Deserialize, Serialize};

// Submodules
pub mod client;
pub mod codec;
pub mod context;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod message;
pub mod state;

/// Configuration for the batch processor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Upper bound on requests per invocation; unlimited when absent
    ///
    /// Exceeding the bound is a fatal setup error reported before any
    /// request runs.
    #[serde(default)]
    pub max_batch_len: Option<usize>,
}
