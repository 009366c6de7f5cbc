//! Entity state accumulator: the single mutable record for one invocation
//!
//! One accumulator is created per invocation, seeded from the host-supplied
//! prior state, mutated in place across the whole batch, and handed back
//! whole at the end. Each operation observes exactly the state left by its
//! predecessor; nothing here is shared across threads.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::codec;
use super::error::CodecResult;
use super::message::{OperationResult, Signal};

/// Mutable invocation state: existence flag, state blob, and both ledgers
#[derive(Debug, Clone, Default)]
pub struct EntityStateAccumulator {
    /// Whether the entity currently has a materialized state
    pub exists: bool,

    /// The entity's current serialized state blob
    pub state: Option<String>,

    /// Per-request outcomes, in batch order
    pub results: Vec<OperationResult>,

    /// Outgoing signals, in emission order across the whole batch
    pub signals: Vec<Signal>,
}

impl EntityStateAccumulator {
    /// Seed an accumulator from the host-supplied prior snapshot
    pub fn seed(exists: bool, state: Option<String>) -> Self {
        Self {
            exists,
            state,
            results: Vec::new(),
            signals: Vec::new(),
        }
    }

    /// Decode and return the current state, or `None` when absent
    pub fn read_state<T: DeserializeOwned>(&self) -> CodecResult<Option<T>> {
        codec::decode(self.state.as_deref())
    }

    /// Decode the current state, falling back to `init` when absent
    ///
    /// The fallback value is returned but NOT written back; a later read
    /// without an intervening write observes "no state" again.
    pub fn read_state_or<T, F>(&self, init: F) -> CodecResult<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        Ok(self.read_state()?.unwrap_or_else(init))
    }

    /// Encode `value` as the new state and mark the entity as existing
    ///
    /// Visible to every subsequent operation in the same batch. Writes are
    /// immediate and never rolled back, even if the writing operation later
    /// fails.
    pub fn write_state<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        self.state = Some(codec::encode(value)?);
        self.exists = true;
        Ok(())
    }

    /// Mark the entity destroyed: clear state and existence
    ///
    /// Already-recorded results and signals are kept.
    pub fn destroy(&mut self) {
        self.exists = false;
        self.state = None;
    }

    /// Append a per-request outcome, preserving insertion order
    pub fn append_result(&mut self, result: OperationResult) {
        self.results.push(result);
    }

    /// Append an outgoing signal, preserving insertion order
    pub fn append_signal(&mut self, signal: Signal) {
        self.signals.push(signal);
    }
}
