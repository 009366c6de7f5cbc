//! Operon – a batched stateful-entity operation processor
//!
//! This crate implements the core of an entity host:
//! - One invocation replays an ordered batch of operation requests against a
//!   single in-memory materialization of one entity's durable state
//! - Each request observes exactly the state left by its predecessor; a
//!   failed request is captured in its own result and never aborts siblings
//! - Operations can signal other entities; the crate produces signal intents
//!   and leaves delivery to the host
//! - A typed dispatch helper routes requests to named methods on plain
//!   structs whose serialized fields are the entity's state schema
//!
//! How the batch arrives, how the trigger is bound to a host, and how the
//! returned state, results, and signals are persisted are host concerns,
//! specified only at the [`BatchInvocation`]/[`BatchOutcome`] boundary.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Processor core modules implementing the entity batch model
pub mod processor;

// Re-export key types for convenience
pub use processor::ProcessorConfig;
pub use processor::client::{CallDescriptor, EntityClient};
pub use processor::context::OperationContext;
pub use processor::dispatch::DispatchTarget;
pub use processor::driver::{BatchInvocation, BatchOutcome, BatchProcessor, EntityHandler};
pub use processor::error::{CodecError, ContextError, DispatchError, SetupError};
pub use processor::message::{EntityId, OperationResult, RequestMessage, Signal};
pub use processor::state::EntityStateAccumulator;

/// Current version of the operon crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
