//! Entity identity, operation requests, results, and signals
//!
//! Defines the wire-facing records exchanged with the host: which entity the
//! batch targets, the requests in it, the per-request outcomes, and the
//! outgoing signals produced while processing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one entity instance: a name/key pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    /// Entity class name (shared by all instances of one behavior)
    pub name: String,
    /// Instance key within the class
    pub key: String,
}

impl EntityId {
    /// Create a new entity identity
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}@{}", self.name, self.key)
    }
}

/// One operation request within a batch
///
/// Batch order is significant and preserved end to end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMessage {
    /// Operation name to invoke
    pub name: String,
    /// Serialized operation input, absent when the caller sent none
    #[serde(default)]
    pub input: Option<String>,
}

impl RequestMessage {
    /// Create a request with a serialized input payload
    pub fn new(name: impl Into<String>, input: Option<String>) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }
}

/// Outcome record for one processed request
///
/// Created exactly once per request, in batch order, and never mutated after
/// creation. `payload` holds the serialized return value on success or the
/// serialized error description on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// Whether the operation failed
    pub is_error: bool,
    /// Wall-clock time the operation took, in milliseconds
    pub duration_ms: u64,
    /// Serialized return value or error description
    #[serde(default)]
    pub payload: Option<String>,
}

impl OperationResult {
    /// Build a success result
    pub fn success(duration_ms: u64, payload: Option<String>) -> Self {
        Self {
            is_error: false,
            duration_ms,
            payload,
        }
    }

    /// Build a failure result
    pub fn failure(duration_ms: u64, payload: Option<String>) -> Self {
        Self {
            is_error: true,
            duration_ms,
            payload,
        }
    }
}

/// Fire-and-forget message directed at another entity
///
/// This crate only produces signal intents; delivery belongs to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// Entity the signal is addressed to
    pub target: EntityId,
    /// Operation to invoke on the target
    pub operation_name: String,
    /// Serialized operation input, absent when none was given
    #[serde(default)]
    pub input: Option<String>,
}
