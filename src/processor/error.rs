//! Error types for the batch processor
//!
//! Domain errors use thiserror; user operation failures cross the handler
//! boundary as `anyhow::Error` and are captured per-request.

use thiserror::Error;

/// Fatal setup errors: the invocation itself is malformed
///
/// These abort the whole invocation before any request runs. They are the
/// only errors this crate surfaces to the host directly; everything else is
/// captured as a failed [`OperationResult`](super::message::OperationResult)
/// for the request that raised it.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The host supplied no entity-batch binding at all
    #[error("entity batch binding is missing from the invocation")]
    MissingBinding,

    /// The binding payload did not match the expected envelope shape
    #[error("entity batch binding is malformed: {0}")]
    InvalidBinding(String),

    /// The batch exceeds the configured length limit
    #[error("batch of {len} requests exceeds configured limit of {limit}")]
    BatchTooLarge {
        /// Number of requests in the rejected batch
        len: usize,
        /// Configured maximum
        limit: usize,
    },
}

/// Convenience result alias for invocation setup
pub type SetupResult<T> = std::result::Result<T, SetupError>;

/// Serialization codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    /// A value could not be encoded to wire text
    #[error("encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Wire text could not be decoded into the requested value
    #[error("decoding failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Convenience result alias for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Method-dispatch errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request carried no operation name
    #[error("request has no operation name to dispatch")]
    UndefinedOperation,

    /// The named operation is not a member of the dispatch target
    #[error("operation '{0}' not found on dispatch target")]
    OperationNotFound(String),
}

/// Convenience result alias for dispatch operations
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// Per-operation context errors
#[derive(Debug, Error)]
pub enum ContextError {
    /// `return_value` was called more than once for the same request
    #[error("a result has already been recorded for this operation")]
    AlreadyReturned,

    /// Codec failure while encoding a return value or signal input
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Convenience result alias for context operations
pub type ContextResult<T> = std::result::Result<T, ContextError>;
