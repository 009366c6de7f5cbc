//! Method dispatch onto typed entity objects
//!
//! The dispatch helper lets user logic route a request to a named operation
//! on a plain struct instead of matching on operation names by hand. The
//! struct's serialized fields are the entity's state schema: current state is
//! overlaid onto a freshly built instance, the named operation runs against
//! it, and the mutated instance is persisted back.
//!
//! The driving algorithm lives in
//! [`OperationContext::dispatch`](super::context::OperationContext::dispatch);
//! this module holds the target trait and the overlay/argument rules.

use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{CodecError, CodecResult};

/// A typed entity object with named, invocable operations
///
/// `invoke` routes an operation name to the matching method. Returning `None`
/// means the name is not an operation of this target, which the dispatch
/// helper reports as a failed request. The future resolves to the operation's
/// return value: `Ok(Some(v))` records `v` as the request's result, while
/// `Ok(None)` leaves the implicit empty success in place.
pub trait DispatchTarget: Serialize + DeserializeOwned + Send {
    /// Route `operation` to the matching method, invoked with `args`
    fn invoke(
        &mut self,
        operation: &str,
        args: Vec<Value>,
    ) -> Option<BoxFuture<'_, anyhow::Result<Option<Value>>>>;
}

/// Overlay decoded state fields onto a freshly constructed target
///
/// Field rules: state values replace matching fields of the fresh instance,
/// state keys with no matching field are ignored, and fields absent from the
/// state keep their factory defaults. Targets that do not serialize to an
/// object (and non-object state blobs) are returned unchanged.
pub fn overlay_state<T>(fresh: T, state: &Value) -> CodecResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut base = serde_json::to_value(&fresh).map_err(CodecError::Encode)?;

    match (&mut base, state) {
        (Value::Object(fields), Value::Object(stored)) => {
            for (key, slot) in fields.iter_mut() {
                if let Some(value) = stored.get(key) {
                    *slot = value.clone();
                }
            }
        }
        _ => return Ok(fresh),
    }

    serde_json::from_value(base).map_err(CodecError::Decode)
}

/// Interpret a decoded request input as positional arguments
///
/// Absent input means no arguments; a JSON array supplies one argument per
/// element; any other value is passed through as a single argument.
pub fn positional_args(input: Option<Value>) -> Vec<Value> {
    match input {
        None => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    }
}
