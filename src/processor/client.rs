//! Typed signaling: call descriptors and entity client stubs
//!
//! Signals can be built two ways: by naming the operation and input
//! explicitly, or through a client stub whose methods mirror the target
//! entity's operations. Stub methods do not execute anything; each one
//! returns a [`CallDescriptor`] capturing the operation name and arguments,
//! which the per-operation context turns into a signal. The
//! [`entity_client!`](crate::entity_client) macro generates stubs for an
//! arbitrary method surface.

use serde::Serialize;
use serde_json::Value;

use super::error::{CodecError, CodecResult};

/// A captured call intent: operation name plus positional arguments
///
/// This is the explicit counterpart of a recorded dynamic method call: it
/// describes "invoke operation X with arguments Y" without a live object.
#[derive(Debug, Clone, PartialEq)]
pub struct CallDescriptor {
    /// Operation to invoke on the target entity
    pub operation: String,
    /// Positional arguments, as dynamic values
    pub args: Vec<Value>,
}

impl CallDescriptor {
    /// Start a descriptor for the named operation, with no arguments yet
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            args: Vec::new(),
        }
    }

    /// Append one positional argument
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> CodecResult<Self> {
        self.args
            .push(serde_json::to_value(value).map_err(CodecError::Encode)?);
        Ok(self)
    }

    /// Serialize the captured arguments as the signal's input text
    ///
    /// A call with no arguments produces no input at all, matching a request
    /// whose input is absent.
    pub fn encode_input(&self) -> CodecResult<Option<String>> {
        if self.args.is_empty() {
            return Ok(None);
        }
        super::codec::encode(&self.args).map(Some)
    }
}

/// Marker trait for generated entity client stubs
///
/// Stubs are zero-sized and constructible via `Default`, so
/// [`OperationContext::signal_to`](super::context::OperationContext::signal_to)
/// can build one and hand it to a caller-supplied closure.
pub trait EntityClient: Default {}

/// Generate a client stub type for an entity's operation surface
///
/// Each listed method becomes a stub method returning a [`CallDescriptor`]
/// that captures the operation name and arguments. Example:
///
/// ```
/// use operon::entity_client;
///
/// entity_client! {
///     /// Stub for the counter entity.
///     pub struct CounterClient {
///         fn add(amount: i64);
///         fn reset();
///     }
/// }
///
/// let call = CounterClient.add(5).unwrap();
/// assert_eq!(call.operation, "add");
/// ```
#[macro_export]
macro_rules! entity_client {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$method_meta:meta])*
                fn $op:ident($($arg:ident : $ty:ty),* $(,)?);
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $name {
            $(
                $(#[$method_meta])*
                #[allow(unused_mut)]
                pub fn $op(
                    &self,
                    $($arg: $ty),*
                ) -> ::std::result::Result<
                    $crate::processor::client::CallDescriptor,
                    $crate::processor::error::CodecError,
                > {
                    let mut call =
                        $crate::processor::client::CallDescriptor::new(stringify!($op));
                    $(call = call.arg(&$arg)?;)*
                    Ok(call)
                }
            )*
        }

        impl $crate::processor::client::EntityClient for $name {}
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    entity_client! {
        /// Stub used by the tests below.
        struct CounterClient {
            fn add(amount: i64);
            fn rename(label: String, keep_history: bool);
            fn reset();
        }
    }

    #[test]
    fn test_stub_captures_name_and_args() {
        let call = CounterClient.add(5).unwrap();
        assert_eq!(call.operation, "add");
        assert_eq!(call.args, vec![serde_json::json!(5)]);
    }

    #[test]
    fn test_stub_with_multiple_args() {
        let call = CounterClient.rename("hits".to_string(), true).unwrap();
        assert_eq!(call.operation, "rename");
        assert_eq!(call.encode_input().unwrap().unwrap(), r#"["hits",true]"#);
    }

    #[test]
    fn test_no_args_encodes_no_input() {
        let call = CounterClient.reset().unwrap();
        assert_eq!(call.encode_input().unwrap(), None);
    }

    #[test]
    fn test_descriptor_builder() {
        let call = CallDescriptor::new("merge")
            .arg(&[1, 2, 3])
            .unwrap()
            .arg("tag")
            .unwrap();
        assert_eq!(call.args.len(), 2);
    }
}
