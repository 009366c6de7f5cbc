//! Per-operation context: the surface exposed to user operation logic
//!
//! One context is built per request, closing over the shared accumulator,
//! that request, and an explicit start instant. Through it an operation can
//! read its input, read and replace entity state, record its return value,
//! destroy the entity, signal other entities, or hand the whole request to
//! the typed dispatch helper.

use std::time::Instant;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::client::{CallDescriptor, EntityClient};
use super::codec;
use super::dispatch::{DispatchTarget, overlay_state, positional_args};
use super::error::{CodecResult, ContextError, ContextResult, DispatchError};
use super::message::{EntityId, OperationResult, RequestMessage, Signal};
use super::state::EntityStateAccumulator;

/// Execution context for one operation request
pub struct OperationContext<'inv> {
    entity_id: &'inv EntityId,
    request: &'inv RequestMessage,
    accumulator: &'inv mut EntityStateAccumulator,
    started: Instant,
    newly_constructed: bool,
    returned: bool,
}

impl<'inv> OperationContext<'inv> {
    /// Build the context for one request
    ///
    /// `started` is the request's start instant; elapsed time on the recorded
    /// result is measured from it.
    pub fn new(
        entity_id: &'inv EntityId,
        request: &'inv RequestMessage,
        accumulator: &'inv mut EntityStateAccumulator,
        started: Instant,
    ) -> Self {
        let newly_constructed = !accumulator.exists;
        Self {
            entity_id,
            request,
            accumulator,
            started,
            newly_constructed,
            returned: false,
        }
    }

    /// Name of the operation being processed
    pub fn operation_name(&self) -> &str {
        &self.request.name
    }

    /// Identity of the entity this batch targets
    pub fn entity_id(&self) -> &EntityId {
        self.entity_id
    }

    /// Whether the entity had no materialized state when this context was built
    pub fn is_newly_constructed(&self) -> bool {
        self.newly_constructed
    }

    /// Whether a result has been recorded for this request
    pub fn has_returned(&self) -> bool {
        self.returned
    }

    /// Decode this request's input, or `None` when absent
    pub fn get_input<T: DeserializeOwned>(&self) -> CodecResult<Option<T>> {
        codec::decode(self.request.input.as_deref())
    }

    /// Decode the current entity state, or `None` when absent
    pub fn get_state<T: DeserializeOwned>(&self) -> CodecResult<Option<T>> {
        self.accumulator.read_state()
    }

    /// Decode the current entity state, falling back to `init` when absent
    ///
    /// The fallback is returned without being persisted.
    pub fn get_state_or<T, F>(&self, init: F) -> CodecResult<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        self.accumulator.read_state_or(init)
    }

    /// Replace the entity state and mark the entity as existing
    ///
    /// The write is immediately visible to later operations in the batch and
    /// is not rolled back if this operation subsequently fails.
    pub fn set_state<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        self.accumulator.write_state(value)
    }

    /// Record this request's success result
    ///
    /// Encodes `value`, appends a success outcome with elapsed time measured
    /// from the context's start instant, and marks the entity as existing.
    /// At most one result may be recorded per request; a second call fails
    /// with [`ContextError::AlreadyReturned`].
    pub fn return_value<T: Serialize + ?Sized>(&mut self, value: &T) -> ContextResult<()> {
        if self.returned {
            return Err(ContextError::AlreadyReturned);
        }

        let payload = codec::encode(value)?;
        let duration_ms = self.elapsed_ms();
        self.accumulator
            .append_result(OperationResult::success(duration_ms, Some(payload)));
        self.accumulator.exists = true;
        self.returned = true;
        Ok(())
    }

    /// Destroy the entity: clear its state and existence flag
    ///
    /// Later operations in the batch observe a non-existent entity unless one
    /// of them writes state or returns a value again.
    pub fn destroy(&mut self) {
        self.accumulator.destroy();
    }

    /// Signal another entity with no input
    pub fn signal(&mut self, target: EntityId, operation: impl Into<String>) {
        self.accumulator.append_signal(Signal {
            target,
            operation_name: operation.into(),
            input: None,
        });
    }

    /// Signal another entity with an encoded input value
    pub fn signal_with<T: Serialize + ?Sized>(
        &mut self,
        target: EntityId,
        operation: impl Into<String>,
        input: &T,
    ) -> CodecResult<()> {
        let input = codec::encode(input)?;
        self.accumulator.append_signal(Signal {
            target,
            operation_name: operation.into(),
            input: Some(input),
        });
        Ok(())
    }

    /// Signal another entity from a captured call descriptor
    pub fn signal_call(&mut self, target: EntityId, call: CallDescriptor) -> CodecResult<()> {
        let input = call.encode_input()?;
        self.accumulator.append_signal(Signal {
            target,
            operation_name: call.operation,
            input,
        });
        Ok(())
    }

    /// Signal another entity through a typed client stub
    ///
    /// Builds a stub of type `C` and hands it to `build`; the descriptor the
    /// closure returns becomes the signal. Call sites read as ordinary method
    /// calls while only the intent is captured:
    ///
    /// ```ignore
    /// ctx.signal_to::<CounterClient>(target, |counter| counter.add(5))?;
    /// ```
    pub fn signal_to<C, F>(&mut self, target: EntityId, build: F) -> CodecResult<()>
    where
        C: EntityClient,
        F: FnOnce(&C) -> CodecResult<CallDescriptor>,
    {
        let stub = C::default();
        let call = build(&stub)?;
        self.signal_call(target, call)
    }

    /// Route this request to a named operation on a typed entity object
    ///
    /// Builds a fresh target from `factory`, overlays the current state onto
    /// it, invokes the operation named by the request with the decoded
    /// positional arguments, persists the mutated target as the new state,
    /// and records the operation's return value when it produced one.
    ///
    /// Fails when the request has no operation name, when the name is not an
    /// operation of the target, or when decoding/invocation fails. Failures
    /// propagate to the batch driver's per-request normalization; nothing is
    /// caught here.
    pub async fn dispatch<T, F>(&mut self, factory: F) -> anyhow::Result<()>
    where
        T: DispatchTarget,
        F: FnOnce() -> T,
    {
        if self.request.name.is_empty() {
            return Err(DispatchError::UndefinedOperation.into());
        }

        // Dispatch defaults absent state to an empty record so the overlay
        // always starts from the factory's field defaults.
        let state = self
            .accumulator
            .read_state::<Value>()?
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let mut target = overlay_state(factory(), &state)?;

        let args = positional_args(codec::decode_value(self.request.input.as_deref())?);
        let invocation = target
            .invoke(&self.request.name, args)
            .ok_or_else(|| DispatchError::OperationNotFound(self.request.name.clone()))?;
        let returned = invocation.await?;

        self.accumulator.write_state(&target)?;
        if let Some(value) = returned {
            self.return_value(&value)?;
        }
        Ok(())
    }

    /// Milliseconds elapsed since this request started
    pub(crate) fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
