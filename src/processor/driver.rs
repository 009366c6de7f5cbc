//! Batch driver: sequential execution of one invocation's requests
//!
//! The driver validates the host binding, seeds the accumulator from the
//! prior snapshot, runs every request strictly in order against user logic,
//! normalizes whatever happened into exactly one result per request, and
//! hands the finished accumulator back as the invocation outcome.

use std::time::Instant;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ProcessorConfig;
use super::codec;
use super::context::OperationContext;
use super::error::{SetupError, SetupResult};
use super::message::{EntityId, OperationResult, RequestMessage, Signal};
use super::state::EntityStateAccumulator;

/// One invocation's input: identity, prior snapshot, and the request batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInvocation {
    /// Identity of the entity instance this batch targets
    #[serde(rename = "self")]
    pub entity_id: EntityId,

    /// Whether the entity had materialized state before this invocation
    #[serde(default)]
    pub exists: bool,

    /// Prior serialized state, absent for a never-constructed entity
    #[serde(default)]
    pub state: Option<String>,

    /// Ordered operation requests
    pub batch: Vec<RequestMessage>,
}

impl BatchInvocation {
    /// Parse the host's trigger binding into an invocation
    ///
    /// A missing binding or one that does not match the expected envelope is
    /// a fatal setup error: the invocation aborts with no partial ledger.
    pub fn from_binding(binding: Option<Value>) -> SetupResult<Self> {
        let value = binding.ok_or(SetupError::MissingBinding)?;
        serde_json::from_value(value).map_err(|e| SetupError::InvalidBinding(e.to_string()))
    }
}

/// One invocation's output, handed back to the host for persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Whether the entity exists after the batch
    pub entity_exists: bool,

    /// Final serialized state, absent when the entity does not exist
    pub entity_state: Option<String>,

    /// Per-request outcomes, one per input request, in input order
    pub results: Vec<OperationResult>,

    /// Outgoing signals in emission order
    pub signals: Vec<Signal>,
}

impl From<EntityStateAccumulator> for BatchOutcome {
    fn from(accumulator: EntityStateAccumulator) -> Self {
        Self {
            entity_exists: accumulator.exists,
            entity_state: accumulator.state,
            results: accumulator.results,
            signals: accumulator.signals,
        }
    }
}

/// User operation logic invoked once per request
///
/// Implementations typically match on
/// [`operation_name`](OperationContext::operation_name) or delegate the whole
/// request to [`dispatch`](OperationContext::dispatch). Returning `Err`
/// records a failure result for the current request only; the batch
/// continues.
pub trait EntityHandler: Send + Sync {
    /// Process one request through its context
    fn invoke<'c>(&self, ctx: &'c mut OperationContext<'_>) -> BoxFuture<'c, anyhow::Result<()>>;
}

/// Drives request batches against user operation logic
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    config: ProcessorConfig,
}

impl BatchProcessor {
    /// Create a processor with the given configuration
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    /// Process one invocation's batch, strictly in order
    ///
    /// Each request gets a fresh context over the shared accumulator; user
    /// logic runs to completion (including any suspension) before the next
    /// request starts. Whatever the logic did is normalized into exactly one
    /// [`OperationResult`]: an explicit return stands as recorded, completion
    /// without a return becomes an empty success, and a raised failure
    /// becomes an error result carrying the encoded error description. A
    /// failed request never aborts its siblings.
    ///
    /// The only fatal path is a setup error before the loop starts.
    pub async fn process(
        &self,
        invocation: BatchInvocation,
        handler: &dyn EntityHandler,
    ) -> SetupResult<BatchOutcome> {
        let BatchInvocation {
            entity_id,
            exists,
            state,
            batch,
        } = invocation;

        if let Some(limit) = self.config.max_batch_len {
            if batch.len() > limit {
                return Err(SetupError::BatchTooLarge {
                    len: batch.len(),
                    limit,
                });
            }
        }

        tracing::debug!(
            entity = %entity_id,
            requests = batch.len(),
            exists,
            "processing entity batch"
        );

        let mut accumulator = EntityStateAccumulator::seed(exists, state);

        for request in &batch {
            let started = Instant::now();
            let baseline = accumulator.results.len();

            let mut ctx = OperationContext::new(&entity_id, request, &mut accumulator, started);
            let outcome = handler.invoke(&mut ctx).await;
            let returned = ctx.has_returned();
            let elapsed = ctx.elapsed_ms();
            drop(ctx);
            match outcome {
                Ok(()) => {
                    // Completion without an explicit return is still a
                    // success: an empty result marks the request processed.
                    if !returned {
                        accumulator.append_result(OperationResult::success(elapsed, None));
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        entity = %entity_id,
                        operation = %request.name,
                        %error,
                        "operation failed; continuing batch"
                    );
                    // Exactly one result per request: a raised failure
                    // replaces anything the operation recorded before it.
                    accumulator.results.truncate(baseline);
                    let payload = codec::encode(&error.to_string()).ok();
                    accumulator.append_result(OperationResult::failure(elapsed, payload));
                }
            }
        }

        Ok(BatchOutcome::from(accumulator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Counter handler exercising every context path the driver normalizes.
    struct CounterHandler;

    impl EntityHandler for CounterHandler {
        fn invoke<'c>(
            &self,
            ctx: &'c mut OperationContext<'_>,
        ) -> BoxFuture<'c, anyhow::Result<()>> {
            Box::pin(async move {
                match ctx.operation_name() {
                    "add" => {
                        let amount: i64 = ctx
                            .get_input::<Vec<i64>>()?
                            .and_then(|args| args.first().copied())
                            .ok_or_else(|| anyhow::anyhow!("add requires an amount"))?;
                        let counter: i64 = ctx.get_state_or(|| 0)?;
                        let counter = counter + amount;
                        ctx.set_state(&counter)?;
                        ctx.return_value(&counter)?;
                        Ok(())
                    }
                    "touch" => {
                        // Completes without returning or raising.
                        Ok(())
                    }
                    "boom" => Err(anyhow::anyhow!("counter exploded")),
                    "return-then-boom" => {
                        ctx.return_value(&1)?;
                        Err(anyhow::anyhow!("failed after returning"))
                    }
                    "delete" => {
                        ctx.destroy();
                        Ok(())
                    }
                    "notify" => {
                        ctx.signal(EntityId::new("audit", "log"), "record");
                        Ok(())
                    }
                    other => Err(anyhow::anyhow!("unknown operation '{other}'")),
                }
            })
        }
    }

    fn invocation(batch: Vec<RequestMessage>) -> BatchInvocation {
        BatchInvocation {
            entity_id: EntityId::new("counter", "k"),
            exists: false,
            state: None,
            batch,
        }
    }

    fn req(name: &str, input: Option<&str>) -> RequestMessage {
        RequestMessage::new(name, input.map(str::to_string))
    }

    #[tokio::test]
    async fn test_explicit_return_records_payload() {
        let processor = BatchProcessor::default();
        let outcome = processor
            .process(invocation(vec![req("add", Some("[5]"))]), &CounterHandler)
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert!(!outcome.results[0].is_error);
        assert_eq!(outcome.results[0].payload.as_deref(), Some("5"));
        assert!(outcome.entity_exists);
        assert_eq!(outcome.entity_state.as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_implicit_success_has_empty_payload() {
        let processor = BatchProcessor::default();
        let outcome = processor
            .process(invocation(vec![req("touch", None)]), &CounterHandler)
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert!(!outcome.results[0].is_error);
        assert_eq!(outcome.results[0].payload, None);
        assert!(outcome.results[0].duration_ms < 60_000);
    }

    #[tokio::test]
    async fn test_failure_is_captured_and_batch_continues() {
        let processor = BatchProcessor::default();
        let outcome = processor
            .process(
                invocation(vec![req("boom", None), req("add", Some("[3]"))]),
                &CounterHandler,
            )
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results[0].is_error);
        assert_eq!(
            outcome.results[0].payload.as_deref(),
            Some("\"counter exploded\"")
        );
        assert!(!outcome.results[1].is_error);
        assert_eq!(outcome.entity_state.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_failure_after_return_yields_one_error_result() {
        let processor = BatchProcessor::default();
        let outcome = processor
            .process(
                invocation(vec![req("return-then-boom", None)]),
                &CounterHandler,
            )
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.results[0].is_error);
    }

    #[tokio::test]
    async fn test_state_flows_between_requests_in_order() {
        let processor = BatchProcessor::default();
        let outcome = processor
            .process(
                invocation(vec![
                    req("add", Some("[1]")),
                    req("add", Some("[2]")),
                    req("add", Some("[4]")),
                ]),
                &CounterHandler,
            )
            .await
            .unwrap();

        let payloads: Vec<_> = outcome
            .results
            .iter()
            .map(|r| r.payload.clone().unwrap())
            .collect();
        assert_eq!(payloads, vec!["1", "3", "7"]);
        assert_eq!(outcome.entity_state.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_destroy_then_later_write_reasserts_existence() {
        let processor = BatchProcessor::default();

        let outcome = processor
            .process(
                invocation(vec![req("add", Some("[1]")), req("delete", None)]),
                &CounterHandler,
            )
            .await
            .unwrap();
        assert!(!outcome.entity_exists);
        assert_eq!(outcome.entity_state, None);

        let outcome = processor
            .process(
                invocation(vec![
                    req("add", Some("[1]")),
                    req("delete", None),
                    req("add", Some("[2]")),
                ]),
                &CounterHandler,
            )
            .await
            .unwrap();
        assert!(outcome.entity_exists);
        assert_eq!(outcome.entity_state.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_signals_survive_across_requests() {
        let processor = BatchProcessor::default();
        let outcome = processor
            .process(
                invocation(vec![
                    req("notify", None),
                    req("boom", None),
                    req("notify", None),
                ]),
                &CounterHandler,
            )
            .await
            .unwrap();

        assert_eq!(outcome.signals.len(), 2);
        assert!(outcome.signals.iter().all(|s| s.operation_name == "record"));
    }

    #[tokio::test]
    async fn test_batch_limit_is_fatal() {
        let processor = BatchProcessor::new(ProcessorConfig {
            max_batch_len: Some(1),
        });
        let err = processor
            .process(
                invocation(vec![req("touch", None), req("touch", None)]),
                &CounterHandler,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::BatchTooLarge { len: 2, limit: 1 }));
    }

    #[test]
    fn test_missing_binding_is_fatal() {
        let err = BatchInvocation::from_binding(None).unwrap_err();
        assert!(matches!(err, SetupError::MissingBinding));
    }

    #[test]
    fn test_malformed_binding_is_fatal() {
        let err = BatchInvocation::from_binding(Some(json!({"self": "not-an-id"}))).unwrap_err();
        assert!(matches!(err, SetupError::InvalidBinding(_)));
    }

    #[test]
    fn test_binding_envelope_parses() {
        let binding = json!({
            "self": {"name": "counter", "key": "k"},
            "exists": true,
            "state": "5",
            "batch": [{"name": "add", "input": "[1]"}, {"name": "get"}]
        });

        let invocation = BatchInvocation::from_binding(Some(binding)).unwrap();
        assert_eq!(invocation.entity_id, EntityId::new("counter", "k"));
        assert!(invocation.exists);
        assert_eq!(invocation.batch.len(), 2);
        assert_eq!(invocation.batch[1].input, None);
    }
}
