//! Multi-provider query fan-out.
//!
//! Completion, hover, and symbol requests gather results from several
//! independent provider strategies. [`gather`] issues all of them
//! concurrently against one immutable snapshot, collects the results as
//! they complete, and merges: the aggregate is the union of everything
//! that succeeded, flagged incomplete if any provider failed, reported
//! partial results, or the request was cancelled. One provider failing
//! never cancels or discards the others' results.
//!
//! Cancellation is cooperative: providers are expected to poll the token
//! at convenient points. Because readers never mutate the snapshot,
//! cancellation can never leave shared state partially updated.

use rayon::prelude::*;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::snapshot::DocumentSnapshot;

/// A provider-side failure. Carries only a message: a failing provider is
/// logged and skipped, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// What one provider produced.
#[derive(Debug, Clone)]
pub struct ProviderResult<T> {
    pub items: Vec<T>,
    /// The provider knows it did not produce everything it could (e.g. it
    /// truncated a candidate list).
    pub is_incomplete: bool,
}

impl<T> ProviderResult<T> {
    pub fn complete(items: Vec<T>) -> Self {
        Self {
            items,
            is_incomplete: false,
        }
    }

    pub fn incomplete(items: Vec<T>) -> Self {
        Self {
            items,
            is_incomplete: true,
        }
    }
}

/// One independent query strategy.
pub trait Provider<T>: Send + Sync {
    /// A stable name, used in logs.
    fn name(&self) -> &str;

    /// Produce results against an immutable snapshot. Long-running
    /// providers should poll `token` and bail out early when cancelled.
    fn provide(
        &self,
        snapshot: &DocumentSnapshot,
        token: &CancellationToken,
    ) -> Result<ProviderResult<T>, ProviderError>;
}

/// The merged outcome of a provider fan-out.
#[derive(Debug, Clone)]
pub struct Aggregate<T> {
    /// Union of all successful providers' items, in provider order.
    pub items: Vec<T>,
    /// Whether anything was missing: a provider failed, a provider
    /// reported partial results, or the request was cancelled.
    pub is_incomplete: bool,
}

/// Run all providers concurrently against one snapshot and merge the
/// results.
pub fn gather<T: Send>(
    providers: &[&dyn Provider<T>],
    snapshot: &DocumentSnapshot,
    token: &CancellationToken,
) -> Aggregate<T> {
    let outcomes: Vec<(&str, Option<Result<ProviderResult<T>, ProviderError>>)> = providers
        .par_iter()
        .map(|provider| {
            if token.is_cancelled() {
                return (provider.name(), None);
            }
            (provider.name(), Some(provider.provide(snapshot, token)))
        })
        .collect();

    let mut aggregate = Aggregate {
        items: Vec::new(),
        is_incomplete: token.is_cancelled(),
    };

    for (name, outcome) in outcomes {
        match outcome {
            Some(Ok(result)) => {
                aggregate.items.extend(result.items);
                aggregate.is_incomplete |= result.is_incomplete;
            }
            Some(Err(error)) => {
                warn!(provider = name, %error, "provider failed; continuing with the rest");
                aggregate.is_incomplete = true;
            }
            None => {
                aggregate.is_incomplete = true;
            }
        }
    }

    aggregate
}
