//! The tick-source capability consumed by the quoting pipeline.

use crate::Tick;

/// A stream of top-of-book updates.
///
/// Both the live transport and the backtest generator implement this; the
/// pipeline is instantiated monomorphically over the concrete source, so
/// there is no dynamic dispatch on the hot path.
///
/// `next` returning `None` signals that the transport closed; the pipeline
/// treats that as normal termination.
#[allow(async_fn_in_trait)]
pub trait TickSource {
    /// Await the next tick. `None` means the source is exhausted or closed.
    async fn next(&mut self) -> Option<Tick>;

    /// Release the underlying transport. Idempotent.
    async fn close(&mut self);
}
