//! Interface to the downstream accumulation buffers.

/// Buffers holding partially accumulated aggregates.
///
/// The engine calls [`clear`](AggregationBuffers::clear) once per successful
/// rule reload, before the new rule set becomes visible to evaluators.
pub trait AggregationBuffers: Send + Sync {
    fn clear(&self);
}

/// Buffers that hold nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBuffers;

impl AggregationBuffers for NoBuffers {
    fn clear(&self) {}
}

impl<F> AggregationBuffers for F
where
    F: Fn() + Send + Sync,
{
    fn clear(&self) {
        (self)()
    }
}
