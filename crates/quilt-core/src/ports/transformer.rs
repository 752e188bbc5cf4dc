//! Transformer port - Fragment を MergeInstruction に正規化する

use crate::domain::{Event, Fragment, MergeInstruction, Task};
use crate::error::ReportError;

/// Second step of every pipeline.
///
/// Receives the producer's output and returns the instruction the aggregator
/// folds. An absent or empty fragment must yield `Ok(None)`.
pub trait Transformer: Send + Sync {
    fn transform(
        &self,
        task: &Task,
        event: &Event,
        fragment: Option<Fragment>,
    ) -> Result<Option<MergeInstruction>, ReportError>;
}

impl<F> Transformer for F
where
    F: Fn(&Task, &Event, Option<Fragment>) -> Result<Option<MergeInstruction>, ReportError>
        + Send
        + Sync,
{
    fn transform(
        &self,
        task: &Task,
        event: &Event,
        fragment: Option<Fragment>,
    ) -> Result<Option<MergeInstruction>, ReportError> {
        self(task, event, fragment)
    }
}
