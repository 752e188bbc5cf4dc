//! FragmentProducer port - task + payload から Fragment を作る
//!
//! Producers are pure: they read the task and the event and either return a
//! fragment or nothing. They never see the report.

use crate::domain::{Event, Fragment, Task};
use crate::error::ReportError;

/// First step of every pipeline.
///
/// `Ok(None)` means "this task has nothing to report yet" and is not an
/// error. Closures with the same signature are producers too.
pub trait FragmentProducer: Send + Sync {
    fn produce(&self, task: &Task, event: &Event) -> Result<Option<Fragment>, ReportError>;
}

impl<F> FragmentProducer for F
where
    F: Fn(&Task, &Event) -> Result<Option<Fragment>, ReportError> + Send + Sync,
{
    fn produce(&self, task: &Task, event: &Event) -> Result<Option<Fragment>, ReportError> {
        self(task, event)
    }
}
