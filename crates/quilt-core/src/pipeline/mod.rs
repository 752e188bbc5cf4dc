//! Pipeline - producer → transformer の 2 段構成
//!
//! A pipeline is the whole per-family customization surface: one producer
//! followed by one transformer. The typed values between the steps replace a
//! shared scratch map; the producer's `Option<Fragment>` is moved straight
//! into the transformer.

pub mod registry;

pub use self::registry::{PipelineRegistry, RegistryError};

use std::sync::Arc;

use crate::domain::{Event, MergeInstruction, Task};
use crate::error::ReportError;
use crate::ports::{FragmentProducer, Transformer};

#[derive(Clone)]
pub struct Pipeline {
    producer: Arc<dyn FragmentProducer>,
    transformer: Arc<dyn Transformer>,
}

impl Pipeline {
    pub fn new(
        producer: impl FragmentProducer + 'static,
        transformer: impl Transformer + 'static,
    ) -> Self {
        Self {
            producer: Arc::new(producer),
            transformer: Arc::new(transformer),
        }
    }

    /// Run both steps for one task. `Ok(None)` means the task contributes
    /// nothing this time.
    pub fn run(&self, task: &Task, event: &Event) -> Result<Option<MergeInstruction>, ReportError> {
        let fragment = self.producer.produce(task, event)?;
        self.transformer.transform(task, event, fragment)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Fragment, StateUpdate};
    use serde_json::json;

    fn always_done(_: &Task, _: &Event) -> Result<Option<Fragment>, ReportError> {
        Ok(Some(Fragment::new().with("completed", true)))
    }

    fn to_state(
        task: &Task,
        _: &Event,
        fragment: Option<Fragment>,
    ) -> Result<Option<MergeInstruction>, ReportError> {
        let change = task.change()?.clone();
        Ok(fragment.map(|f| MergeInstruction::state(StateUpdate::new(change, "Custom").with_execution(f))))
    }

    #[test]
    fn producer_output_is_handed_to_transformer() {
        let pipeline = Pipeline::new(always_done, to_state);
        let task = Task::new("t1", "build", json!({"change": "A"}));

        let instruction = pipeline.run(&task, &Event::report()).unwrap().unwrap();
        let update = instruction.state.unwrap();
        assert_eq!(update.quest, "Custom");
        assert_eq!(update.add_execution, Some(Fragment::new().with("completed", true)));
    }
}
