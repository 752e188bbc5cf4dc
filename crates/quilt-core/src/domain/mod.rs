//! Domain model: tasks, fragments, merge instructions and the report.

pub mod change;
pub mod event;
pub mod fragment;
pub mod instruction;
pub mod report;
pub mod spec;
pub mod task;

pub use change::{ChangeKey, canonical_json};
pub use event::Event;
pub use fragment::{Detail, Fragment};
pub use instruction::{Comparisons, MergeInstruction, Parameters, StateUpdate};
pub use report::{Attempt, Report, StateRecord};
pub use spec::{JobSpec, TaskSpec};
pub use task::{Task, TaskId, TaskKind};
