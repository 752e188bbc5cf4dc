//! Aggregator - MergeInstruction を report に畳み込む
//!
//! Owns the report while a job is being walked. Each instruction is checked
//! in full before anything is touched, then applied in a fixed order:
//!
//! 1. `state`: find-or-append the record for the change, find-or-append the
//!    quest column, install the execution, append values, merge comparisons
//! 2. `order_changes`: permute records into the declared order
//! 3. `set_parameters`: stamp the root fields
//!
//! Invariants:
//! - one record per change identity, in first-seen order until reordered
//! - quest columns are assigned once, globally, in first-seen order
//! - `states`, `keys` and `state_index` always describe the same records

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{
    ChangeKey, Comparisons, MergeInstruction, Parameters, Report, StateRecord, StateUpdate,
};
use crate::error::ReportError;
use crate::impls::CommitIdentity;
use crate::ports::ChangeIdentity;

/// Highest attempt ordinal accepted from an instruction.
pub const MAX_ATTEMPT_INDEX: usize = 1024;

pub struct Aggregator {
    identity: Arc<dyn ChangeIdentity>,

    comparison_mode: Option<String>,
    metric: Option<String>,

    /// Quest names in column order, plus the reverse lookup.
    quests: Vec<String>,
    quest_slots: HashMap<String, usize>,

    /// State records (arena) with their identity keys at the same positions.
    states: Vec<StateRecord>,
    keys: Vec<ChangeKey>,
    state_index: HashMap<ChangeKey, usize>,

    folded: usize,
}

/// What validation decided; applying it cannot fail.
struct FoldPlan {
    state_key: Option<ChangeKey>,
    /// Target position for each record, including a record the `state`
    /// step is about to append.
    order: Option<Vec<usize>>,
}

impl Aggregator {
    /// Aggregator keyed by commit identity.
    pub fn new() -> Self {
        Self::with_identity(Arc::new(CommitIdentity))
    }

    pub fn with_identity(identity: Arc<dyn ChangeIdentity>) -> Self {
        Self {
            identity,
            comparison_mode: None,
            metric: None,
            quests: Vec::new(),
            quest_slots: HashMap::new(),
            states: Vec::new(),
            keys: Vec::new(),
            state_index: HashMap::new(),
            folded: 0,
        }
    }

    /// Number of distinct changes seen so far.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Number of non-empty instructions folded so far.
    pub fn folded(&self) -> usize {
        self.folded
    }

    /// Fold one instruction. On error the report is left exactly as it was.
    pub fn apply(&mut self, instruction: MergeInstruction) -> Result<(), ReportError> {
        if instruction.is_empty() {
            return Ok(());
        }
        let plan = self.plan(&instruction)?;

        let MergeInstruction {
            state,
            order_changes: _,
            set_parameters,
        } = instruction;

        if let (Some(update), Some(key)) = (state, plan.state_key) {
            self.apply_state(update, key);
        }
        if let Some(order) = plan.order {
            self.reorder(&order);
        }
        if let Some(parameters) = set_parameters {
            self.stamp(parameters);
        }
        self.folded += 1;
        Ok(())
    }

    /// End of the walk: hand over the report.
    pub fn finish(self) -> Report {
        debug!(
            states = self.states.len(),
            quests = self.quests.len(),
            folded = self.folded,
            "report finished"
        );
        Report {
            comparison_mode: self.comparison_mode,
            metric: self.metric,
            quests: self.quests,
            state: self.states,
        }
    }

    fn plan(&self, instruction: &MergeInstruction) -> Result<FoldPlan, ReportError> {
        let state_key = match &instruction.state {
            Some(update) => Some(self.validate_state(update)?),
            None => None,
        };

        // Ordering is checked against the records as they will be once the
        // `state` step has run.
        let appended = state_key
            .as_ref()
            .filter(|key| !self.state_index.contains_key(*key));
        let order = match &instruction.order_changes {
            Some(changes) => Some(self.plan_order(changes, appended)?),
            None => None,
        };

        Ok(FoldPlan { state_key, order })
    }

    fn validate_state(&self, update: &StateUpdate) -> Result<ChangeKey, ReportError> {
        if update.quest.is_empty() {
            return Err(ReportError::MalformedInstruction(
                "state.quest must not be empty".to_string(),
            ));
        }
        // The index only grows `attempts` when an execution is installed.
        let installs = update.add_execution.as_ref().is_some_and(|f| !f.is_empty());
        if installs && update.index > MAX_ATTEMPT_INDEX {
            return Err(ReportError::MalformedInstruction(format!(
                "state.index {} exceeds {MAX_ATTEMPT_INDEX}",
                update.index
            )));
        }
        if let Some(bad) = update.append_result_values.iter().find(|v| !v.is_finite()) {
            return Err(ReportError::MalformedInstruction(format!(
                "state.append_result_values contains {bad}"
            )));
        }
        self.identity.key(&update.change)
    }

    fn plan_order(
        &self,
        changes: &[serde_json::Value],
        appended: Option<&ChangeKey>,
    ) -> Result<Vec<usize>, ReportError> {
        let existing = self.keys.len() + usize::from(appended.is_some());
        if changes.len() != existing {
            return Err(ReportError::OrderLengthMismatch {
                declared: changes.len(),
                existing,
            });
        }

        let mut positions: HashMap<ChangeKey, usize> = HashMap::with_capacity(changes.len());
        for (position, change) in changes.iter().enumerate() {
            match positions.entry(self.identity.key(change)?) {
                Entry::Occupied(e) => {
                    return Err(ReportError::DuplicateOrderedChange(e.key().to_string()));
                }
                Entry::Vacant(e) => {
                    e.insert(position);
                }
            }
        }

        // Distinct keys onto distinct positions of an equal-length list: a
        // permutation once every record is found.
        self.keys
            .iter()
            .chain(appended)
            .map(|key| {
                positions
                    .get(key)
                    .copied()
                    .ok_or_else(|| ReportError::UndeclaredChange(key.to_string()))
            })
            .collect()
    }

    fn apply_state(&mut self, update: StateUpdate, key: ChangeKey) {
        let StateUpdate {
            change,
            quest,
            index,
            add_execution,
            append_result_values,
            set_comparison,
        } = update;

        let position = match self.state_index.get(&key) {
            Some(&position) => position,
            None => {
                let position = self.states.len();
                debug!(change = %key, position, "new state record");
                self.states.push(StateRecord::new(change));
                self.keys.push(key.clone());
                self.state_index.insert(key.clone(), position);
                position
            }
        };
        let slot = self.quest_slot(quest);
        let state = &mut self.states[position];

        if let Some(fragment) = add_execution.filter(|f| !f.is_empty()) {
            state.record_execution(index, slot, fragment);
        }
        if !append_result_values.is_empty() {
            state.result_values.extend(append_result_values);
        }
        if let Some(patch) = set_comparison.filter(|c: &Comparisons| !c.is_empty()) {
            state.merge_comparison(&patch);
        }
        debug!(change = %key, slot, attempt = index, "folded state update");
    }

    fn quest_slot(&mut self, quest: String) -> usize {
        if let Some(&slot) = self.quest_slots.get(&quest) {
            return slot;
        }
        let slot = self.quests.len();
        debug!(quest = %quest, slot, "new quest column");
        self.quests.push(quest.clone());
        self.quest_slots.insert(quest, slot);
        slot
    }

    /// `order[i]` is the target position of the record currently at `i`.
    fn reorder(&mut self, order: &[usize]) {
        let mut slots: Vec<Option<(ChangeKey, StateRecord)>> =
            (0..order.len()).map(|_| None).collect();
        let records = self.keys.drain(..).zip(self.states.drain(..));
        for (&target, record) in order.iter().zip(records) {
            slots[target] = Some(record);
        }

        self.state_index.clear();
        for (position, (key, state)) in slots.into_iter().flatten().enumerate() {
            self.state_index.insert(key.clone(), position);
            self.keys.push(key);
            self.states.push(state);
        }
        info!(states = self.states.len(), "states reordered");
    }

    fn stamp(&mut self, parameters: Parameters) {
        info!(
            comparison_mode = parameters.comparison_mode.as_deref().unwrap_or("-"),
            metric = parameters.metric.as_deref().unwrap_or("-"),
            "report parameters set"
        );
        self.comparison_mode = parameters.comparison_mode;
        self.metric = parameters.metric;
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}
