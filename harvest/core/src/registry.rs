//! Action pool and ranked-type table.
//!
//! The pool is a fixed array of slots recycled by state: a new action takes
//! the first slot that is NULL, ABORTED or TRIED_AND_FAILED, falling back to
//! a COMPLETED one. Pending slots are never taken.
//!
//! Ranking orders every non-free action by a composite key (rarity of its
//! type, energy spent, desirability of its type, peak variability of its
//! type's measurements, age) and reduces the result to a table of distinct
//! types, followed by any desirable type that has no actions at all.

use std::fmt;
use std::sync::Arc;

use harvest_spec::{
    ActionState, ActionType, Clock, DataFlags, Desirability, Measurement, TimeUtc,
    VariabilityDamper, DESIRABILITY_DEFAULT, MAX_NUM_ACTION_TYPES, VARIABILITY_DAMPER_DEFAULT,
};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::RegistryError;
use crate::handle::{ActionId, DataId};
use crate::store::DataStore;

/// Default size of the action pool.
pub const MAX_NUM_ACTIONS: usize = 50;

/// Snapshot of one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Handle of the action.
    pub id: ActionId,
    /// What kind of work it is.
    pub action_type: ActionType,
    /// Where it is in its lifecycle.
    pub state: ActionState,
    /// When it completed or failed, zero until then.
    pub time_completed_utc: TimeUtc,
    /// Energy spent on it so far, nanowatt-hours.
    pub energy_cost_nwh: u64,
    /// Item it produced, if still linked.
    pub data: Option<DataId>,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} completed {} energy {} nWh",
            self.id, self.action_type, self.state, self.time_completed_utc, self.energy_cost_nwh
        )?;
        if let Some(data) = self.data {
            write!(f, " data {data}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    generation: u32,
    action_type: ActionType,
    state: ActionState,
    time_completed_utc: TimeUtc,
    energy_cost_nwh: u64,
}

impl Slot {
    fn id(&self, slot: usize) -> ActionId {
        ActionId {
            slot: slot as u32,
            generation: self.generation,
        }
    }
}

#[derive(Debug)]
struct RegistryState {
    slots: Vec<Slot>,
    desirability: [Desirability; MAX_NUM_ACTION_TYPES],
    damper: [VariabilityDamper; MAX_NUM_ACTION_TYPES],
    ranked: [ActionType; MAX_NUM_ACTION_TYPES],
    cursor: Option<usize>,
}

impl RegistryState {
    fn new(max_actions: usize) -> Self {
        let mut desirability = [DESIRABILITY_DEFAULT; MAX_NUM_ACTION_TYPES];
        desirability[ActionType::Null.index()] = 0;
        Self {
            slots: vec![Slot::default(); max_actions],
            desirability,
            damper: [VARIABILITY_DAMPER_DEFAULT; MAX_NUM_ACTION_TYPES],
            ranked: [ActionType::Null; MAX_NUM_ACTION_TYPES],
            cursor: None,
        }
    }

    fn slot(&self, id: ActionId) -> Result<&Slot, RegistryError> {
        self.slots
            .get(id.slot())
            .filter(|s| s.generation == id.generation && s.state != ActionState::Null)
            .ok_or(RegistryError::StaleAction(id))
    }

    fn slot_mut(&mut self, id: ActionId) -> Result<&mut Slot, RegistryError> {
        self.slots
            .get_mut(id.slot())
            .filter(|s| s.generation == id.generation && s.state != ActionState::Null)
            .ok_or(RegistryError::StaleAction(id))
    }

    fn ranked_len(&self) -> usize {
        self.ranked
            .iter()
            .position(|t| t.is_null())
            .unwrap_or(self.ranked.len())
    }

    fn next_type(&mut self) -> ActionType {
        let Some(pos) = self.cursor else {
            return ActionType::Null;
        };
        match self.ranked.get(pos).copied() {
            Some(action_type) if !action_type.is_null() => {
                self.cursor = Some(pos + 1);
                action_type
            }
            _ => {
                self.cursor = None;
                ActionType::Null
            }
        }
    }

    fn first_type(&mut self) -> ActionType {
        self.cursor = Some(0);
        self.next_type()
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    action_type: ActionType,
    energy_cost_nwh: u64,
    time_completed_utc: TimeUtc,
}

/// The action pool plus the ranking derived from it.
pub struct ActionRegistry {
    state: Mutex<RegistryState>,
    store: Arc<DataStore>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ActionRegistry")
            .field("pool", &state.slots.len())
            .field("ranked", &&state.ranked[..state.ranked_len()])
            .finish()
    }
}

impl ActionRegistry {
    /// Registry with a pool of [`MAX_NUM_ACTIONS`] slots.
    pub fn new(store: Arc<DataStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_capacity(MAX_NUM_ACTIONS, store, clock)
    }

    /// Registry with a pool of `max_actions` slots.
    pub fn with_capacity(
        max_actions: usize,
        store: Arc<DataStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: Mutex::new(RegistryState::new(max_actions)),
            store,
            clock,
        }
    }

    /// The store this registry records into.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    /// Reset the pool, the ranked table and the per-type tables.
    ///
    /// Items still linked from a slot being reset are freed; handles to the
    /// old actions stop resolving.
    pub fn init(&self) {
        let mut state = self.state.lock();
        let mut freed = 0usize;
        for (index, slot) in state.slots.iter_mut().enumerate() {
            let mut data = self.store.data_of(slot.id(index));
            if self.store.free(&mut data) {
                freed += 1;
            }
            *slot = Slot {
                generation: slot.generation.wrapping_add(1),
                ..Slot::default()
            };
        }
        let pool = state.slots.len();
        let slots = std::mem::take(&mut state.slots);
        *state = RegistryState::new(pool);
        state.slots = slots;
        debug!(pool, freed, "action registry initialised");
    }

    /// Set the weight of a type. False for NULL.
    pub fn set_desirability(&self, action_type: ActionType, desirability: Desirability) -> bool {
        if action_type.is_null() {
            return false;
        }
        self.state.lock().desirability[action_type.index()] = desirability;
        true
    }

    /// Weight of a type; NULL always weighs 0.
    pub fn get_desirability(&self, action_type: ActionType) -> Desirability {
        self.state.lock().desirability[action_type.index()]
    }

    /// Set the variability divisor of a type. False for NULL or a zero divisor.
    pub fn set_variability_damper(
        &self,
        action_type: ActionType,
        damper: VariabilityDamper,
    ) -> bool {
        if action_type.is_null() || damper == 0 {
            return false;
        }
        self.state.lock().damper[action_type.index()] = damper;
        true
    }

    /// Variability divisor of a type.
    pub fn get_variability_damper(&self, action_type: ActionType) -> VariabilityDamper {
        self.state.lock().damper[action_type.index()]
    }

    /// Create a REQUESTED action in a recycled slot.
    ///
    /// `None` for NULL or when every slot is pending.
    pub fn add(&self, action_type: ActionType) -> Option<ActionId> {
        if action_type.is_null() {
            return None;
        }
        let mut state = self.state.lock();
        let index = state
            .slots
            .iter()
            .position(|s| s.state.is_free())
            .or_else(|| {
                state
                    .slots
                    .iter()
                    .position(|s| s.state == ActionState::Completed)
            });
        let Some(index) = index else {
            warn!(%action_type, "action pool exhausted");
            return None;
        };
        let slot = &mut state.slots[index];
        self.store.detach(slot.id(index));
        *slot = Slot {
            generation: slot.generation.wrapping_add(1),
            action_type,
            state: ActionState::Requested,
            ..Slot::default()
        };
        let id = slot.id(index);
        debug!(%id, %action_type, "action added");
        Some(id)
    }

    fn transition(&self, id: ActionId, to: ActionState, stamp: bool) -> Result<(), RegistryError> {
        let mut state = self.state.lock();
        let slot = state.slot_mut(id)?;
        slot.state = to;
        if stamp {
            slot.time_completed_utc = self.clock.now_utc();
        }
        trace!(%id, state = %to, "action transition");
        Ok(())
    }

    /// Mark an action as being performed.
    pub fn set_in_progress(&self, id: ActionId) -> Result<(), RegistryError> {
        self.transition(id, ActionState::InProgress, false)
    }

    /// Mark an action as done, stamping the completion time.
    pub fn complete(&self, id: ActionId) -> Result<(), RegistryError> {
        self.transition(id, ActionState::Completed, true)
    }

    /// Mark an action as run but unsuccessful, stamping the completion time.
    pub fn tried_and_failed(&self, id: ActionId) -> Result<(), RegistryError> {
        self.transition(id, ActionState::TriedAndFailed, true)
    }

    /// Mark an action as cancelled.
    pub fn abort(&self, id: ActionId) -> Result<(), RegistryError> {
        self.transition(id, ActionState::Aborted, false)
    }

    /// Return an action's slot to NULL. Its item, if any, is left alone.
    pub fn remove(&self, id: ActionId) -> Result<(), RegistryError> {
        self.transition(id, ActionState::Null, false)
    }

    /// Whether the action ran to an end, successfully or not.
    pub fn has_run(&self, id: ActionId) -> Result<bool, RegistryError> {
        Ok(self.state.lock().slot(id)?.state.has_run())
    }

    /// Add to the energy an action has consumed.
    pub fn add_energy_cost(&self, id: ActionId, nwh: u64) -> Result<(), RegistryError> {
        let mut state = self.state.lock();
        let slot = state.slot_mut(id)?;
        slot.energy_cost_nwh = slot.energy_cost_nwh.saturating_add(nwh);
        Ok(())
    }

    /// Override the completion time of an action.
    pub fn set_time_completed(&self, id: ActionId, time_utc: TimeUtc) -> Result<(), RegistryError> {
        self.state.lock().slot_mut(id)?.time_completed_utc = time_utc;
        Ok(())
    }

    /// Store a measurement produced by an action and link it to the action.
    ///
    /// `Ok(None)` when the arena is full.
    pub fn record(
        &self,
        id: ActionId,
        flags: DataFlags,
        measurement: &Measurement,
    ) -> Result<Option<DataId>, RegistryError> {
        let state = self.state.lock();
        state.slot(id)?;
        Ok(self.store.allocate(Some(id), flags, measurement)?)
    }

    /// Item linked to an action.
    pub fn data_of(&self, id: ActionId) -> Result<Option<DataId>, RegistryError> {
        let state = self.state.lock();
        state.slot(id)?;
        Ok(self.store.data_of(id))
    }

    /// Snapshot of one action.
    pub fn get(&self, id: ActionId) -> Option<Action> {
        let state = self.state.lock();
        let slot = state.slot(id).ok()?;
        Some(self.snapshot(id, slot))
    }

    /// Snapshots of every non-NULL action in slot order.
    pub fn actions(&self) -> Vec<Action> {
        let state = self.state.lock();
        state
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.state != ActionState::Null)
            .map(|(index, s)| self.snapshot(s.id(index), s))
            .collect()
    }

    fn snapshot(&self, id: ActionId, slot: &Slot) -> Action {
        Action {
            id,
            action_type: slot.action_type,
            state: slot.state,
            time_completed_utc: slot.time_completed_utc,
            energy_cost_nwh: slot.energy_cost_nwh,
            data: self.store.data_of(id),
        }
    }

    /// Number of REQUESTED or IN_PROGRESS actions.
    pub fn count(&self) -> usize {
        self.state
            .lock()
            .slots
            .iter()
            .filter(|s| s.state.is_pending())
            .count()
    }

    /// Mean energy of the finished actions of one type, 0 when there are none.
    pub fn average_energy(&self, action_type: ActionType) -> u64 {
        let state = self.state.lock();
        let (total, n) = state
            .slots
            .iter()
            .filter(|s| s.action_type == action_type && s.state.has_run())
            .fold((0u128, 0u128), |(total, n), s| {
                (total + u128::from(s.energy_cost_nwh), n + 1)
            });
        if n == 0 {
            0
        } else {
            (total / n) as u64
        }
    }

    /// Recompute the ranked table and return its first type (NULL if empty).
    pub fn rank_types(&self) -> ActionType {
        let mut state = self.state.lock();
        let table = self.rank(&state);
        state.ranked = table;
        debug!(ranked = ?&state.ranked[..state.ranked_len()], "action types ranked");
        state.first_type()
    }

    /// Next type of the current ranking; NULL once exhausted.
    pub fn rank_next_type(&self) -> ActionType {
        self.state.lock().next_type()
    }

    /// Rewind to the start of the current ranking and return its first type.
    pub fn rank_first_type(&self) -> ActionType {
        self.state.lock().first_type()
    }

    /// Move a ranked type to `index`, clamped to the last ranked position.
    /// Absent types leave the table unchanged. Rewinds and returns the first type.
    pub fn rank_move_type(&self, action_type: ActionType, index: usize) -> ActionType {
        let mut state = self.state.lock();
        let len = state.ranked_len();
        let from = state.ranked[..len].iter().position(|t| *t == action_type);
        if let Some(from) = from {
            let to = index.min(len - 1);
            if from < to {
                state.ranked[from..=to].rotate_left(1);
            } else {
                state.ranked[to..=from].rotate_right(1);
            }
        }
        state.first_type()
    }

    /// Remove a type from the ranked table, closing the gap.
    /// Rewinds and returns the first type.
    pub fn rank_del_type(&self, action_type: ActionType) -> ActionType {
        let mut state = self.state.lock();
        let len = state.ranked_len();
        if let Some(at) = state.ranked[..len].iter().position(|t| *t == action_type) {
            state.ranked[at..len].rotate_left(1);
            state.ranked[len - 1] = ActionType::Null;
        }
        state.first_type()
    }

    /// Snapshot of the ranked table up to its NULL terminator.
    pub fn ranked_types(&self) -> Vec<ActionType> {
        let state = self.state.lock();
        state.ranked[..state.ranked_len()].to_vec()
    }

    /// Emit every non-NULL action at DEBUG.
    pub fn log_actions(&self) {
        let actions = self.actions();
        debug!(count = actions.len(), "action list");
        for action in &actions {
            debug!("{action}");
        }
    }

    /// Emit the ranked table at DEBUG.
    pub fn log_ranked_types(&self) {
        let state = self.state.lock();
        let len = state.ranked_len();
        debug!(count = len, "ranked action types");
        for (position, action_type) in state.ranked[..len].iter().enumerate() {
            debug!(
                position,
                %action_type,
                desirability = state.desirability[action_type.index()],
                "ranked"
            );
        }
    }

    // Runs with the registry lock held; every store call below takes the
    // store lock after it.
    fn rank(&self, state: &RegistryState) -> [ActionType; MAX_NUM_ACTION_TYPES] {
        let mut occurrence = [0u32; MAX_NUM_ACTION_TYPES];
        let mut peak = [0u64; MAX_NUM_ACTION_TYPES];
        let mut last: [Option<DataId>; MAX_NUM_ACTION_TYPES] = [None; MAX_NUM_ACTION_TYPES];
        let mut candidates = Vec::with_capacity(state.slots.len());

        for (index, slot) in state.slots.iter().enumerate() {
            if !slot.state.is_ranked() {
                continue;
            }
            let t = slot.action_type.index();
            occurrence[t] += 1;
            if let Some(data) = self.store.data_of(slot.id(index)) {
                if let Some(previous) = last[t] {
                    match self.store.difference(previous, data) {
                        Ok(delta) => {
                            let damper = u64::from(state.damper[t].max(1));
                            peak[t] = peak[t].max(delta.unsigned_abs() / damper);
                        }
                        Err(err) => trace!(
                            action_type = %slot.action_type,
                            error = %err,
                            "variability skipped"
                        ),
                    }
                }
                last[t] = Some(data);
            }
            candidates.push(Candidate {
                action_type: slot.action_type,
                energy_cost_nwh: slot.energy_cost_nwh,
                time_completed_utc: slot.time_completed_utc,
            });
        }

        let desirability = &state.desirability;
        candidates.sort_by(|a, b| {
            let (ta, tb) = (a.action_type.index(), b.action_type.index());
            occurrence[ta]
                .cmp(&occurrence[tb])
                .then(a.energy_cost_nwh.cmp(&b.energy_cost_nwh))
                .then(desirability[tb].cmp(&desirability[ta]))
                .then(peak[tb].cmp(&peak[ta]))
                .then(a.time_completed_utc.cmp(&b.time_completed_utc))
        });
        for candidate in &candidates {
            let t = candidate.action_type.index();
            trace!(
                action_type = %candidate.action_type,
                occurrence = occurrence[t],
                energy = candidate.energy_cost_nwh,
                desirability = desirability[t],
                variability = peak[t],
                time = candidate.time_completed_utc,
                "candidate"
            );
        }

        let mut table = [ActionType::Null; MAX_NUM_ACTION_TYPES];
        let mut len = 0;
        let mut push = |table: &mut [ActionType; MAX_NUM_ACTION_TYPES], t: ActionType| {
            if len < table.len() && !t.is_null() && !table[..len].contains(&t) {
                table[len] = t;
                len += 1;
            }
        };
        for candidate in &candidates {
            if desirability[candidate.action_type.index()] > 0 {
                push(&mut table, candidate.action_type);
            }
        }
        let mut unused: Vec<ActionType> = ActionType::schedulable()
            .filter(|t| desirability[t.index()] > 0 && occurrence[t.index()] == 0)
            .collect();
        unused.sort_by(|a, b| desirability[b.index()].cmp(&desirability[a.index()]));
        for t in unused {
            push(&mut table, t);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_spec::{Humidity, ManualClock};

    fn registry(pool: usize) -> (ActionRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(500));
        let store = Arc::new(DataStore::with_buffer(vec![0; 4096], clock.clone()));
        (ActionRegistry::with_capacity(pool, store, clock.clone()), clock)
    }

    fn drain(registry: &ActionRegistry, first: ActionType) -> Vec<ActionType> {
        std::iter::successors(Some(first), |_| Some(registry.rank_next_type()))
            .take_while(|t| !t.is_null())
            .collect()
    }

    #[test]
    fn null_is_never_added() {
        let (registry, _) = registry(4);
        assert_eq!(registry.add(ActionType::Null), None);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn pending_slots_are_never_recycled() {
        let (registry, _) = registry(2);
        let a = registry.add(ActionType::Report).unwrap();
        let b = registry.add(ActionType::MeasureLight).unwrap();
        registry.set_in_progress(b).unwrap();
        assert_eq!(registry.add(ActionType::MeasureLight), None);
        registry.complete(a).unwrap();
        let c = registry.add(ActionType::MeasureBle).unwrap();
        assert_eq!(c.slot(), a.slot());
        assert_ne!(c, a);
        assert!(matches!(
            registry.complete(a),
            Err(RegistryError::StaleAction(_))
        ));
    }

    #[test]
    fn free_states_are_preferred_over_completed() {
        let (registry, _) = registry(3);
        let a = registry.add(ActionType::Report).unwrap();
        let b = registry.add(ActionType::Report).unwrap();
        let c = registry.add(ActionType::Report).unwrap();
        registry.complete(a).unwrap();
        registry.abort(c).unwrap();
        assert_eq!(registry.add(ActionType::Report).unwrap().slot(), c.slot());
        registry.tried_and_failed(b).unwrap();
        assert_eq!(registry.add(ActionType::Report).unwrap().slot(), b.slot());
        assert_eq!(registry.add(ActionType::Report).unwrap().slot(), a.slot());
        assert_eq!(registry.add(ActionType::Report), None);
    }

    #[test]
    fn completion_is_stamped_from_the_clock() {
        let (registry, clock) = registry(2);
        let a = registry.add(ActionType::MeasureHumidity).unwrap();
        clock.set(9_000);
        registry.complete(a).unwrap();
        let action = registry.get(a).unwrap();
        assert_eq!(action.time_completed_utc, 9_000);
        assert!(registry.has_run(a).unwrap());
        registry.set_time_completed(a, 12).unwrap();
        assert_eq!(registry.get(a).unwrap().time_completed_utc, 12);
    }

    #[test]
    fn reuse_detaches_but_keeps_the_item() {
        let (registry, _) = registry(1);
        let a = registry.add(ActionType::MeasureHumidity).unwrap();
        let item = registry
            .record(
                a,
                DataFlags::NONE,
                &Measurement::Humidity(Humidity { percentage: 60 }),
            )
            .unwrap()
            .unwrap();
        assert_eq!(registry.get(a).unwrap().data, Some(item));
        registry.complete(a).unwrap();
        let b = registry.add(ActionType::MeasureHumidity).unwrap();
        assert_eq!(registry.data_of(b).unwrap(), None);
        let stored = registry.store().get(item).unwrap();
        assert_eq!(stored.owner, None);
    }

    #[test]
    fn remove_leaves_the_item_linked() {
        let (registry, _) = registry(1);
        let a = registry.add(ActionType::MeasureHumidity).unwrap();
        let item = registry
            .record(
                a,
                DataFlags::NONE,
                &Measurement::Humidity(Humidity { percentage: 1 }),
            )
            .unwrap();
        registry.remove(a).unwrap();
        assert!(registry.get(a).is_none());
        assert_eq!(registry.store().data_of(a), item);
    }

    #[test]
    fn init_frees_linked_items() {
        let (registry, _) = registry(2);
        let a = registry.add(ActionType::MeasureHumidity).unwrap();
        registry
            .record(
                a,
                DataFlags::NONE,
                &Measurement::Humidity(Humidity { percentage: 1 }),
            )
            .unwrap();
        registry
            .store()
            .allocate(None, DataFlags::NONE, &Measurement::Humidity(Humidity::default()))
            .unwrap();
        registry.set_desirability(ActionType::Report, 7);
        registry.init();
        assert_eq!(registry.store().count(), 1);
        assert!(registry.get(a).is_none());
        assert_eq!(registry.get_desirability(ActionType::Report), 1);
    }

    #[test]
    fn per_type_tables_reject_null_and_zero_damper() {
        let (registry, _) = registry(1);
        assert!(!registry.set_desirability(ActionType::Null, 3));
        assert!(!registry.set_variability_damper(ActionType::Null, 3));
        assert!(!registry.set_variability_damper(ActionType::Report, 0));
        assert!(registry.set_variability_damper(ActionType::Report, 4));
        assert_eq!(registry.get_variability_damper(ActionType::Report), 4);
        assert_eq!(registry.get_desirability(ActionType::Null), 0);
    }

    #[test]
    fn average_energy_counts_finished_actions_only() {
        let (registry, _) = registry(4);
        let a = registry.add(ActionType::Report).unwrap();
        let b = registry.add(ActionType::Report).unwrap();
        let c = registry.add(ActionType::Report).unwrap();
        registry.add_energy_cost(a, 100).unwrap();
        registry.add_energy_cost(b, 300).unwrap();
        registry.add_energy_cost(c, 10_000).unwrap();
        registry.complete(a).unwrap();
        registry.tried_and_failed(b).unwrap();
        assert_eq!(registry.average_energy(ActionType::Report), 200);
        assert_eq!(registry.average_energy(ActionType::MeasureBle), 0);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn empty_pool_ranks_by_desirability() {
        let (registry, _) = registry(4);
        registry.set_desirability(ActionType::MeasureLight, 9);
        registry.set_desirability(ActionType::MeasureBle, 5);
        registry.set_desirability(ActionType::Report, 0);
        let order = drain(&registry, registry.rank_types());
        assert_eq!(order[0], ActionType::MeasureLight);
        assert_eq!(order[1], ActionType::MeasureBle);
        assert_eq!(order[2], ActionType::GetTimeAndReport);
        assert!(!order.contains(&ActionType::Report));
        assert_eq!(order.len(), MAX_NUM_ACTION_TYPES - 2);
    }

    #[test]
    fn cursor_stays_exhausted_until_rewound() {
        let (registry, _) = registry(1);
        let first = registry.rank_types();
        let order = drain(&registry, first);
        assert_eq!(registry.rank_next_type(), ActionType::Null);
        assert_eq!(registry.rank_next_type(), ActionType::Null);
        assert_eq!(registry.rank_first_type(), order[0]);
    }

    #[test]
    fn move_and_delete_shift_neighbours() {
        let (registry, _) = registry(1);
        let before = drain(&registry, registry.rank_types());
        let moved = before[1];
        let after = drain(&registry, registry.rank_move_type(moved, 0));
        assert_eq!(after[0], moved);
        assert_eq!(after[1], before[0]);
        assert_eq!(&after[2..], &before[2..]);

        let last = drain(&registry, registry.rank_move_type(moved, 1_000));
        assert_eq!(*last.last().unwrap(), moved);
        assert_eq!(last.len(), before.len());

        let trimmed = drain(&registry, registry.rank_del_type(last[0]));
        assert_eq!(trimmed, last[1..].to_vec());
        assert_eq!(
            drain(&registry, registry.rank_del_type(ActionType::Null)),
            trimmed
        );
    }
}
