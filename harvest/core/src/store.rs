//! Bounded measurement store.
//!
//! Items live in a single byte arena fixed at initialization. Each payload is
//! serialized into a block carved first-fit from the arena's free extents;
//! freeing a block merges it with free neighbours. Bookkeeping (kind, flags,
//! timestamp, owner and list links) sits in a slab next to the arena so that
//! handles stay valid integers rather than pointers into the buffer.
//!
//! The store also owns the Action -> item link: an item records its owner and
//! the store keeps the reverse index, so freeing an item severs both
//! directions under one lock.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use harvest_spec::{Clock, DataFlags, DataKind, Measurement, TimeUtc, MAX_NUM_DATA_KINDS};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::handle::{ActionId, DataId};

/// Arena size used when no buffer is supplied.
pub const DATA_DEFAULT_ARENA_BYTES: usize = 16 * 1024;

/// Decoded snapshot of one stored item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataItem {
    /// Handle of the item.
    pub id: DataId,
    /// Measurement kind.
    pub kind: DataKind,
    /// Delivery flags.
    pub flags: DataFlags,
    /// When the item was stored.
    pub time_utc: TimeUtc,
    /// Arena bytes the item occupies.
    pub size: usize,
    /// Action that produced the item, if still linked.
    pub owner: Option<ActionId>,
    /// The payload.
    pub measurement: Measurement,
}

#[derive(Debug, Default)]
struct Arena {
    bytes: Vec<u8>,
    // offset -> length of each free extent
    free: BTreeMap<usize, usize>,
}

impl Arena {
    fn new(bytes: Vec<u8>) -> Self {
        let mut free = BTreeMap::new();
        if !bytes.is_empty() {
            free.insert(0, bytes.len());
        }
        Self { bytes, free }
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn carve(&mut self, len: usize) -> Option<usize> {
        let (&offset, &extent) = self.free.iter().find(|&(_, &extent)| extent >= len)?;
        self.free.remove(&offset);
        if extent > len {
            self.free.insert(offset + len, extent - len);
        }
        Some(offset)
    }

    fn release(&mut self, mut offset: usize, mut len: usize) {
        if let Some((&prev, &prev_len)) = self.free.range(..offset).next_back() {
            if prev + prev_len == offset {
                self.free.remove(&prev);
                offset = prev;
                len += prev_len;
            }
        }
        if let Some(next_len) = self.free.remove(&(offset + len)) {
            len += next_len;
        }
        self.free.insert(offset, len);
    }

    fn block(&self, offset: usize, len: usize) -> &[u8] {
        &self.bytes[offset..offset + len]
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Links {
    prev: Option<u32>,
    next: Option<u32>,
}

#[derive(Debug)]
struct Entry {
    kind: DataKind,
    flags: DataFlags,
    time_utc: TimeUtc,
    offset: usize,
    len: usize,
    owner: Option<ActionId>,
    live: Links,
    chain: Links,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Debug, Default)]
enum Traversal {
    #[default]
    Idle,
    Raw {
        cursor: Option<u32>,
    },
    Sorted {
        order: Vec<DataId>,
        pos: usize,
    },
}

#[derive(Debug)]
struct StoreState {
    arena: Arena,
    used: usize,
    slots: Vec<Slot>,
    vacant: Vec<u32>,
    head: Option<u32>,
    kind_heads: [Option<u32>; MAX_NUM_DATA_KINDS],
    owners: HashMap<ActionId, DataId>,
    live: usize,
    traversal: Traversal,
}

impl StoreState {
    fn new(arena: Arena) -> Self {
        Self {
            arena,
            used: 0,
            slots: Vec::new(),
            vacant: Vec::new(),
            head: None,
            kind_heads: [None; MAX_NUM_DATA_KINDS],
            owners: HashMap::new(),
            live: 0,
            traversal: Traversal::Idle,
        }
    }

    fn entry(&self, id: DataId) -> Option<&Entry> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_at(&self, index: u32) -> Option<(DataId, &Entry)> {
        let slot = self.slots.get(index as usize)?;
        let entry = slot.entry.as_ref()?;
        Some((
            DataId {
                index,
                generation: slot.generation,
            },
            entry,
        ))
    }

    fn entry_mut(&mut self, index: u32) -> Option<&mut Entry> {
        self.slots
            .get_mut(index as usize)
            .and_then(|slot| slot.entry.as_mut())
    }

    fn item(&self, id: DataId) -> Result<DataItem, StoreError> {
        let entry = self.entry(id).ok_or(StoreError::StaleHandle(id))?;
        let measurement: Measurement =
            bincode::deserialize(self.arena.block(entry.offset, entry.len))?;
        Ok(DataItem {
            id,
            kind: entry.kind,
            flags: entry.flags,
            time_utc: entry.time_utc,
            size: entry.len,
            owner: entry.owner,
            measurement,
        })
    }

    fn push_front(&mut self, index: u32, kind: DataKind) {
        let head = self.head;
        let kind_head = self.kind_heads[kind.index()];
        if let Some(entry) = self.entry_mut(index) {
            entry.live = Links {
                prev: None,
                next: head,
            };
            entry.chain = Links {
                prev: None,
                next: kind_head,
            };
        }
        if let Some(next) = head.and_then(|h| self.entry_mut(h)) {
            next.live.prev = Some(index);
        }
        if let Some(next) = kind_head.and_then(|h| self.entry_mut(h)) {
            next.chain.prev = Some(index);
        }
        self.head = Some(index);
        self.kind_heads[kind.index()] = Some(index);
    }

    // `entry` has already been taken out of its slot.
    fn unlink(&mut self, entry: &Entry) {
        match entry.live.prev {
            Some(prev) => {
                if let Some(prev) = self.entry_mut(prev) {
                    prev.live.next = entry.live.next;
                }
            }
            None => self.head = entry.live.next,
        }
        if let Some(next) = entry.live.next.and_then(|n| self.entry_mut(n)) {
            next.live.prev = entry.live.prev;
        }
        match entry.chain.prev {
            Some(prev) => {
                if let Some(prev) = self.entry_mut(prev) {
                    prev.chain.next = entry.chain.next;
                }
            }
            None => self.kind_heads[entry.kind.index()] = entry.chain.next,
        }
        if let Some(next) = entry.chain.next.and_then(|n| self.entry_mut(n)) {
            next.chain.prev = entry.chain.prev;
        }
    }

    fn remove(&mut self, id: DataId) -> Option<Entry> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        if let Traversal::Raw { cursor } = &mut self.traversal {
            if *cursor == Some(id.index) {
                *cursor = entry.live.next;
            }
        }
        self.unlink(&entry);
        self.arena.release(entry.offset, entry.len);
        self.used -= entry.len;
        self.live -= 1;
        if let Some(owner) = entry.owner {
            if self.owners.get(&owner) == Some(&id) {
                self.owners.remove(&owner);
            }
        }
        self.vacant.push(id.index);
        Some(entry)
    }

    fn live_keys(&self) -> Vec<(DataFlags, TimeUtc, DataId)> {
        let mut keys = Vec::with_capacity(self.live);
        let mut cursor = self.head;
        while let Some((id, entry)) = cursor.and_then(|index| self.entry_at(index)) {
            keys.push((entry.flags, entry.time_utc, id));
            cursor = entry.live.next;
        }
        keys
    }

    fn prioritised(&self) -> Vec<DataId> {
        let mut keys = self.live_keys();
        keys.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        keys.into_iter().map(|(_, _, id)| id).collect()
    }

    fn step(&mut self) -> Option<DataId> {
        match &mut self.traversal {
            Traversal::Idle => None,
            Traversal::Raw { cursor } => {
                let index = (*cursor)?;
                let slot = self.slots.get(index as usize)?;
                let entry = slot.entry.as_ref()?;
                *cursor = entry.live.next;
                Some(DataId {
                    index,
                    generation: slot.generation,
                })
            }
            Traversal::Sorted { order, pos } => {
                let id = *order.get(*pos)?;
                *pos += 1;
                Some(id)
            }
        }
    }

    fn advance(&mut self) -> Option<DataItem> {
        while let Some(id) = self.step() {
            match self.item(id) {
                Ok(item) => return Some(item),
                Err(StoreError::StaleHandle(_)) => continue,
                Err(err) => warn!(%id, error = %err, "skipping undecodable item"),
            }
        }
        None
    }

    fn chain_ids(&self, kind: DataKind) -> Vec<DataId> {
        let mut ids = Vec::new();
        let mut cursor = self.kind_heads[kind.index()];
        while let Some((id, entry)) = cursor.and_then(|index| self.entry_at(index)) {
            ids.push(id);
            cursor = entry.chain.next;
        }
        ids
    }
}

/// The measurement store.
pub struct DataStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DataStore")
            .field("items", &state.live)
            .field("used_bytes", &state.used)
            .field("capacity", &state.arena.capacity())
            .finish()
    }
}

impl DataStore {
    /// Store backed by an internal arena of [`DATA_DEFAULT_ARENA_BYTES`].
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_buffer(vec![0; DATA_DEFAULT_ARENA_BYTES], clock)
    }

    /// Store backed by a caller-supplied arena; its length is the capacity.
    pub fn with_buffer(buffer: Vec<u8>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::new(Arena::new(buffer))),
            clock,
        }
    }

    /// Discard every item and install `buffer`, or a default arena when `None`.
    ///
    /// Handles issued before the call no longer resolve.
    pub fn init(&self, buffer: Option<Vec<u8>>) {
        let buffer = buffer.unwrap_or_else(|| vec![0; DATA_DEFAULT_ARENA_BYTES]);
        let mut state = self.state.lock();
        let mut slots = std::mem::take(&mut state.slots);
        for slot in &mut slots {
            if slot.entry.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        let vacant = (0..slots.len() as u32).rev().collect();
        *state = StoreState::new(Arena::new(buffer));
        state.slots = slots;
        state.vacant = vacant;
        debug!(capacity = state.arena.capacity(), "data store initialised");
    }

    /// Store `measurement`, timestamped now, linked to `owner`.
    ///
    /// `Ok(None)` when the arena has no room; nothing is stored in that case.
    pub fn allocate(
        &self,
        owner: Option<ActionId>,
        flags: DataFlags,
        measurement: &Measurement,
    ) -> Result<Option<DataId>, StoreError> {
        self.allocate_at(owner, flags, measurement, self.clock.now_utc())
    }

    /// As [`allocate`](Self::allocate) with an explicit timestamp.
    pub fn allocate_at(
        &self,
        owner: Option<ActionId>,
        flags: DataFlags,
        measurement: &Measurement,
        time_utc: TimeUtc,
    ) -> Result<Option<DataId>, StoreError> {
        let kind = measurement.kind();
        if !measurement.within_limits() {
            return Err(StoreError::PayloadTooLarge(kind));
        }
        let payload = bincode::serialize(measurement)?;
        let len = payload.len();

        let mut state = self.state.lock();
        let Some(offset) = state.arena.carve(len) else {
            warn!(
                %kind,
                bytes = len,
                free = state.arena.capacity() - state.used,
                "data arena exhausted"
            );
            return Ok(None);
        };
        state.arena.bytes[offset..offset + len].copy_from_slice(&payload);
        state.used += len;

        let index = match state.vacant.pop() {
            Some(index) => index,
            None => {
                state.slots.push(Slot::default());
                (state.slots.len() - 1) as u32
            }
        };
        let slot = &mut state.slots[index as usize];
        slot.entry = Some(Entry {
            kind,
            flags,
            time_utc,
            offset,
            len,
            owner,
            live: Links::default(),
            chain: Links::default(),
        });
        let id = DataId {
            index,
            generation: slot.generation,
        };
        state.push_front(index, kind);
        state.live += 1;

        if let Some(owner) = owner {
            if let Some(previous) = state.owners.insert(owner, id) {
                if let Some(entry) = state.entry_mut(previous.index) {
                    entry.owner = None;
                }
                debug!(%owner, %previous, "older item detached from action");
            }
        }
        debug!(%id, %kind, bytes = len, ?owner, "data allocated");
        Ok(Some(id))
    }

    /// Free the item in `slot`, leaving `None` behind.
    ///
    /// Returns false when the slot was empty or the handle stale.
    pub fn free(&self, slot: &mut Option<DataId>) -> bool {
        let Some(id) = slot.take() else {
            return false;
        };
        let freed = self.state.lock().remove(id);
        match freed {
            Some(entry) => {
                debug!(%id, kind = %entry.kind, bytes = entry.len, "data freed");
                true
            }
            None => false,
        }
    }

    /// Item currently linked to `owner`.
    pub fn data_of(&self, owner: ActionId) -> Option<DataId> {
        self.state.lock().owners.get(&owner).copied()
    }

    /// Sever the link from `owner` without freeing the item.
    pub fn detach(&self, owner: ActionId) -> Option<DataId> {
        let mut state = self.state.lock();
        let id = state.owners.remove(&owner)?;
        if let Some(entry) = state.entry_mut(id.index) {
            entry.owner = None;
        }
        Some(id)
    }

    /// Snapshot of one item, `None` if it has been freed.
    pub fn get(&self, id: DataId) -> Option<DataItem> {
        match self.state.lock().item(id) {
            Ok(item) => Some(item),
            Err(StoreError::StaleHandle(_)) => None,
            Err(err) => {
                warn!(%id, error = %err, "undecodable stored payload");
                None
            }
        }
    }

    /// Number of live items.
    pub fn count(&self) -> usize {
        self.state.lock().live
    }

    /// Arena bytes in use.
    pub fn used_bytes(&self) -> usize {
        self.state.lock().used
    }

    /// Arena size.
    pub fn capacity(&self) -> usize {
        self.state.lock().arena.capacity()
    }

    /// Arena bytes not in use; may be fragmented.
    pub fn free_bytes(&self) -> usize {
        let state = self.state.lock();
        state.arena.capacity() - state.used
    }

    /// Order live items by flags, then timestamp, both descending, and start
    /// a traversal over that order. Returns its first item.
    pub fn sort(&self) -> Option<DataItem> {
        let mut state = self.state.lock();
        let order = state.prioritised();
        state.traversal = Traversal::Sorted { order, pos: 0 };
        state.advance()
    }

    /// Restart traversal in raw order, newest item first.
    pub fn first(&self) -> Option<DataItem> {
        let mut state = self.state.lock();
        state.traversal = Traversal::Raw { cursor: state.head };
        state.advance()
    }

    /// Continue the current traversal. Without a prior `sort()` or `first()`
    /// this starts a raw one.
    pub fn next(&self) -> Option<DataItem> {
        let mut state = self.state.lock();
        if let Traversal::Idle = state.traversal {
            state.traversal = Traversal::Raw { cursor: state.head };
        }
        state.advance()
    }

    /// Handles of live items in the same order `sort()` produces.
    pub fn prioritised(&self) -> Vec<DataId> {
        self.state.lock().prioritised()
    }

    /// `b - a` over the representative field of two items of one kind.
    pub fn difference(&self, a: DataId, b: DataId) -> Result<i64, StoreError> {
        let state = self.state.lock();
        let a = state.item(a)?;
        let b = state.item(b)?;
        if a.kind != b.kind {
            return Err(StoreError::KindMismatch {
                a: a.kind,
                b: b.kind,
            });
        }
        Ok(b.measurement
            .representative()
            .saturating_sub(a.measurement.representative()))
    }

    /// Items of one kind, newest first.
    pub fn iter_kind(&self, kind: DataKind) -> Vec<DataItem> {
        let state = self.state.lock();
        state
            .chain_ids(kind)
            .into_iter()
            .filter_map(|id| state.item(id).ok())
            .collect()
    }

    /// Number of live items of one kind.
    pub fn kind_count(&self, kind: DataKind) -> usize {
        self.state.lock().chain_ids(kind).len()
    }
}
