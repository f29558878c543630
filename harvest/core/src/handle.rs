//! Generational handles into the action pool and the item slab.
//!
//! A slot keeps its index for life but bumps its generation each time it is
//! recycled, so a handle taken before the recycle no longer resolves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to one action in the registry's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl ActionId {
    /// Pool slot index.
    pub fn slot(self) -> usize {
        self.slot as usize
    }

    /// Generation of the slot when the handle was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}.{}", self.slot, self.generation)
    }
}

/// Handle to one stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl DataId {
    /// Slab index.
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Generation of the slab entry when the handle was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}.{}", self.index, self.generation)
    }
}
