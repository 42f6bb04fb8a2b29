//! Root records: one per mounted container, holding the container handle,
//! the current buffer pointer, and the scheduling-ring link.

use std::any::Any;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::rc::Rc;

use crate::arena::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootId(u32);

pub struct RootRecord {
    /// Opaque handle to the real rendering target, passed back to the host
    /// adapter at container-update time.
    pub container_info: Rc<dyn Any>,
    /// The buffer reflecting the last committed state of this tree.
    pub current: UnitId,
    pub is_scheduled: bool,
    pub next_scheduled_root: Option<RootId>,
}

impl fmt::Debug for RootRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootRecord")
            .field("current", &self.current)
            .field("is_scheduled", &self.is_scheduled)
            .field("next_scheduled_root", &self.next_scheduled_root)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct RootRegistry {
    roots: Vec<RootRecord>,
}

impl RootRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, container_info: Rc<dyn Any>, current: UnitId) -> RootId {
        let id = RootId(self.roots.len() as u32);
        self.roots.push(RootRecord {
            container_info,
            current,
            is_scheduled: false,
            next_scheduled_root: None,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl Index<RootId> for RootRegistry {
    type Output = RootRecord;

    fn index(&self, id: RootId) -> &RootRecord {
        &self.roots[id.0 as usize]
    }
}

impl IndexMut<RootId> for RootRegistry {
    fn index_mut(&mut self, id: RootId) -> &mut RootRecord {
        &mut self.roots[id.0 as usize]
    }
}
