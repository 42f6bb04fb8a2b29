//! An incremental, priority-scheduled tree reconciler. Given successive
//! description trees, it computes the minimal set of host changes between
//! them and applies those changes through an injected host adapter -- in
//! small units of work that a cooperative, deadline-driven loop can
//! interleave and preempt without ever leaving the host tree partially
//! updated.

use std::any::Any;
use std::rc::Rc;

use tracing::debug;

pub mod arena;
mod begin_work;
mod child_reconciler;
mod commit_work;
mod complete_work;
pub mod element;
pub mod error;
pub mod host_config;
mod pending_work;
pub mod priority;
pub mod root;
mod work_loop;
pub mod work_tags;
mod work_unit;

pub use error::ReconcileError;
pub use host_config::{Deadline, HostConfig};
pub use priority::PriorityLevel;
pub use root::RootId;

use element::Node;
use work_loop::WorkLoop;
use work_unit::{create_host_container_unit, PendingInput, StateNode};

/// Public entry points around the work loop: mount, update and unmount
/// containers, and drive one cooperative time slice.
pub struct Reconciler {
    work_loop: WorkLoop,
}

impl Reconciler {
    pub fn new(host: Rc<dyn HostConfig>) -> Self {
        Self {
            work_loop: WorkLoop::new(host),
        }
    }

    /// Register `element` as the initial description for a new container and
    /// schedule it at low priority.
    pub fn mount_container(&mut self, element: Node, container_info: Rc<dyn Any>) -> RootId {
        let container = create_host_container_unit(&mut self.work_loop.arena);
        let root = self.work_loop.roots.register(container_info, container);
        let arena = &mut self.work_loop.arena;
        arena[container].state_node = Some(StateNode::Root(root));
        arena[container].pending_props = Some(PendingInput::Children(element));
        arena[container].pending_work_priority = PriorityLevel::Low;
        debug!(?root, "mounting container");
        self.work_loop.schedule_low_pri_work(root);
        root
    }

    /// Replace the pending description on a mounted container and schedule it
    /// at low priority.
    pub fn update_container(&mut self, element: Node, root: RootId) {
        let current = self.work_loop.roots[root].current;
        let arena = &mut self.work_loop.arena;
        arena[current].pending_props = Some(PendingInput::Children(element));
        arena[current].pending_work_priority = PriorityLevel::Low;
        debug!(?root, "updating container");
        self.work_loop.schedule_low_pri_work(root);
    }

    /// Schedule an empty description, reconciling every child away.
    pub fn unmount_container(&mut self, root: RootId) {
        self.update_container(Node::Seq(Rc::from(Vec::<Node>::new())), root);
    }

    /// Run begin/complete steps until the deadline's budget is exhausted or
    /// no scheduled work remains. Preserves its position across calls, and
    /// re-arms itself through the host adapter when preempted.
    pub fn perform_low_pri_work(&mut self, deadline: &dyn Deadline) -> Result<(), ReconcileError> {
        self.work_loop.perform_low_pri_work(deadline)
    }

    /// Whether this root's committed tree still reports outstanding work.
    pub fn has_pending_work(&self, root: RootId) -> bool {
        let current = self.work_loop.roots[root].current;
        self.work_loop.arena[current].pending_work_priority != PriorityLevel::NoWork
    }
}
