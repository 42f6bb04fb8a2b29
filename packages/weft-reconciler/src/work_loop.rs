//! The cooperative, deadline-driven driver. Owns the arena, the root
//! registry, and the ring of roots with scheduled work; performs begin and
//! complete steps until a subtree finishes, commits it, and re-arms itself
//! through the host when the time budget runs out mid-walk.

use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use crate::arena::{Arena, UnitId};
use crate::begin_work::begin_work;
use crate::commit_work::CommitWork;
use crate::complete_work::CompleteWork;
use crate::error::ReconcileError;
use crate::host_config::{Deadline, HostConfig};
use crate::priority::{bubble_priority, PriorityLevel};
use crate::root::{RootId, RootRegistry};
use crate::work_unit::{clone_for_work, StateNode};

/// Minimum budget a single unit of work is assumed to need. Below this the
/// slice ends rather than risk overrunning the deadline mid-unit.
const TIME_HEURISTIC_FOR_UNIT_OF_WORK: Duration = Duration::from_millis(1);

pub struct WorkLoop {
    host: Rc<dyn HostConfig>,
    pub(crate) arena: Arena,
    pub(crate) roots: RootRegistry,
    complete: CompleteWork,
    commit: CommitWork,

    /// Where the next slice resumes; preserved across slices.
    next_unit_of_work: Option<UnitId>,

    /// Singly-linked ring of roots with outstanding scheduled work.
    next_scheduled_root: Option<RootId>,
    last_scheduled_root: Option<RootId>,
}

impl WorkLoop {
    pub fn new(host: Rc<dyn HostConfig>) -> Self {
        Self {
            complete: CompleteWork::new(host.clone()),
            commit: CommitWork::new(host.clone()),
            host,
            arena: Arena::new(),
            roots: RootRegistry::new(),
            next_unit_of_work: None,
            next_scheduled_root: None,
            last_scheduled_root: None,
        }
    }

    /// Register a root for processing. Resetting the resume pointer forces
    /// the next slice to search from the top of the ring, so work scheduled
    /// at a higher priority than the in-flight walk is not missed.
    pub fn schedule_low_pri_work(&mut self, root: RootId) {
        self.next_unit_of_work = None;

        if self.roots[root].is_scheduled {
            return;
        }
        self.roots[root].is_scheduled = true;
        self.roots[root].next_scheduled_root = None;
        match self.last_scheduled_root {
            Some(last) => {
                self.roots[last].next_scheduled_root = Some(root);
                self.last_scheduled_root = Some(root);
            }
            None => {
                self.next_scheduled_root = Some(root);
                self.last_scheduled_root = Some(root);
                self.host.schedule_low_pri_callback();
            }
        }
    }

    /// Run begin/complete steps while the budget lasts. On exhaustion the
    /// loop re-arms itself through the host and returns, leaving
    /// `next_unit_of_work` pointing exactly where the next slice resumes.
    pub fn perform_low_pri_work(&mut self, deadline: &dyn Deadline) -> Result<(), ReconcileError> {
        if self.next_unit_of_work.is_none() {
            self.next_unit_of_work = self.find_next_unit_of_work()?;
        }
        while let Some(unit) = self.next_unit_of_work {
            if deadline.time_remaining() > TIME_HEURISTIC_FOR_UNIT_OF_WORK {
                self.next_unit_of_work = self.perform_unit_of_work(unit)?;
                if self.next_unit_of_work.is_none() {
                    // There might be budget left for another root.
                    self.next_unit_of_work = self.find_next_unit_of_work()?;
                }
            } else {
                self.host.schedule_low_pri_callback();
                return Ok(());
            }
        }
        Ok(())
    }

    fn find_next_unit_of_work(&mut self) -> Result<Option<UnitId>, ReconcileError> {
        // Clear out roots with no more work on them from the front.
        while let Some(root) = self.next_scheduled_root {
            let current = self.roots[root].current;
            if self.arena[current].pending_work_priority != PriorityLevel::NoWork {
                break;
            }
            self.roots[root].is_scheduled = false;
            let next = self.roots[root].next_scheduled_root.take();
            if self.last_scheduled_root == Some(root) {
                self.next_scheduled_root = None;
                self.last_scheduled_root = None;
                return Ok(None);
            }
            self.next_scheduled_root = next;
        }
        let mut scheduled = self.next_scheduled_root;
        while let Some(root) = scheduled {
            let current = self.roots[root].current;
            let priority = self.arena[current].pending_work_priority;
            clone_for_work(&mut self.arena, current, priority);
            // Scan the bands in strictly descending priority order.
            for level in [
                PriorityLevel::High,
                PriorityLevel::Low,
                PriorityLevel::Offscreen,
            ] {
                if let Some(work) =
                    crate::pending_work::find_next_unit_at_priority(&mut self.arena, current, level)?
                {
                    return Ok(Some(work));
                }
            }
            // Nothing to do in this root, try the next one.
            scheduled = self.roots[root].next_scheduled_root;
        }
        Ok(None)
    }

    fn perform_unit_of_work(
        &mut self,
        work_in_progress: UnitId,
    ) -> Result<Option<UnitId>, ReconcileError> {
        if self.arena[work_in_progress].pending_props.is_none() {
            // Already resolved; nothing to begin.
            return self.complete_unit_of_work(work_in_progress);
        }
        let current = self.arena[work_in_progress].alternate;
        let next = begin_work(&mut self.arena, current, work_in_progress)?;
        match next {
            Some(next) => Ok(Some(next)),
            None => self.complete_unit_of_work(work_in_progress),
        }
    }

    fn complete_unit_of_work(
        &mut self,
        mut work_in_progress: UnitId,
    ) -> Result<Option<UnitId>, ReconcileError> {
        loop {
            let current = self.arena[work_in_progress].alternate;
            let next = self
                .complete
                .complete_work(&mut self.arena, current, work_in_progress)?;

            // This unit's own work is done; flag it so nothing redoes it.
            self.arena[work_in_progress].pending_props = None;
            if self.arena[work_in_progress].pending_work_priority == PriorityLevel::NoWork {
                self.arena[work_in_progress].has_work_in_progress = false;
            }

            let parent = self.arena[work_in_progress].parent;
            if let Some(parent) = parent {
                // Remaining priority bubbles up...
                let folded = bubble_priority(
                    self.arena[parent].pending_work_priority,
                    self.arena[work_in_progress].pending_work_priority,
                );
                self.arena[parent].pending_work_priority = folded;
                // ...and the effect list merges onto the parent's, in child
                // order. Relies on children completing in order.
                if self.arena[parent].first_effect.is_none() {
                    self.arena[parent].first_effect = self.arena[work_in_progress].first_effect;
                }
                if let Some(last) = self.arena[work_in_progress].last_effect {
                    if let Some(parent_last) = self.arena[parent].last_effect {
                        self.arena[parent_last].next_effect =
                            self.arena[work_in_progress].first_effect;
                    }
                    self.arena[parent].last_effect = Some(last);
                }
            }

            if let Some(next) = next {
                // Completing this unit spawned new work (a coroutine's
                // continuation chain); do that next.
                return Ok(Some(next));
            }
            if let Some(sibling) = self.arena[work_in_progress].sibling {
                return Ok(Some(sibling));
            }
            if let Some(parent) = parent {
                work_in_progress = parent;
                continue;
            }

            // At the root: this buffer becomes the current tree, and the
            // accumulated effects can be flushed against the host.
            let root = match self.arena[work_in_progress].state_node {
                Some(StateNode::Root(root)) => root,
                _ => return Err(ReconcileError::DetachedContainer),
            };
            self.roots[root].current = work_in_progress;
            debug!(
                remaining = ?self.arena[work_in_progress].pending_work_priority,
                "root subtree completed, committing"
            );
            self.commit_all_work(work_in_progress)?;
            return self.find_next_unit_of_work();
        }
    }

    fn commit_all_work(&mut self, finished_work: UnitId) -> Result<(), ReconcileError> {
        let mut effect = self.arena[finished_work].first_effect;
        while let Some(unit) = effect {
            self.commit.commit_work(&self.arena, &self.roots, unit)?;
            let next = self.arena[unit].next_effect;
            // Clean as we go so a reused buffer cannot chain stale effects.
            self.arena[unit].next_effect = None;
            effect = next;
        }
        Ok(())
    }
}
