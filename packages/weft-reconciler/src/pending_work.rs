//! Finds the next schedulable unit at or below a priority threshold, walking
//! the current tree, cloning work-in-progress buffers on demand and resetting
//! stale priority flags as it goes.

use crate::arena::{Arena, UnitId};
use crate::error::ReconcileError;
use crate::priority::PriorityLevel;
use crate::work_unit::clone_for_work;

/// Walk down from `current_root` looking for a unit whose outstanding
/// priority is eligible at `threshold`. A node with staged input yields its
/// work-in-progress buffer directly; a node whose work lives below it gets a
/// cloned child chain to descend into; a node with neither has a stale flag,
/// which is reset.
pub fn find_next_unit_at_priority(
    arena: &mut Arena,
    current_root: UnitId,
    threshold: PriorityLevel,
) -> Result<Option<UnitId>, ReconcileError> {
    let mut current = current_root;
    loop {
        if arena[current].pending_work_priority.eligible_at(threshold) {
            if arena[current].pending_props.is_some() {
                // Found staged work; hand back the work-in-progress buffer.
                let work_in_progress = arena[current]
                    .alternate
                    .ok_or(ReconcileError::MissingWorkInProgress)?;
                arena[work_in_progress].pending_props = arena[current].pending_props.clone();
                return Ok(Some(work_in_progress));
            }
            if let Some(current_child) = arena[current].child {
                // The work is somewhere below. Make sure a work-in-progress
                // chain exists to backtrack through, then descend.
                let work_in_progress = arena[current]
                    .alternate
                    .ok_or(ReconcileError::MissingWorkInProgress)?;
                let priority = arena[current].pending_work_priority;
                arena[work_in_progress].pending_work_priority = priority;
                let child_clone = clone_for_work(arena, current_child, PriorityLevel::NoWork);
                arena[work_in_progress].child = Some(child_clone);
                arena[child_clone].parent = Some(work_in_progress);
                clone_siblings(arena, current_child, child_clone, work_in_progress);
                current = current_child;
                continue;
            }
            // Priority matched but there is neither staged input nor a child:
            // the flag is stale and can safely be reset.
            arena[current].pending_work_priority = PriorityLevel::NoWork;
        }
        if current == current_root {
            return Ok(None);
        }
        while arena[current].sibling.is_none() {
            let Some(parent) = arena[current].parent else {
                return Ok(None);
            };
            current = parent;
            if arena[current].pending_work_priority.eligible_at(threshold) {
                // Had this subtree still owed work we would have returned it
                // by now; the flag survived a cleanup and is safe to reset.
                arena[current].pending_work_priority = PriorityLevel::NoWork;
            }
        }
        let Some(sibling) = arena[current].sibling else {
            return Ok(None);
        };
        current = sibling;
    }
}

fn clone_siblings(arena: &mut Arena, mut current: UnitId, mut work_in_progress: UnitId, parent: UnitId) {
    while let Some(next) = arena[current].sibling {
        current = next;
        let priority = arena[current].pending_work_priority;
        let clone = clone_for_work(arena, current, priority);
        arena[work_in_progress].sibling = Some(clone);
        arena[clone].parent = Some(parent);
        work_in_progress = clone;
    }
    arena[work_in_progress].sibling = None;
}
