//! Top-down phase: derive a unit's children from its staged input, shortcut
//! identical work, and route control units (coroutines, yields) into their
//! next stage.

use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::arena::{Arena, UnitId};
use crate::child_reconciler::reconcile_child_chain;
use crate::element::{ComponentDef, ElementType, Node, Props, Rendered};
use crate::error::ReconcileError;
use crate::pending_work::find_next_unit_at_priority;
use crate::priority::{bubble_priority, PriorityLevel};
use crate::work_tags::WorkTag;
use crate::work_unit::{PendingInput, UnitType};

pub fn begin_work(
    arena: &mut Arena,
    current: Option<UnitId>,
    work_in_progress: UnitId,
) -> Result<Option<UnitId>, ReconcileError> {
    // The flushed state of this unit lives in the alternate. Identical staged
    // input means the previous output can be copied across wholesale.
    if let Some(current) = current {
        let identical = PendingInput::same(
            arena[work_in_progress].pending_props.as_ref(),
            arena[current].memoized_props.as_ref(),
        );
        if identical {
            return bail_out_on_identical_input(arena, current, work_in_progress);
        }
    }

    let finished_already = {
        let unit = &arena[work_in_progress];
        !unit.has_work_in_progress
            && PendingInput::same(unit.pending_props.as_ref(), unit.memoized_props.as_ref())
            && unit.pending_work_priority == PriorityLevel::NoWork
    };
    if finished_already {
        // Second visit to an already-finished unit in a ping-pong update.
        arena[work_in_progress].pending_props = None;
        return Ok(None);
    }

    arena[work_in_progress].has_work_in_progress = true;

    match arena[work_in_progress].tag {
        WorkTag::IndeterminateComponent => {
            mount_indeterminate_component(arena, current, work_in_progress)?;
            Ok(arena[work_in_progress].child)
        }
        WorkTag::FunctionalComponent => {
            update_functional_component(arena, current, work_in_progress)?;
            Ok(arena[work_in_progress].child)
        }
        WorkTag::ClassComponent => {
            // Instance and lifecycle semantics are a collaborator concern;
            // nothing to derive here yet.
            trace!("class component visited, keeping existing children");
            Ok(arena[work_in_progress].child)
        }
        WorkTag::HostContainer => {
            let next_children = arena[work_in_progress]
                .pending_props
                .as_ref()
                .and_then(PendingInput::as_children)
                .cloned();
            reconcile_children(arena, current, work_in_progress, next_children);
            // A container never blocks; hand its child straight back to the
            // loop.
            arena[work_in_progress].pending_work_priority = PriorityLevel::NoWork;
            Ok(arena[work_in_progress].child)
        }
        WorkTag::HostComponent => Ok(update_host_component(arena, current, work_in_progress)),
        WorkTag::CoroutineHandlerPhase | WorkTag::CoroutineComponent => {
            if arena[work_in_progress].tag == WorkTag::CoroutineHandlerPhase {
                // A restart: reset to the first phase.
                arena[work_in_progress].tag = WorkTag::CoroutineComponent;
            }
            update_coroutine_component(arena, current, work_in_progress)?;
            // Coroutines resolve within a single pass; the loop walks the
            // child chain and re-enters this unit through completion.
            Ok(arena[work_in_progress].child)
        }
        WorkTag::YieldComponent => {
            // A placeholder only: its output was reified at reconcile time.
            // Run straight through to the next sibling.
            arena[work_in_progress].pending_work_priority = PriorityLevel::NoWork;
            if let Some(sibling) = arena[work_in_progress].sibling {
                let sibling_current = arena[sibling].alternate;
                return begin_work(arena, sibling_current, sibling);
            }
            Ok(None)
        }
    }
}

fn bail_out_on_identical_input(
    arena: &mut Arena,
    current: UnitId,
    work_in_progress: UnitId,
) -> Result<Option<UnitId>, ReconcileError> {
    arena[work_in_progress].memoized_props = arena[work_in_progress].pending_props.clone();
    arena[work_in_progress].output = arena[current].output.clone();
    let priority_level = arena[work_in_progress].pending_work_priority;
    arena[work_in_progress].pending_props = None;
    arena[work_in_progress].pending_work_priority = PriorityLevel::NoWork;
    arena[work_in_progress].state_node = arena[current].state_node.clone();

    if let Some(child) = arena[current].child {
        arena[work_in_progress].child = Some(child);
        reuse_children(arena, work_in_progress, child);
        if arena[work_in_progress]
            .pending_work_priority
            .eligible_at(priority_level)
        {
            // Some descendant still has work at this pass's level; jump
            // straight to it so it is not deferred to the next tick.
            return find_next_unit_at_priority(arena, current, priority_level);
        }
        Ok(None)
    } else {
        arena[work_in_progress].child = None;
        Ok(None)
    }
}

/// Re-link reused children to the new parent buffer and re-bubble whatever
/// priority is still outstanding below them.
fn reuse_children(arena: &mut Arena, parent: UnitId, first_child: UnitId) {
    let mut child = Some(first_child);
    while let Some(unit) = child {
        arena[unit].parent = Some(parent);
        let folded = bubble_priority(
            arena[parent].pending_work_priority,
            arena[unit].pending_work_priority,
        );
        arena[parent].pending_work_priority = folded;
        child = arena[unit].sibling;
    }
}

fn component_def(arena: &Arena, unit: UnitId) -> Result<Rc<ComponentDef>, ReconcileError> {
    match &arena[unit].unit_type {
        Some(UnitType::Element(ElementType::Component(def))) => Ok(def.clone()),
        _ => Err(ReconcileError::MissingComponent),
    }
}

fn staged_props(arena: &Arena, unit: UnitId) -> Rc<Props> {
    arena[unit]
        .pending_props
        .as_ref()
        .and_then(PendingInput::as_props)
        .cloned()
        .unwrap_or_default()
}

fn reconcile_children(
    arena: &mut Arena,
    current: Option<UnitId>,
    work_in_progress: UnitId,
    next_children: Option<Node>,
) {
    let priority = arena[work_in_progress].pending_work_priority;
    reconcile_children_at(arena, current, work_in_progress, next_children, priority);
}

fn reconcile_children_at(
    arena: &mut Arena,
    current: Option<UnitId>,
    work_in_progress: UnitId,
    next_children: Option<Node>,
    priority: PriorityLevel,
) {
    let current_first_child = current.and_then(|current| arena[current].child);
    let first = reconcile_child_chain(
        arena,
        work_in_progress,
        current_first_child,
        next_children.as_ref(),
        priority,
    );
    arena[work_in_progress].child = first;
}

fn mount_indeterminate_component(
    arena: &mut Arena,
    current: Option<UnitId>,
    work_in_progress: UnitId,
) -> Result<(), ReconcileError> {
    let def = component_def(arena, work_in_progress)?;
    let props = staged_props(arena, work_in_progress);
    let next_children = match def.invoke(&props) {
        Rendered::Instance(_) => {
            // A render-capable instance came back: this is a class component.
            // The instance itself is not a children description.
            debug!(component = %def.name(), "resolved to a class component");
            retag_with_alternate(arena, work_in_progress, WorkTag::ClassComponent);
            None
        }
        Rendered::Children(children) => {
            debug!(component = %def.name(), "resolved to a functional component");
            retag_with_alternate(arena, work_in_progress, WorkTag::FunctionalComponent);
            children
        }
    };
    reconcile_children(arena, current, work_in_progress, next_children);
    arena[work_in_progress].pending_work_priority = PriorityLevel::NoWork;
    Ok(())
}

fn retag_with_alternate(arena: &mut Arena, unit: UnitId, tag: WorkTag) {
    arena[unit].tag = tag;
    if let Some(alternate) = arena[unit].alternate {
        arena[alternate].tag = tag;
    }
}

fn update_functional_component(
    arena: &mut Arena,
    current: Option<UnitId>,
    work_in_progress: UnitId,
) -> Result<(), ReconcileError> {
    let def = component_def(arena, work_in_progress)?;
    let props = staged_props(arena, work_in_progress);
    debug!(component = %def.name(), "invoking functional component");
    let next_children = match def.invoke(&props) {
        Rendered::Children(children) => children,
        Rendered::Instance(_) => {
            warn!(component = %def.name(), "functional component produced an instance, ignoring");
            None
        }
    };
    reconcile_children(arena, current, work_in_progress, next_children);
    arena[work_in_progress].pending_work_priority = PriorityLevel::NoWork;
    Ok(())
}

fn update_host_component(
    arena: &mut Arena,
    current: Option<UnitId>,
    work_in_progress: UnitId,
) -> Option<UnitId> {
    let props = staged_props(arena, work_in_progress);
    let next_children = props.children.clone();
    let priority = arena[work_in_progress].pending_work_priority;
    if props.hidden && priority != PriorityLevel::Offscreen {
        // A hidden subtree reconciles at the lowest level and bails out of
        // this pass, unless this already is the offscreen pass.
        reconcile_children_at(
            arena,
            current,
            work_in_progress,
            next_children,
            PriorityLevel::Offscreen,
        );
        arena[work_in_progress].pending_work_priority = PriorityLevel::Offscreen;
        None
    } else {
        reconcile_children_at(arena, current, work_in_progress, next_children, priority);
        arena[work_in_progress].pending_work_priority = PriorityLevel::NoWork;
        arena[work_in_progress].child
    }
}

fn update_coroutine_component(
    arena: &mut Arena,
    current: Option<UnitId>,
    work_in_progress: UnitId,
) -> Result<(), ReconcileError> {
    let coroutine = arena[work_in_progress]
        .pending_props
        .as_ref()
        .and_then(PendingInput::as_coroutine)
        .cloned()
        .ok_or(ReconcileError::UnresolvedCoroutine)?;
    debug!(handler = %coroutine.handler.name(), "entering coroutine");
    let next_children = coroutine.children.clone();
    reconcile_children(arena, current, work_in_progress, next_children);
    arena[work_in_progress].pending_work_priority = PriorityLevel::NoWork;
    Ok(())
}
