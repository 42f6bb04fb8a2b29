//! Bottom-up phase: finalize a unit's output, create or prepare host instance
//! updates through the adapter, build the effect list, and resolve coroutines
//! into their continuation children.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::arena::{Arena, UnitId};
use crate::child_reconciler::reconcile_child_chain;
use crate::element::{ElementType, Props, ReifiedContinuation};
use crate::error::ReconcileError;
use crate::host_config::HostConfig;
use crate::work_tags::WorkTag;
use crate::work_unit::{
    child_output, collect_host_children, Output, PendingInput, StateNode, UnitType,
};

pub struct CompleteWork {
    host: Rc<dyn HostConfig>,
}

impl CompleteWork {
    pub fn new(host: Rc<dyn HostConfig>) -> Self {
        Self { host }
    }

    pub fn complete_work(
        &self,
        arena: &mut Arena,
        current: Option<UnitId>,
        work_in_progress: UnitId,
    ) -> Result<Option<UnitId>, ReconcileError> {
        match arena[work_in_progress].tag {
            WorkTag::FunctionalComponent | WorkTag::ClassComponent => {
                transfer_output(arena, work_in_progress);
                Ok(None)
            }
            WorkTag::HostContainer => {
                transfer_output(arena, work_in_progress);
                // A container cannot know whether any child updated, so it is
                // always refreshed -- and before every other effect in the
                // subtree, so the whole tree is current when those fire.
                mark_for_pre_effect(arena, work_in_progress);
                Ok(None)
            }
            WorkTag::HostComponent => {
                self.complete_host_component(arena, current, work_in_progress);
                Ok(None)
            }
            WorkTag::CoroutineComponent => {
                self.move_coroutine_to_handler_phase(arena, current, work_in_progress)
            }
            WorkTag::CoroutineHandlerPhase => {
                let chain = match arena[work_in_progress].state_node {
                    Some(StateNode::Chain(first)) => Some(first),
                    _ => None,
                };
                transfer_output_from(arena, chain, work_in_progress);
                // Back to a first-phase coroutine for the next pass.
                arena[work_in_progress].tag = WorkTag::CoroutineComponent;
                Ok(None)
            }
            WorkTag::YieldComponent => Ok(None),
            WorkTag::IndeterminateComponent => Err(ReconcileError::IndeterminateCompletion),
        }
    }

    fn complete_host_component(
        &self,
        arena: &mut Arena,
        current: Option<UnitId>,
        work_in_progress: UnitId,
    ) {
        let children_output = child_output(arena, arena[work_in_progress].child);
        let mut children = Vec::new();
        collect_host_children(arena, &children_output, &mut children);

        let staged = arena[work_in_progress]
            .pending_props
            .as_ref()
            .and_then(PendingInput::as_props)
            .cloned();
        // With nothing staged this pass, the latest memoized input stands:
        // the children payload alone then decides the update question.
        let new_props = staged
            .or_else(|| current.and_then(|current| memoized_props(arena, current)))
            .or_else(|| memoized_props(arena, work_in_progress))
            .unwrap_or_default();
        arena[work_in_progress].memoized_props = Some(PendingInput::Props(new_props.clone()));

        let existing_instance = match &arena[work_in_progress].state_node {
            Some(StateNode::Instance(instance)) => Some(instance.clone()),
            _ => None,
        };
        match (current, existing_instance) {
            (Some(current), Some(instance)) => {
                // An alternate exists, so this is an update: ask the adapter
                // whether the change is observable and schedule the effect.
                let old_props = memoized_props(arena, current).unwrap_or_default();
                if self
                    .host
                    .prepare_update(&instance, &old_props, &new_props, &children)
                {
                    mark_for_pre_effect(arena, work_in_progress);
                }
                arena[work_in_progress].output = Output::Instance(instance);
            }
            _ => {
                let type_name = host_type_name(arena, work_in_progress);
                trace!(host = %type_name, "creating host instance");
                let instance = self.host.create_instance(&type_name, &new_props, &children);
                arena[work_in_progress].state_node = Some(StateNode::Instance(instance.clone()));
                arena[work_in_progress].output = Output::Instance(instance);
            }
        }
    }

    fn move_coroutine_to_handler_phase(
        &self,
        arena: &mut Arena,
        current: Option<UnitId>,
        work_in_progress: UnitId,
    ) -> Result<Option<UnitId>, ReconcileError> {
        let coroutine = arena[work_in_progress]
            .pending_props
            .as_ref()
            .and_then(PendingInput::as_coroutine)
            .cloned()
            .ok_or(ReconcileError::UnresolvedCoroutine)?;

        // The first phase has finished; gather what the children yielded and
        // run the handler over it to produce the continuation children.
        arena[work_in_progress].tag = WorkTag::CoroutineHandlerPhase;

        let mut yields = Vec::new();
        let mut child = arena[work_in_progress].child;
        while let Some(unit) = child {
            fill_yields(arena, &mut yields, &arena[unit].output);
            child = arena[unit].sibling;
        }

        debug!(
            handler = %coroutine.handler.name(),
            yields = yields.len(),
            "resolving coroutine"
        );
        let next_children = coroutine.handler.invoke(&coroutine.props, &yields);

        // The previous second-phase chain is kept in the state node, keyed
        // against here like any other child list.
        let current_first_child = current.and_then(|current| match arena[current].state_node {
            Some(StateNode::Chain(first)) => Some(first),
            _ => None,
        });
        let priority = arena[work_in_progress].pending_work_priority;
        let first = reconcile_child_chain(
            arena,
            work_in_progress,
            current_first_child,
            next_children.as_ref(),
            priority,
        );
        arena[work_in_progress].state_node = first.map(StateNode::Chain);
        Ok(first)
    }
}

fn memoized_props(arena: &Arena, unit: UnitId) -> Option<Rc<Props>> {
    arena[unit]
        .memoized_props
        .as_ref()
        .and_then(PendingInput::as_props)
        .cloned()
}

fn host_type_name(arena: &Arena, unit: UnitId) -> Rc<str> {
    match &arena[unit].unit_type {
        Some(UnitType::Element(ElementType::Host(name))) => name.clone(),
        _ => Rc::from(""),
    }
}

fn transfer_output(arena: &mut Arena, work_in_progress: UnitId) {
    let child = arena[work_in_progress].child;
    transfer_output_from(arena, child, work_in_progress);
}

fn transfer_output_from(arena: &mut Arena, child: Option<UnitId>, work_in_progress: UnitId) {
    arena[work_in_progress].output = child_output(arena, child);
    arena[work_in_progress].memoized_props = arena[work_in_progress].pending_props.clone();
}

/// Schedule a side-effect on this unit BEFORE its children's side-effects.
fn mark_for_pre_effect(arena: &mut Arena, work_in_progress: UnitId) {
    if let Some(first) = arena[work_in_progress].first_effect {
        arena[work_in_progress].next_effect = Some(first);
        arena[work_in_progress].first_effect = Some(work_in_progress);
    } else {
        arena[work_in_progress].first_effect = Some(work_in_progress);
        arena[work_in_progress].last_effect = Some(work_in_progress);
    }
}

/// Flatten everything the first-phase children yielded, in child order.
/// Chains recurse; host instances are leaves with nothing to yield.
fn fill_yields(arena: &Arena, yields: &mut Vec<Rc<ReifiedContinuation>>, output: &Output) {
    match output {
        Output::None => {}
        Output::Continuation(continuation) => yields.push(continuation.clone()),
        Output::Chain(first) => {
            let mut item = Some(*first);
            while let Some(unit) = item {
                fill_yields(arena, yields, &arena[unit].output);
                item = arena[unit].sibling;
            }
        }
        Output::Instance(_) => {
            trace!("host instance output carries no yields");
        }
    }
}
